//! Template synthesis layer.
//!
//! A `Stack` is a registry of logical-id → resource declarations; an `App`
//! owns the deployment environment and the built stacks and serializes
//! them to provider-format JSON templates. This layer only records and
//! emits declarations; deployment belongs to the external provisioning
//! tool.

pub mod app;
pub mod stack;
pub mod value;

pub use app::{App, Environment};
pub use stack::{Output, Resource, ResourceHandle, Stack, Template};
pub use value::{get_att, import_value, reference};
