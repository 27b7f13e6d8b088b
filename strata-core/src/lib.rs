//! Core library for strata: declarative container infrastructure.
//!
//! A YAML manifest describes compute stacks (cluster, capacity
//! providers, load balancer, discovery namespace) and the service
//! stacks that run on them. The library parses and validates the
//! manifest, composes it into resource declarations against a chosen
//! deployment target, and synthesizes deterministic provisioning
//! templates.

pub mod compose;
pub mod config;
pub mod error;
pub mod manifest;
pub mod paths;
pub mod template;
pub mod types;

pub use compose::{build_app, resolve_target};
pub use config::{Config, TargetConfig};
pub use error::{Result, StrataError};
pub use manifest::{Manifest, ManifestParser};
pub use template::{App, Environment, Stack};
