//! Stack manifest format: parsing and validation.

pub mod parser;
pub mod types;

pub use parser::ManifestParser;
pub use types::{ComputeStack, Manifest, ServiceStack, StackManifest};
