//! CLI command implementations

pub mod resources;
pub mod synth;
pub mod targets;
pub mod validate;

pub use resources::resources;
pub use synth::synth;
pub use targets::targets;
pub use validate::validate;
