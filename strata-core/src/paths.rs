//! Centralized path configuration for Strata.
//!
//! All data paths go through this module so the CLI and library agree
//! on where configuration and synthesized artifacts live.

use std::path::PathBuf;

/// Get the Strata data directory.
///
/// Resolution order:
/// 1. `STRATA_HOME` environment variable
/// 2. `~/.strata`
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STRATA_HOME") {
        return PathBuf::from(dir);
    }

    dirs::home_dir().map(|h| h.join(".strata")).unwrap_or_else(|| PathBuf::from(".strata"))
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Get the default output directory for synthesized templates.
pub fn default_out_dir() -> PathBuf {
    PathBuf::from("strata.out")
}
