//! Configuration management.
//!
//! Deployment targets carry everything that is environment-specific:
//! account, region, network identifiers, key pairs, certificates. Nothing
//! in a stack manifest or composer should hard-code these values.

use crate::error::{Result, StrataError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deployment target: one account/region pair plus the identifiers of
/// pre-existing infrastructure the stacks attach to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Account identifier
    pub account: String,

    /// Region name
    pub region: String,

    /// Existing VPC to deploy into
    pub vpc_id: String,

    /// Public subnet ids for load balancers and instances
    #[serde(default)]
    pub subnet_ids: Vec<String>,

    /// SSH key pair name for instances
    #[serde(default)]
    pub ssh_key_name: Option<String>,

    /// Certificate reference for HTTPS listeners
    #[serde(default)]
    pub certificate_arn: Option<String>,
}

/// Persistent configuration for Strata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target selected when `--target` is not given
    pub default_target: Option<String>,

    /// Named deployment targets
    pub targets: BTreeMap<String, TargetConfig>,
}

impl Config {
    /// Load configuration from disk. Missing file yields the default.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| StrataError::InvalidConfig {
            reason: format!("Failed to read config: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| StrataError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = paths::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StrataError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| StrataError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(&path, content).map_err(|e| StrataError::IoError { path, source: e })
    }

    /// Resolve a deployment target by name.
    ///
    /// Falls back to `default_target`, then to the sole configured target
    /// when exactly one exists.
    pub fn target(&self, name: Option<&str>) -> Result<(String, &TargetConfig)> {
        let name = match name {
            Some(n) => n.to_string(),
            None => match &self.default_target {
                Some(n) => n.clone(),
                None if self.targets.len() == 1 => {
                    // Sole target is unambiguous
                    self.targets.keys().next().cloned().unwrap_or_default()
                }
                None => return Err(StrataError::NoTarget),
            },
        };

        match self.targets.get(&name) {
            Some(target) => Ok((name, target)),
            None => Err(StrataError::UnknownTarget { target: name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(region: &str) -> TargetConfig {
        TargetConfig {
            account: "111111111111".to_string(),
            region: region.to_string(),
            vpc_id: "vpc-0123".to_string(),
            subnet_ids: vec!["subnet-a".to_string()],
            ssh_key_name: None,
            certificate_arn: None,
        }
    }

    #[test]
    fn test_target_by_name() {
        let mut config = Config::default();
        config.targets.insert("dev".to_string(), target("us-east-1"));
        config.targets.insert("prod".to_string(), target("eu-west-1"));

        let (name, t) = config.target(Some("prod")).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(t.region, "eu-west-1");
    }

    #[test]
    fn test_sole_target_is_implicit_default() {
        let mut config = Config::default();
        config.targets.insert("dev".to_string(), target("us-east-1"));

        let (name, _) = config.target(None).unwrap();
        assert_eq!(name, "dev");
    }

    #[test]
    fn test_target_name_outlives_lookup_argument() {
        let mut config = Config::default();
        config.targets.insert("dev".to_string(), target("us-east-1"));

        let (name, t) = {
            let requested = String::from("dev");
            config.target(Some(&requested)).unwrap()
        };
        assert_eq!(name, "dev");
        assert_eq!(t.region, "us-east-1");
    }

    #[test]
    fn test_unknown_target() {
        let config = Config::default();
        assert!(matches!(
            config.target(Some("staging")),
            Err(StrataError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_no_target_selected() {
        let mut config = Config::default();
        config.targets.insert("dev".to_string(), target("us-east-1"));
        config.targets.insert("prod".to_string(), target("eu-west-1"));

        assert!(matches!(config.target(None), Err(StrataError::NoTarget)));
    }
}
