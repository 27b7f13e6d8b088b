//! Stack manifest parser.
//!
//! Parses manifest YAML and validates it before any resource is declared.
//! A manifest that omits a required section is an error here, never a
//! silently incomplete resource graph later.

use super::types::{Manifest, ServiceStack, StackManifest};
use crate::error::{Result, StrataError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Parser for stack manifest files.
pub struct ManifestParser;

impl ManifestParser {
    /// Parse a stack manifest from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The YAML is invalid
    /// - The manifest version is unsupported
    /// - A stack omits a required section
    /// - A reference (compute stack, container, capacity provider) does
    ///   not resolve within the manifest
    #[instrument(skip(content))]
    pub fn parse(content: &str) -> Result<Manifest> {
        info!("Parsing stack manifest");

        let manifest: Manifest = serde_yaml::from_str(content)
            .map_err(|e| StrataError::ManifestParseError { reason: e.to_string() })?;

        Self::validate_version(&manifest.version)?;
        Self::validate(&manifest)?;

        Ok(manifest)
    }

    /// Parse a stack manifest from a file path.
    #[instrument]
    pub fn parse_file<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Manifest> {
        let path = path.as_ref();
        info!("Reading manifest from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| StrataError::FileReadError {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Validate that the manifest version is supported.
    fn validate_version(version: &str) -> Result<()> {
        if version.is_empty() || version.starts_with('1') {
            Ok(())
        } else {
            Err(StrataError::UnsupportedManifestVersion { version: version.to_string() })
        }
    }

    /// Validate stack sections and cross-stack references.
    fn validate(manifest: &Manifest) -> Result<()> {
        if manifest.stacks.is_empty() {
            return Err(StrataError::ManifestParseError { reason: "No stacks defined".to_string() });
        }

        for (name, spec) in manifest.compute_stacks() {
            Self::validate_compute(name, spec)?;

            if spec.cluster.as_ref().is_some_and(|c| c.asg_capacity_providers)
                && spec.capacity_providers.is_empty()
                && !spec.cluster.as_ref().is_some_and(|c| c.fargate_capacity_providers)
            {
                warn!(stack = %name, "Cluster enables capacity providers but declares none");
            }

            if spec.cluster.as_ref().is_some_and(|c| !c.asg_capacity_providers)
                && !spec.capacity_providers.is_empty()
            {
                warn!(
                    stack = %name,
                    "Capacity providers are declared but the cluster disables them; \
                     they will not be synthesized"
                );
            }

            let mut provider_names = HashSet::new();
            for entry in &spec.capacity_providers {
                if !provider_names.insert(entry.capacity_provider.name.as_str()) {
                    return Err(StrataError::ManifestParseError {
                        reason: format!(
                            "Stack '{}' declares capacity provider '{}' twice",
                            name, entry.capacity_provider.name
                        ),
                    });
                }
            }
        }

        for (name, spec) in manifest.service_stacks() {
            Self::validate_service(manifest, name, spec)?;
        }

        Ok(())
    }

    fn validate_compute(name: &str, spec: &super::types::ComputeStack) -> Result<()> {
        let missing = |section: &str| StrataError::MissingSection {
            stack: name.to_string(),
            section: section.to_string(),
        };

        if spec.cluster.is_none() {
            return Err(missing("cluster"));
        }
        if spec.security_groups.is_none() {
            return Err(missing("security_groups"));
        }
        if spec.load_balancer.is_none() {
            return Err(missing("load_balancer"));
        }

        Ok(())
    }

    fn validate_service(manifest: &Manifest, name: &str, spec: &ServiceStack) -> Result<()> {
        let compute = match manifest.stacks.get(&spec.compute) {
            Some(StackManifest::Compute(compute)) => compute,
            _ => {
                return Err(StrataError::UnknownComputeStack {
                    stack: name.to_string(),
                    compute: spec.compute.clone(),
                })
            }
        };

        if spec.containers.is_empty() {
            return Err(StrataError::MissingSection {
                stack: name.to_string(),
                section: "containers".to_string(),
            });
        }

        if let Some(ingress) = &spec.ingress {
            let container = spec
                .containers
                .iter()
                .find(|c| c.name == ingress.container)
                .ok_or_else(|| StrataError::UnknownContainer {
                    service: name.to_string(),
                    container: ingress.container.clone(),
                })?;

            if !container.port_mappings.iter().any(|p| p.container_port == ingress.container_port) {
                warn!(
                    service = %name,
                    port = ingress.container_port,
                    "Ingress port is not among the container's port mappings"
                );
            }

            if ingress.rule.priority == 0 {
                return Err(StrataError::ManifestParseError {
                    reason: format!("Service '{}' listener rule priority must be positive", name),
                });
            }
        }

        if let Some(provider) = &spec.service.capacity_provider {
            let declared = compute
                .capacity_providers
                .iter()
                .any(|entry| &entry.capacity_provider.name == provider);
            if !declared {
                return Err(StrataError::UnknownCapacityProvider {
                    service: name.to_string(),
                    provider: provider.clone(),
                });
            }
        }

        if spec.service.discovery.is_some() && compute.namespace.is_none() {
            return Err(StrataError::MissingNamespace { service: name.to_string() });
        }

        Ok(())
    }
}
