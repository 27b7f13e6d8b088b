//! Container service domain types: task definitions, containers, services.

use crate::types::balancer::{ListenerRuleSpec, TargetGroupSpec};
use crate::types::network::Protocol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task definition descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task family name
    pub family: String,

    /// Task network mode
    #[serde(default)]
    pub network_mode: NetworkMode,

    /// Launch compatibility
    #[serde(default)]
    pub compatibility: Compatibility,

    /// Task-level CPU units (required for serverless launches)
    #[serde(default)]
    pub cpu: Option<u32>,

    /// Task-level memory in MiB (required for serverless launches)
    #[serde(default)]
    pub memory_mib: Option<u32>,
}

/// Task network mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    Bridge,
    #[default]
    AwsVpc,
    Host,
}

impl NetworkMode {
    /// Provider wire representation.
    pub fn as_provider(&self) -> &'static str {
        match self {
            NetworkMode::Bridge => "bridge",
            NetworkMode::AwsVpc => "awsvpc",
            NetworkMode::Host => "host",
        }
    }
}

/// Launch compatibility for a task definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    #[default]
    Ec2,
    Fargate,
}

impl Compatibility {
    /// Provider wire representation.
    pub fn as_provider(&self) -> &'static str {
        match self {
            Compatibility::Ec2 => "EC2",
            Compatibility::Fargate => "FARGATE",
        }
    }
}

/// Container definition within a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name
    pub name: String,

    /// Image reference (e.g. "nginx:1.27")
    pub image: String,

    /// Whether the task fails when this container stops
    #[serde(default = "default_true")]
    pub essential: bool,

    /// Container CPU units
    #[serde(default)]
    pub cpu: Option<u32>,

    /// Container memory limit in MiB
    #[serde(default)]
    pub memory_mib: Option<u32>,

    /// Exposed container ports
    #[serde(default)]
    pub port_mappings: Vec<PortMapping>,

    /// Environment variables
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Command override
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Log sink configuration
    #[serde(default)]
    pub logging: Option<LogSpec>,

    /// Container health check command
    #[serde(default)]
    pub health_check: Option<ContainerHealthCheck>,
}

/// A container port exposure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port inside the container
    pub container_port: u16,

    /// Transport protocol
    #[serde(default)]
    pub protocol: Protocol,
}

/// Log sink configuration for a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSpec {
    /// Log group name
    pub group: String,

    /// Stream prefix within the group
    pub stream_prefix: String,

    /// Days to retain log events
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

/// Shell health check executed inside the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHealthCheck {
    /// Command to run (wrapped in CMD-SHELL)
    pub command: String,

    /// Seconds between checks
    #[serde(default = "default_health_interval")]
    pub interval_seconds: u64,

    /// Failures before the container is marked unhealthy
    #[serde(default = "default_health_retries")]
    pub retries: u32,
}

/// Service descriptor: keeps N copies of a task running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Service name
    pub name: String,

    /// Number of task copies to keep running
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    /// Capacity provider to schedule onto
    #[serde(default)]
    pub capacity_provider: Option<String>,

    /// Weight of the capacity provider in the strategy
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Roll back automatically on failed deployments
    #[serde(default = "default_true")]
    pub circuit_breaker_rollback: bool,

    /// Register the service in the discovery namespace
    #[serde(default)]
    pub discovery: Option<DiscoverySpec>,
}

/// Service discovery registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySpec {
    /// DNS record TTL in seconds
    pub dns_ttl_seconds: u64,
}

impl Default for DiscoverySpec {
    fn default() -> Self {
        Self { dns_ttl_seconds: 60 }
    }
}

/// Exposes one container of a service through the load balancer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressSpec {
    /// Container to route traffic to
    pub container: String,

    /// Container port to route traffic to
    pub container_port: u16,

    /// Target group fronting the service
    pub target_group: TargetGroupSpec,

    /// Listener rule selecting traffic for the target group
    pub rule: ListenerRuleSpec,
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    30
}

fn default_health_interval() -> u64 {
    5
}

fn default_health_retries() -> u32 {
    3
}

fn default_desired_count() -> u32 {
    1
}

fn default_weight() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_mode_provider_names() {
        assert_eq!(NetworkMode::AwsVpc.as_provider(), "awsvpc");
        assert_eq!(NetworkMode::Bridge.as_provider(), "bridge");
    }

    #[test]
    fn test_container_defaults() {
        let spec: ContainerSpec = serde_yaml::from_str(
            r#"
name: nginx
image: nginx:1.27
"#,
        )
        .unwrap();
        assert!(spec.essential);
        assert!(spec.port_mappings.is_empty());
        assert!(spec.logging.is_none());
    }

    #[test]
    fn test_service_defaults() {
        let spec: ServiceSpec = serde_yaml::from_str("name: WebService").unwrap();
        assert_eq!(spec.desired_count, 1);
        assert_eq!(spec.weight, 1);
        assert!(spec.circuit_breaker_rollback);
        assert!(spec.discovery.is_none());
    }
}
