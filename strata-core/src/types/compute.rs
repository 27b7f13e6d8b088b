//! Compute domain types: cluster, auto-scaling groups, capacity providers.

use serde::{Deserialize, Serialize};

/// Container cluster descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Cluster name
    pub name: String,

    /// Enable detailed container monitoring
    #[serde(default)]
    pub container_insights: bool,

    /// Bind auto-scaling group capacity providers to the cluster
    #[serde(default = "default_true")]
    pub asg_capacity_providers: bool,

    /// Also enable the managed serverless capacity providers
    #[serde(default)]
    pub fargate_capacity_providers: bool,
}

/// An auto-scaling group paired with the capacity provider that exposes it
/// to the cluster scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsgCapacityProvider {
    /// Auto-scaling group descriptor
    pub auto_scaling_group: AsgSpec,

    /// Capacity provider descriptor
    pub capacity_provider: CapacityProviderSpec,
}

/// Auto-scaling group descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsgSpec {
    /// Group name
    pub name: String,

    /// Instance class (e.g. burstable2)
    pub instance_class: InstanceClass,

    /// Instance size (e.g. micro)
    pub instance_size: InstanceSize,

    /// Minimum instance count
    #[serde(default)]
    pub min_capacity: u32,

    /// Maximum instance count
    pub max_capacity: u32,

    /// Desired instance count (defaults to the minimum)
    #[serde(default)]
    pub desired_capacity: Option<u32>,

    /// SSH key pair name; falls back to the deployment target's key
    #[serde(default)]
    pub ssh_key_name: Option<String>,
}

/// Capacity provider descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityProviderSpec {
    /// Capacity provider name
    pub name: String,

    /// Managed scaling target percentage
    #[serde(default = "default_target_capacity")]
    pub target_capacity_percent: u32,

    /// Enable managed scaling
    #[serde(default = "default_true")]
    pub managed_scaling: bool,

    /// Protect instances running tasks from scale-in termination
    #[serde(default)]
    pub managed_termination_protection: bool,
}

/// Instance class, matching the provider's type families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceClass {
    Burstable2,
    Burstable3,
    Standard5,
    Compute5,
    Memory5,
}

impl InstanceClass {
    /// Provider type-family prefix.
    pub fn api_name(&self) -> &'static str {
        match self {
            InstanceClass::Burstable2 => "t2",
            InstanceClass::Burstable3 => "t3",
            InstanceClass::Standard5 => "m5",
            InstanceClass::Compute5 => "c5",
            InstanceClass::Memory5 => "r5",
        }
    }
}

/// Instance size within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceSize {
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
}

impl InstanceSize {
    /// Provider size suffix.
    pub fn api_name(&self) -> &'static str {
        match self {
            InstanceSize::Micro => "micro",
            InstanceSize::Small => "small",
            InstanceSize::Medium => "medium",
            InstanceSize::Large => "large",
            InstanceSize::Xlarge => "xlarge",
        }
    }
}

impl AsgSpec {
    /// Full provider instance type, e.g. "t2.micro".
    pub fn instance_type(&self) -> String {
        format!("{}.{}", self.instance_class.api_name(), self.instance_size.api_name())
    }

    /// Desired capacity, defaulting to the minimum.
    pub fn desired_capacity(&self) -> u32 {
        self.desired_capacity.unwrap_or(self.min_capacity)
    }
}

fn default_true() -> bool {
    true
}

fn default_target_capacity() -> u32 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_type_join() {
        let spec = AsgSpec {
            name: "MicroAsg".to_string(),
            instance_class: InstanceClass::Burstable2,
            instance_size: InstanceSize::Micro,
            min_capacity: 0,
            max_capacity: 1,
            desired_capacity: None,
            ssh_key_name: None,
        };
        assert_eq!(spec.instance_type(), "t2.micro");
        assert_eq!(spec.desired_capacity(), 0);
    }

    #[test]
    fn test_capacity_provider_defaults() {
        let spec: CapacityProviderSpec =
            serde_yaml::from_str("name: MicroAsgCapacityProvider").unwrap();
        assert_eq!(spec.target_capacity_percent, 100);
        assert!(spec.managed_scaling);
        assert!(!spec.managed_termination_protection);
    }

    #[test]
    fn test_cluster_defaults() {
        let spec: ClusterSpec = serde_yaml::from_str("name: DemoCluster").unwrap();
        assert!(!spec.container_insights);
        assert!(spec.asg_capacity_providers);
        assert!(!spec.fargate_capacity_providers);
    }
}
