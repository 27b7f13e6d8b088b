//! Stack manifest file format types.
//!
//! A manifest enumerates every variant axis of the infrastructure in one
//! place: capacity provider types, certificate presence, discovery, and
//! per-service ingress. One parameterized format replaces per-environment
//! copies of builder code.

use crate::config::TargetConfig;
use crate::types::{
    AsgCapacityProvider, ClusterSpec, ContainerSpec, IngressSpec, LoadBalancerSpec, NamespaceSpec,
    SecurityGroupsSpec, ServiceSpec, TaskSpec, VpcSelector,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root structure of a stack manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version (e.g. "1")
    #[serde(default)]
    pub version: String,

    /// Inline deployment targets; merged over the persistent config,
    /// manifest entries winning on name collisions
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,

    /// Stacks to declare
    #[serde(default)]
    pub stacks: BTreeMap<String, StackManifest>,
}

/// One stack in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StackManifest {
    /// Shared container compute: cluster, capacity, balancer, namespace
    Compute(ComputeStack),

    /// A container service deployed onto a compute stack
    Service(ServiceStack),
}

/// Compute stack sections.
///
/// Sections that the composer cannot proceed without are `Option` here so
/// omission surfaces as a validation error with the section name, not a
/// bare deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeStack {
    /// VPC override; defaults to the deployment target's VPC
    #[serde(default)]
    pub network: Option<VpcSelector>,

    /// Cluster descriptor (required)
    #[serde(default)]
    pub cluster: Option<ClusterSpec>,

    /// Security group descriptors (required)
    #[serde(default)]
    pub security_groups: Option<SecurityGroupsSpec>,

    /// Auto-scaling group capacity providers
    #[serde(default)]
    pub capacity_providers: Vec<AsgCapacityProvider>,

    /// Load balancer descriptor (required)
    #[serde(default)]
    pub load_balancer: Option<LoadBalancerSpec>,

    /// Service discovery namespace
    #[serde(default)]
    pub namespace: Option<NamespaceSpec>,
}

/// Service stack sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStack {
    /// Name of the compute stack this service deploys onto
    pub compute: String,

    /// Task definition descriptor
    pub task: TaskSpec,

    /// Containers in the task
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,

    /// Service descriptor
    pub service: ServiceSpec,

    /// Load balancer exposure
    #[serde(default)]
    pub ingress: Option<IngressSpec>,
}

impl Manifest {
    /// Iterate stacks of one kind in name order.
    pub fn compute_stacks(&self) -> impl Iterator<Item = (&String, &ComputeStack)> {
        self.stacks.iter().filter_map(|(name, stack)| match stack {
            StackManifest::Compute(spec) => Some((name, spec)),
            StackManifest::Service(_) => None,
        })
    }

    /// Iterate service stacks in name order.
    pub fn service_stacks(&self) -> impl Iterator<Item = (&String, &ServiceStack)> {
        self.stacks.iter().filter_map(|(name, stack)| match stack {
            StackManifest::Service(spec) => Some((name, spec)),
            StackManifest::Compute(_) => None,
        })
    }
}
