//! Domain types: passive configuration records mirroring the provider's
//! resource schema.

pub mod balancer;
pub mod compute;
pub mod network;
pub mod service;

pub use balancer::{
    AppProtocol, HealthCheckSpec, ListenerRuleSpec, LoadBalancerSpec, TargetGroupSpec, TargetType,
};
pub use compute::{
    AsgCapacityProvider, AsgSpec, CapacityProviderSpec, ClusterSpec, InstanceClass, InstanceSize,
};
pub use network::{
    GroupRef, IngressRule, NamespaceSpec, Peer, Protocol, SecurityGroupSpec, SecurityGroupsSpec,
    VpcSelector,
};
pub use service::{
    Compatibility, ContainerHealthCheck, ContainerSpec, DiscoverySpec, IngressSpec, LogSpec,
    NetworkMode, PortMapping, ServiceSpec, TaskSpec,
};
