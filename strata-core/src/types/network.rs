//! Network domain types: VPC selection, security groups, service discovery.

use serde::{Deserialize, Serialize};

/// Selects an existing VPC by identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcSelector {
    /// VPC id (e.g. "vpc-0a1b2c3d")
    pub vpc_id: String,
}

/// The two security groups a compute stack declares: one for the
/// auto-scaling group instances, one for the load balancer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupsSpec {
    /// Security group for auto-scaling group instances
    pub asg: SecurityGroupSpec,

    /// Security group for the load balancer
    pub load_balancer: SecurityGroupSpec,
}

/// A single security group descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    /// Group name
    pub name: String,

    /// Group description
    pub description: String,

    /// Additional ingress rules beyond the composer defaults
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
}

/// An ingress rule: protocol + port range + peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressRule {
    /// IP protocol
    #[serde(default)]
    pub protocol: Protocol,

    /// First port in the range
    pub from_port: u16,

    /// Last port in the range (defaults to `from_port`)
    #[serde(default)]
    pub to_port: Option<u16>,

    /// Traffic source
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub peer: Peer,

    /// Rule description
    #[serde(default)]
    pub description: Option<String>,
}

impl IngressRule {
    /// Last port of the range, defaulting to the first.
    pub fn to_port(&self) -> u16 {
        self.to_port.unwrap_or(self.from_port)
    }
}

/// IP protocol for security group rules and port mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    /// All protocols ("-1" in the provider schema)
    All,
}

impl Protocol {
    /// Provider wire representation.
    pub fn as_provider(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::All => "-1",
        }
    }
}

/// Traffic source for an ingress rule: a CIDR block or one of the
/// stack's own security groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peer {
    /// Any IPv4 address (0.0.0.0/0)
    AnyIpv4,
    /// A specific CIDR block
    Cidr(String),
    /// A security group declared in the same stack
    SecurityGroup(GroupRef),
}

impl Peer {
    /// CIDR block this peer resolves to, when it is address-based.
    pub fn cidr(&self) -> Option<&str> {
        match self {
            Peer::AnyIpv4 => Some("0.0.0.0/0"),
            Peer::Cidr(block) => Some(block),
            Peer::SecurityGroup(_) => None,
        }
    }
}

/// Names one of the two security groups a compute stack declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRef {
    /// The auto-scaling group instances' security group
    Asg,
    /// The load balancer's security group
    LoadBalancer,
}

/// Private DNS namespace for service discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceSpec {
    /// Namespace name (e.g. "services.internal")
    pub name: String,

    /// Namespace description
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_provider_names() {
        assert_eq!(Protocol::Tcp.as_provider(), "tcp");
        assert_eq!(Protocol::Udp.as_provider(), "udp");
        assert_eq!(Protocol::All.as_provider(), "-1");
    }

    #[test]
    fn test_peer_cidr() {
        assert_eq!(Peer::AnyIpv4.cidr(), Some("0.0.0.0/0"));
        assert_eq!(Peer::Cidr("10.0.0.0/8".to_string()).cidr(), Some("10.0.0.0/8"));
        assert_eq!(Peer::SecurityGroup(GroupRef::Asg).cidr(), None);
    }

    #[test]
    fn test_ingress_rule_port_range_default() {
        let rule: IngressRule = serde_yaml::from_str(
            r#"
protocol: tcp
from_port: 9090
peer: any_ipv4
"#,
        )
        .unwrap();
        assert_eq!(rule.to_port(), 9090);
        assert_eq!(rule.peer, Peer::AnyIpv4);
    }

    #[test]
    fn test_peer_parses_from_map_syntax() {
        let rule: IngressRule = serde_yaml::from_str(
            r#"
from_port: 9090
peer:
  cidr: "10.0.0.0/8"
"#,
        )
        .unwrap();
        assert_eq!(rule.peer, Peer::Cidr("10.0.0.0/8".to_string()));

        let rule: IngressRule = serde_yaml::from_str(
            r#"
from_port: 6379
peer:
  security_group: load_balancer
"#,
        )
        .unwrap();
        assert_eq!(rule.peer, Peer::SecurityGroup(GroupRef::LoadBalancer));
    }
}
