//! Load balancer domain types: balancer, target groups, listener rules.

use serde::{Deserialize, Serialize};

/// Application load balancer descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    /// Load balancer name
    pub name: String,

    /// Certificate reference for the HTTPS listener; falls back to the
    /// deployment target's certificate. Without one, only an HTTP
    /// listener is declared.
    #[serde(default)]
    pub certificate_arn: Option<String>,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Default target group; generated from the balancer name when omitted
    #[serde(default)]
    pub default_target_group: Option<TargetGroupSpec>,
}

/// Target group descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetGroupSpec {
    /// Target group name
    pub name: String,

    /// Traffic port
    #[serde(default = "default_target_port")]
    pub port: u16,

    /// Routing protocol
    #[serde(default)]
    pub protocol: AppProtocol,

    /// Target registration type
    #[serde(default)]
    pub target_type: TargetType,

    /// Health check parameters
    #[serde(default)]
    pub health_check: Option<HealthCheckSpec>,
}

/// Application-layer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppProtocol {
    #[default]
    Http,
    Https,
}

impl AppProtocol {
    /// Provider wire representation.
    pub fn as_provider(&self) -> &'static str {
        match self {
            AppProtocol::Http => "HTTP",
            AppProtocol::Https => "HTTPS",
        }
    }
}

/// How targets register with a target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Instance,
    Ip,
}

impl TargetType {
    /// Provider wire representation.
    pub fn as_provider(&self) -> &'static str {
        match self {
            TargetType::Instance => "instance",
            TargetType::Ip => "ip",
        }
    }
}

/// Target group health check parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckSpec {
    /// Request path
    pub path: String,

    /// HTTP codes counted as healthy
    pub healthy_http_codes: String,

    /// Seconds between checks
    pub interval_seconds: u64,
}

impl Default for HealthCheckSpec {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            healthy_http_codes: "200".to_string(),
            interval_seconds: 30,
        }
    }
}

/// Listener rule descriptor: routes matching traffic to a target group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerRuleSpec {
    /// Rule priority (lower evaluates first; must be unique per listener)
    pub priority: u32,

    /// Host header conditions
    #[serde(default)]
    pub host_headers: Vec<String>,

    /// Path pattern conditions
    #[serde(default)]
    pub path_patterns: Vec<String>,
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_target_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_defaults() {
        let hc = HealthCheckSpec::default();
        assert_eq!(hc.path, "/");
        assert_eq!(hc.healthy_http_codes, "200");
        assert_eq!(hc.interval_seconds, 30);
    }

    #[test]
    fn test_load_balancer_defaults() {
        let spec: LoadBalancerSpec = serde_yaml::from_str("name: DemoLb").unwrap();
        assert_eq!(spec.idle_timeout_seconds, 120);
        assert!(spec.certificate_arn.is_none());
        assert!(spec.default_target_group.is_none());
    }

    #[test]
    fn test_target_group_defaults() {
        let spec: TargetGroupSpec = serde_yaml::from_str("name: DemoTg").unwrap();
        assert_eq!(spec.port, 8080);
        assert_eq!(spec.protocol, AppProtocol::Http);
        assert_eq!(spec.target_type, TargetType::Instance);
    }
}
