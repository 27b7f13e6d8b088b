//! Container service composer.
//!
//! Declares a task definition with its containers and log groups, then a
//! service that runs it on a compute stack's cluster. Cross-stack wiring
//! (cluster, listener, namespace, instance security group) goes through
//! the compute stack's exports rather than shared state.

use crate::compose::compute::{self, logical_id, ComputeExports};
use crate::config::TargetConfig;
use crate::error::{Result, StrataError};
use crate::manifest::ServiceStack;
use crate::template::{value, ResourceHandle, Stack};
use crate::types::{ContainerSpec, NetworkMode};
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Handles produced by the service composer.
pub struct ContainerService {
    task_definition: ResourceHandle,
    service: ResourceHandle,
    target_group: Option<ResourceHandle>,
    discovery: Option<ResourceHandle>,
}

impl ContainerService {
    /// Compose the service layer into `stack`.
    #[instrument(skip(stack, spec, exports, target), fields(stack = %stack.name()))]
    pub fn compose(
        stack: &mut Stack,
        spec: &ServiceStack,
        exports: &ComputeExports,
        target: &TargetConfig,
    ) -> Result<Self> {
        info!("Composing container service stack");

        let stack_name = stack.name().to_string();

        let mut container_defs = Vec::with_capacity(spec.containers.len());
        for container in &spec.containers {
            container_defs.push(container_definition(stack, container, target)?);
        }

        let mut task_props = json!({
            "Family": spec.task.family,
            "NetworkMode": spec.task.network_mode.as_provider(),
            "RequiresCompatibilities": [spec.task.compatibility.as_provider()],
            "ContainerDefinitions": container_defs,
        });
        if let Some(cpu) = spec.task.cpu {
            task_props["Cpu"] = json!(cpu.to_string());
        }
        if let Some(memory) = spec.task.memory_mib {
            task_props["Memory"] = json!(memory.to_string());
        }
        let task_definition =
            stack.add_resource("TaskDefinition", "AWS::ECS::TaskDefinition", task_props)?;

        let mut target_group = None;
        let mut listener_rule = None;
        if let Some(ingress) = &spec.ingress {
            // Same VPC as the listener that will forward to this group
            let tg = compute::target_group_resource(
                stack,
                "TargetGroup",
                &ingress.target_group,
                &exports.vpc_id,
            )?;
            listener_rule = Some(compose_listener_rule(stack, ingress, exports, &tg)?);
            target_group = Some(tg);
        }

        let discovery = match (&spec.service.discovery, &exports.namespace_id) {
            (Some(d), Some(namespace_export)) => Some(stack.add_resource(
                "DiscoveryService",
                "AWS::ServiceDiscovery::Service",
                json!({
                    "Name": spec.service.name,
                    "DnsConfig": {
                        "NamespaceId": value::import_value(namespace_export),
                        "DnsRecords": [{ "Type": "A", "TTL": d.dns_ttl_seconds }],
                        "RoutingPolicy": "MULTIVALUE",
                    },
                }),
            )?),
            (Some(_), None) => {
                return Err(StrataError::MissingNamespace { service: stack_name })
            }
            (None, _) => None,
        };

        let mut service_props = json!({
            "ServiceName": spec.service.name,
            "Cluster": value::import_value(&exports.cluster_name),
            "TaskDefinition": task_definition.reference(),
            "DesiredCount": spec.service.desired_count,
            "DeploymentConfiguration": {
                "DeploymentCircuitBreaker": {
                    "Enable": true,
                    "Rollback": spec.service.circuit_breaker_rollback,
                },
            },
        });
        match &spec.service.capacity_provider {
            Some(provider) => {
                service_props["CapacityProviderStrategy"] = json!([
                    { "CapacityProvider": provider, "Weight": spec.service.weight }
                ]);
            }
            None => {
                service_props["LaunchType"] = json!(spec.task.compatibility.as_provider());
            }
        }
        if spec.task.network_mode == NetworkMode::AwsVpc {
            service_props["NetworkConfiguration"] = json!({
                "AwsvpcConfiguration": {
                    "Subnets": target.subnet_ids,
                    "SecurityGroups": [value::import_value(&exports.asg_security_group_id)],
                },
            });
        }
        if let (Some(ingress), Some(tg)) = (&spec.ingress, &target_group) {
            service_props["LoadBalancers"] = json!([
                {
                    "ContainerName": ingress.container,
                    "ContainerPort": ingress.container_port,
                    "TargetGroupArn": tg.reference(),
                }
            ]);
        }
        if let Some(d) = &discovery {
            service_props["ServiceRegistries"] = json!([{ "RegistryArn": d.attribute("Arn") }]);
        }

        let service = stack.add_resource("EcsService", "AWS::ECS::Service", service_props)?;
        // The target group must be attached to the listener before the
        // service can register targets against it
        if let Some(rule) = &listener_rule {
            stack.add_dependency(&service, rule);
        }

        stack.add_output(
            "ServiceArn",
            service.reference(),
            Some("Service ARN".to_string()),
            None,
        );

        Ok(Self { task_definition, service, target_group, discovery })
    }

    /// Task definition handle.
    pub fn task_definition(&self) -> &ResourceHandle {
        &self.task_definition
    }

    /// Service handle.
    pub fn service(&self) -> &ResourceHandle {
        &self.service
    }

    /// Target group handle, when the service takes traffic.
    pub fn target_group(&self) -> Option<&ResourceHandle> {
        self.target_group.as_ref()
    }

    /// Discovery service handle, when DNS discovery is enabled.
    pub fn discovery(&self) -> Option<&ResourceHandle> {
        self.discovery.as_ref()
    }
}

fn container_definition(
    stack: &mut Stack,
    container: &ContainerSpec,
    target: &TargetConfig,
) -> Result<Value> {
    let mut def = json!({
        "Name": container.name,
        "Image": container.image,
        "Essential": container.essential,
    });
    if let Some(cpu) = container.cpu {
        def["Cpu"] = json!(cpu);
    }
    if let Some(memory) = container.memory_mib {
        def["Memory"] = json!(memory);
    }
    if !container.port_mappings.is_empty() {
        def["PortMappings"] = Value::Array(
            container
                .port_mappings
                .iter()
                .map(|mapping| {
                    json!({
                        "ContainerPort": mapping.container_port,
                        "Protocol": mapping.protocol.as_provider(),
                    })
                })
                .collect(),
        );
    }
    if !container.environment.is_empty() {
        def["Environment"] = Value::Array(
            container
                .environment
                .iter()
                .map(|(name, value)| json!({ "Name": name, "Value": value }))
                .collect(),
        );
    }
    if let Some(command) = &container.command {
        def["Command"] = json!(command);
    }
    if let Some(log) = &container.logging {
        let log_group = stack.add_resource(
            &format!("{}LogGroup", logical_id(&container.name)),
            "AWS::Logs::LogGroup",
            json!({
                "LogGroupName": log.group,
                "RetentionInDays": log.retention_days,
            }),
        )?;
        def["LogConfiguration"] = json!({
            "LogDriver": "awslogs",
            "Options": {
                "awslogs-group": log_group.reference(),
                "awslogs-region": target.region,
                "awslogs-stream-prefix": log.stream_prefix,
            },
        });
    }
    if let Some(hc) = &container.health_check {
        def["HealthCheck"] = json!({
            "Command": ["CMD-SHELL", hc.command],
            "Interval": hc.interval_seconds,
            "Retries": hc.retries,
        });
    }
    Ok(def)
}

fn compose_listener_rule(
    stack: &mut Stack,
    ingress: &crate::types::IngressSpec,
    exports: &ComputeExports,
    target_group: &ResourceHandle,
) -> Result<ResourceHandle> {
    let mut conditions = Vec::new();
    if !ingress.rule.host_headers.is_empty() {
        conditions.push(json!({
            "Field": "host-header",
            "HostHeaderConfig": { "Values": ingress.rule.host_headers },
        }));
    }
    if !ingress.rule.path_patterns.is_empty() {
        conditions.push(json!({
            "Field": "path-pattern",
            "PathPatternConfig": { "Values": ingress.rule.path_patterns },
        }));
    }

    stack.add_resource(
        "ListenerRule",
        "AWS::ElasticLoadBalancingV2::ListenerRule",
        json!({
            "ListenerArn": value::import_value(&exports.primary_listener_arn),
            "Priority": ingress.rule.priority,
            "Conditions": conditions,
            "Actions": [
                { "Type": "forward", "TargetGroupArn": target_group.reference() }
            ],
        }),
    )
}
