//! Container compute composer.
//!
//! Declares the shared compute layer of a deployment in dependency order:
//! security groups → cluster → capacity providers → load balancer →
//! listeners → discovery namespace. Each step returns a handle the next
//! steps wire into their properties; nothing is read from shared state.

use crate::config::TargetConfig;
use crate::error::{Result, StrataError};
use crate::manifest::ComputeStack;
use crate::template::{value, ResourceHandle, Stack};
use crate::types::{
    AsgCapacityProvider, ClusterSpec, GroupRef, IngressRule, LoadBalancerSpec, NamespaceSpec,
    Peer, SecurityGroupsSpec, TargetGroupSpec,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Machine image for auto-scaling group instances, resolved at deploy time
/// from the provider's public parameter store.
const AMAZON_LINUX_2_IMAGE: &str =
    "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}";

/// Fixed logical ids of the stack's two security groups, so ingress
/// rules can name them before both are declared.
const LB_SECURITY_GROUP: &str = "LoadBalancerSecurityGroup";
const ASG_SECURITY_GROUP: &str = "AutoScalingSecurityGroup";

/// Actions the instance role needs for volume management on the hosts.
const VOLUME_ACCESS_ACTIONS: [&str; 12] = [
    "ec2:AttachVolume",
    "ec2:CreateVolume",
    "ec2:DeleteVolume",
    "ec2:DescribeAvailabilityZones",
    "ec2:DescribeInstances",
    "ec2:DescribeVolumes",
    "ec2:DescribeVolumeAttribute",
    "ec2:DetachVolume",
    "ec2:DescribeVolumeStatus",
    "ec2:ModifyVolumeAttribute",
    "ec2:DescribeTags",
    "ec2:CreateTags",
];

/// Export names a compute stack publishes for service stacks to import.
#[derive(Debug, Clone)]
pub struct ComputeExports {
    /// Export carrying the cluster name
    pub cluster_name: String,

    /// Export carrying the listener that service rules attach to (HTTPS
    /// when a certificate is configured, plain HTTP otherwise)
    pub primary_listener_arn: String,

    /// Export carrying the instance security group id
    pub asg_security_group_id: String,

    /// Export carrying the discovery namespace id, when one is declared
    pub namespace_id: Option<String>,

    /// VPC the compute stack resolved, so service resources land in the
    /// same network
    pub vpc_id: String,
}

/// Handles produced by the compute composer.
pub struct ContainerCompute {
    cluster: ResourceHandle,
    load_balancer: ResourceHandle,
    primary_listener: ResourceHandle,
    namespace: Option<ResourceHandle>,
    exports: ComputeExports,
}

impl ContainerCompute {
    /// Compose the compute layer into `stack`.
    #[instrument(skip(stack, spec, target), fields(stack = %stack.name()))]
    pub fn compose(stack: &mut Stack, spec: &ComputeStack, target: &TargetConfig) -> Result<Self> {
        info!("Composing container compute stack");

        let stack_name = stack.name().to_string();
        let missing = |section: &str| StrataError::MissingSection {
            stack: stack_name.clone(),
            section: section.to_string(),
        };

        let cluster_spec = spec.cluster.as_ref().ok_or_else(|| missing("cluster"))?;
        let sg_spec = spec.security_groups.as_ref().ok_or_else(|| missing("security_groups"))?;
        let lb_spec = spec.load_balancer.as_ref().ok_or_else(|| missing("load_balancer"))?;

        let vpc_id = spec.network.as_ref().map(|n| n.vpc_id.as_str()).unwrap_or(&target.vpc_id);

        let (asg_sg, lb_sg) = compose_security_groups(stack, sg_spec, vpc_id)?;
        let cluster = compose_cluster(stack, cluster_spec)?;

        let mut providers = Vec::new();
        if cluster_spec.asg_capacity_providers {
            for entry in &spec.capacity_providers {
                providers.push(compose_capacity_provider(
                    stack,
                    entry,
                    &cluster_spec.name,
                    &asg_sg,
                    target,
                )?);
            }
        }
        compose_provider_associations(stack, &cluster, cluster_spec, &providers)?;

        let load_balancer = compose_load_balancer(stack, lb_spec, &lb_sg, target)?;
        let default_tg = compose_default_target_group(stack, lb_spec, vpc_id)?;
        let certificate =
            lb_spec.certificate_arn.clone().or_else(|| target.certificate_arn.clone());
        let primary_listener =
            compose_listeners(stack, &load_balancer, &default_tg, certificate.as_deref())?;

        let namespace = match &spec.namespace {
            Some(ns) => Some(compose_namespace(stack, ns, vpc_id)?),
            None => None,
        };

        let exports = ComputeExports {
            cluster_name: format!("{}-ClusterName", stack_name),
            primary_listener_arn: format!("{}-PrimaryListenerArn", stack_name),
            asg_security_group_id: format!("{}-AsgSecurityGroupId", stack_name),
            namespace_id: namespace.as_ref().map(|_| format!("{}-NamespaceId", stack_name)),
            vpc_id: vpc_id.to_string(),
        };

        stack.add_output(
            "ClusterName",
            cluster.reference(),
            Some("Container cluster name".to_string()),
            Some(exports.cluster_name.clone()),
        );
        stack.add_output(
            "PrimaryListenerArn",
            primary_listener.reference(),
            Some("Listener that service rules attach to".to_string()),
            Some(exports.primary_listener_arn.clone()),
        );
        stack.add_output(
            "AsgSecurityGroupId",
            asg_sg.attribute("GroupId"),
            Some("Security group of the cluster instances".to_string()),
            Some(exports.asg_security_group_id.clone()),
        );
        stack.add_output(
            "LoadBalancerDnsName",
            load_balancer.attribute("DNSName"),
            Some("Public DNS name of the load balancer".to_string()),
            None,
        );
        if let (Some(ns), Some(export)) = (&namespace, &exports.namespace_id) {
            stack.add_output(
                "NamespaceId",
                ns.attribute("Id"),
                Some("Service discovery namespace id".to_string()),
                Some(export.clone()),
            );
        }

        Ok(Self { cluster, load_balancer, primary_listener, namespace, exports })
    }

    /// Cluster handle.
    pub fn cluster(&self) -> &ResourceHandle {
        &self.cluster
    }

    /// Load balancer handle.
    pub fn load_balancer(&self) -> &ResourceHandle {
        &self.load_balancer
    }

    /// Listener that service rules attach to.
    pub fn primary_listener(&self) -> &ResourceHandle {
        &self.primary_listener
    }

    /// Discovery namespace handle, when declared.
    pub fn namespace(&self) -> Option<&ResourceHandle> {
        self.namespace.as_ref()
    }

    /// Export names for service stacks.
    pub fn exports(&self) -> &ComputeExports {
        &self.exports
    }
}

/// Strip a manifest name down to a valid logical id prefix.
pub(crate) fn logical_id(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => cleaned,
    }
}

fn cidr_ingress(protocol: &str, from: u16, to: u16, cidr: &str, description: &str) -> Value {
    json!({
        "IpProtocol": protocol,
        "FromPort": from,
        "ToPort": to,
        "CidrIp": cidr,
        "Description": description,
    })
}

fn rule_entry(rule: &IngressRule) -> Value {
    let mut entry = json!({
        "IpProtocol": rule.protocol.as_provider(),
        "FromPort": rule.from_port,
        "ToPort": rule.to_port(),
        "Description": rule.description.as_deref().unwrap_or("Additional ingress rule"),
    });
    match &rule.peer {
        Peer::SecurityGroup(group) => {
            let id = match group {
                GroupRef::Asg => ASG_SECURITY_GROUP,
                GroupRef::LoadBalancer => LB_SECURITY_GROUP,
            };
            entry["SourceSecurityGroupId"] = value::get_att(id, "GroupId");
        }
        peer => {
            // cidr() is total for the address-based variants
            entry["CidrIp"] = json!(peer.cidr());
        }
    }
    entry
}

fn compose_security_groups(
    stack: &mut Stack,
    spec: &SecurityGroupsSpec,
    vpc_id: &str,
) -> Result<(ResourceHandle, ResourceHandle)> {
    // The load balancer group always admits HTTP and HTTPS
    let mut lb_ingress = vec![
        cidr_ingress("tcp", 80, 80, "0.0.0.0/0", "Default HTTP Port"),
        cidr_ingress("tcp", 443, 443, "0.0.0.0/0", "Default HTTPS Port"),
    ];
    lb_ingress.extend(spec.load_balancer.ingress.iter().map(rule_entry));

    let lb_sg = stack.add_resource(
        LB_SECURITY_GROUP,
        "AWS::EC2::SecurityGroup",
        json!({
            "GroupName": spec.load_balancer.name,
            "GroupDescription": spec.load_balancer.description,
            "VpcId": vpc_id,
            "SecurityGroupIngress": lb_ingress,
            "SecurityGroupEgress": [
                { "IpProtocol": "-1", "CidrIp": "0.0.0.0/0", "Description": "Allow all outbound" }
            ],
        }),
    )?;

    // Instances accept anything from the load balancer group, plus SSH
    let mut asg_ingress = vec![
        json!({
            "IpProtocol": "-1",
            "SourceSecurityGroupId": lb_sg.attribute("GroupId"),
            "Description": "Access all ports from the load balancer security group",
        }),
        cidr_ingress("tcp", 22, 22, "0.0.0.0/0", "SSH access port"),
    ];
    asg_ingress.extend(spec.asg.ingress.iter().map(rule_entry));

    let asg_sg = stack.add_resource(
        ASG_SECURITY_GROUP,
        "AWS::EC2::SecurityGroup",
        json!({
            "GroupName": spec.asg.name,
            "GroupDescription": spec.asg.description,
            "VpcId": vpc_id,
            "SecurityGroupIngress": asg_ingress,
            "SecurityGroupEgress": [
                { "IpProtocol": "-1", "CidrIp": "0.0.0.0/0", "Description": "Allow all outbound" }
            ],
        }),
    )?;

    Ok((asg_sg, lb_sg))
}

fn compose_cluster(stack: &mut Stack, spec: &ClusterSpec) -> Result<ResourceHandle> {
    stack.add_resource(
        "EcsCluster",
        "AWS::ECS::Cluster",
        json!({
            "ClusterName": spec.name,
            "ClusterSettings": [
                {
                    "Name": "containerInsights",
                    "Value": if spec.container_insights { "enabled" } else { "disabled" },
                }
            ],
        }),
    )
}

fn compose_capacity_provider(
    stack: &mut Stack,
    entry: &AsgCapacityProvider,
    cluster_name: &str,
    asg_sg: &ResourceHandle,
    target: &TargetConfig,
) -> Result<ResourceHandle> {
    let asg = &entry.auto_scaling_group;
    let provider = &entry.capacity_provider;
    let base = logical_id(&asg.name);

    let role = stack.add_resource(
        &format!("{}InstanceRole", base),
        "AWS::IAM::Role",
        json!({
            "RoleName": format!("{}InstanceProfileRole", asg.name),
            "Description": format!("Instance role for auto-scaling group {}", asg.name),
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [
                    {
                        "Effect": "Allow",
                        "Principal": { "Service": "ec2.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }
                ],
            },
            "Policies": [
                {
                    "PolicyName": "Ec2VolumeAccess",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [
                            { "Effect": "Allow", "Action": VOLUME_ACCESS_ACTIONS, "Resource": "*" }
                        ],
                    },
                }
            ],
        }),
    )?;

    let profile = stack.add_resource(
        &format!("{}InstanceProfile", base),
        "AWS::IAM::InstanceProfile",
        json!({ "Roles": [role.reference()] }),
    )?;

    let mut launch_data = json!({
        "ImageId": AMAZON_LINUX_2_IMAGE,
        "InstanceType": asg.instance_type(),
        "IamInstanceProfile": { "Arn": profile.attribute("Arn") },
        "SecurityGroupIds": [asg_sg.attribute("GroupId")],
        "UserData": BASE64.encode(instance_user_data(cluster_name, &target.region)),
    });
    if let Some(key) = asg.ssh_key_name.clone().or_else(|| target.ssh_key_name.clone()) {
        launch_data["KeyName"] = json!(key);
    }

    let launch_template = stack.add_resource(
        &format!("{}LaunchTemplate", base),
        "AWS::EC2::LaunchTemplate",
        json!({
            "LaunchTemplateName": format!("{}LaunchTemplate", asg.name),
            "LaunchTemplateData": launch_data,
        }),
    )?;

    let group = stack.add_resource(
        &format!("{}AutoScalingGroup", base),
        "AWS::AutoScaling::AutoScalingGroup",
        json!({
            "AutoScalingGroupName": asg.name,
            "MinSize": asg.min_capacity.to_string(),
            "MaxSize": asg.max_capacity.to_string(),
            "DesiredCapacity": asg.desired_capacity().to_string(),
            "VPCZoneIdentifier": target.subnet_ids,
            "LaunchTemplate": {
                "LaunchTemplateId": launch_template.reference(),
                "Version": launch_template.attribute("LatestVersionNumber"),
            },
        }),
    )?;

    let capacity_provider = stack.add_resource(
        &format!("{}AsgCapacityProvider", base),
        "AWS::ECS::CapacityProvider",
        json!({
            "Name": provider.name,
            "AutoScalingGroupProvider": {
                "AutoScalingGroupArn": group.reference(),
                "ManagedScaling": {
                    "Status": if provider.managed_scaling { "ENABLED" } else { "DISABLED" },
                    "TargetCapacity": provider.target_capacity_percent,
                },
                "ManagedTerminationProtection": if provider.managed_termination_protection {
                    "ENABLED"
                } else {
                    "DISABLED"
                },
            },
        }),
    )?;

    Ok(capacity_provider)
}

fn compose_provider_associations(
    stack: &mut Stack,
    cluster: &ResourceHandle,
    spec: &ClusterSpec,
    providers: &[ResourceHandle],
) -> Result<()> {
    let mut entries: Vec<Value> = providers.iter().map(ResourceHandle::reference).collect();
    if spec.fargate_capacity_providers {
        entries.push(json!("FARGATE"));
        entries.push(json!("FARGATE_SPOT"));
    }

    if entries.is_empty() {
        return Ok(());
    }

    stack.add_resource(
        "ClusterCapacityProviderAssociations",
        "AWS::ECS::ClusterCapacityProviderAssociations",
        json!({
            "Cluster": cluster.reference(),
            "CapacityProviders": entries,
            "DefaultCapacityProviderStrategy": [],
        }),
    )?;
    Ok(())
}

/// Bootstrap script run by every instance before it joins the cluster.
fn instance_user_data(cluster_name: &str, region: &str) -> String {
    [
        "#!/bin/bash",
        "sudo yum -y update",
        "sudo yum -y install wget",
        "sudo touch /etc/ecs/ecs.config",
        "sudo amazon-linux-extras disable docker",
        "sudo amazon-linux-extras install -y ecs",
        &format!("echo \"ECS_CLUSTER={}\" >> /etc/ecs/ecs.config", cluster_name),
        "echo \"ECS_AWSVPC_BLOCK_IMDS=true\" >> /etc/ecs/ecs.config",
        "sudo systemctl enable --now --no-block ecs.service",
        &format!(
            "docker plugin install rexray/ebs REXRAY_PREEMPT=true EBS_REGION={} --grant-all-permissions",
            region
        ),
    ]
    .join("\n")
}

fn compose_load_balancer(
    stack: &mut Stack,
    spec: &LoadBalancerSpec,
    lb_sg: &ResourceHandle,
    target: &TargetConfig,
) -> Result<ResourceHandle> {
    stack.add_resource(
        "LoadBalancer",
        "AWS::ElasticLoadBalancingV2::LoadBalancer",
        json!({
            "Name": spec.name,
            "Type": "application",
            "Scheme": "internet-facing",
            "IpAddressType": "ipv4",
            "Subnets": target.subnet_ids,
            "SecurityGroups": [lb_sg.attribute("GroupId")],
            "LoadBalancerAttributes": [
                {
                    "Key": "idle_timeout.timeout_seconds",
                    "Value": spec.idle_timeout_seconds.to_string(),
                }
            ],
        }),
    )
}

fn compose_default_target_group(
    stack: &mut Stack,
    spec: &LoadBalancerSpec,
    vpc_id: &str,
) -> Result<ResourceHandle> {
    let tg = spec.default_target_group.clone().unwrap_or_else(|| TargetGroupSpec {
        name: format!("{}DefaultTg", spec.name),
        port: 8080,
        protocol: Default::default(),
        target_type: Default::default(),
        health_check: None,
    });
    target_group_resource(stack, "DefaultTargetGroup", &tg, vpc_id)
}

/// Declare a target group. Shared with the service composer.
pub(crate) fn target_group_resource(
    stack: &mut Stack,
    logical_id: &str,
    spec: &TargetGroupSpec,
    vpc_id: &str,
) -> Result<ResourceHandle> {
    let mut props = json!({
        "Name": spec.name,
        "Port": spec.port,
        "Protocol": spec.protocol.as_provider(),
        "TargetType": spec.target_type.as_provider(),
        "VpcId": vpc_id,
    });
    if let Some(hc) = &spec.health_check {
        props["HealthCheckEnabled"] = json!(true);
        props["HealthCheckPath"] = json!(hc.path);
        props["HealthCheckIntervalSeconds"] = json!(hc.interval_seconds);
        props["Matcher"] = json!({ "HttpCode": hc.healthy_http_codes });
    }
    stack.add_resource(logical_id, "AWS::ElasticLoadBalancingV2::TargetGroup", props)
}

fn compose_listeners(
    stack: &mut Stack,
    load_balancer: &ResourceHandle,
    default_tg: &ResourceHandle,
    certificate: Option<&str>,
) -> Result<ResourceHandle> {
    match certificate {
        Some(cert) => {
            let https = stack.add_resource(
                "HttpsListener",
                "AWS::ElasticLoadBalancingV2::Listener",
                json!({
                    "LoadBalancerArn": load_balancer.reference(),
                    "Port": 443,
                    "Protocol": "HTTPS",
                    "Certificates": [{ "CertificateArn": cert }],
                    "DefaultActions": [
                        { "Type": "forward", "TargetGroupArn": default_tg.reference() }
                    ],
                }),
            )?;

            // Plain HTTP permanently redirects, preserving host, path and query
            stack.add_resource(
                "HttpListener",
                "AWS::ElasticLoadBalancingV2::Listener",
                json!({
                    "LoadBalancerArn": load_balancer.reference(),
                    "Port": 80,
                    "Protocol": "HTTP",
                    "DefaultActions": [
                        {
                            "Type": "redirect",
                            "RedirectConfig": {
                                "Protocol": "HTTPS",
                                "Port": "443",
                                "Host": "#{host}",
                                "Path": "/#{path}",
                                "Query": "#{query}",
                                "StatusCode": "HTTP_301",
                            },
                        }
                    ],
                }),
            )?;

            Ok(https)
        }
        None => stack.add_resource(
            "HttpListener",
            "AWS::ElasticLoadBalancingV2::Listener",
            json!({
                "LoadBalancerArn": load_balancer.reference(),
                "Port": 80,
                "Protocol": "HTTP",
                "DefaultActions": [
                    { "Type": "forward", "TargetGroupArn": default_tg.reference() }
                ],
            }),
        ),
    }
}

fn compose_namespace(
    stack: &mut Stack,
    spec: &NamespaceSpec,
    vpc_id: &str,
) -> Result<ResourceHandle> {
    stack.add_resource(
        "CloudMapNamespace",
        "AWS::ServiceDiscovery::PrivateDnsNamespace",
        json!({
            "Name": spec.name,
            "Description": spec.description,
            "Vpc": vpc_id,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_id_strips_non_alphanumeric() {
        assert_eq!(logical_id("Micro-Asg_1"), "MicroAsg1");
        assert_eq!(logical_id("MicroAsg"), "MicroAsg");
        assert_eq!(logical_id("web"), "Web");
    }

    #[test]
    fn test_user_data_wires_cluster_and_region() {
        let script = instance_user_data("DemoCluster", "us-east-1");
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("ECS_CLUSTER=DemoCluster"));
        assert!(script.contains("EBS_REGION=us-east-1"));
    }

    #[test]
    fn test_rule_entry_uses_peer_cidr() {
        let rule: IngressRule = serde_yaml::from_str(
            r#"
protocol: tcp
from_port: 9090
peer:
  cidr: "10.0.0.0/8"
"#,
        )
        .unwrap();
        let entry = rule_entry(&rule);
        assert_eq!(entry["CidrIp"], "10.0.0.0/8");
        assert_eq!(entry["FromPort"], 9090);
        assert_eq!(entry["ToPort"], 9090);
    }

    #[test]
    fn test_rule_entry_security_group_peer() {
        let rule: IngressRule = serde_yaml::from_str(
            r#"
protocol: tcp
from_port: 6379
peer:
  security_group: load_balancer
"#,
        )
        .unwrap();
        let entry = rule_entry(&rule);
        assert_eq!(entry["SourceSecurityGroupId"]["Fn::GetAtt"][0], LB_SECURITY_GROUP);
        assert_eq!(entry["SourceSecurityGroupId"]["Fn::GetAtt"][1], "GroupId");
        assert!(entry["CidrIp"].is_null());
    }
}
