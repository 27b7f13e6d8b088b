//! End-to-end tests: manifest in, synthesized templates out.

use serde_json::Value;
use strata_core::{build_app, App, Config, ManifestParser, StrataError};
use tempfile::TempDir;

const MANIFEST: &str = r#"
version: "1"
targets:
  staging:
    account: "111111111111"
    region: us-east-1
    vpc_id: vpc-0123456789abcdef0
    subnet_ids:
      - subnet-aaa111
      - subnet-bbb222
    ssh_key_name: staging-key
    certificate_arn: arn:aws:acm:us-east-1:111111111111:certificate/demo
stacks:
  compute:
    kind: compute
    cluster:
      name: DemoCluster
      container_insights: true
    security_groups:
      asg:
        name: DemoAsgSg
        description: Cluster instance security group
      load_balancer:
        name: DemoLbSg
        description: Load balancer security group
    capacity_providers:
      - auto_scaling_group:
          name: MicroAsg
          instance_class: burstable2
          instance_size: micro
          min_capacity: 1
          max_capacity: 3
          desired_capacity: 2
        capacity_provider:
          name: MicroProvider
    load_balancer:
      name: DemoLb
    namespace:
      name: services.internal
      description: Private namespace for service discovery
  web:
    kind: service
    compute: compute
    task:
      family: web
    containers:
      - name: web
        image: example/web:1.0
        port_mappings:
          - container_port: 8080
        environment:
          APP_ENV: staging
        logging:
          group: /demo/web
          stream_prefix: web
        health_check:
          command: curl -f http://localhost:8080/ || exit 1
    service:
      name: web
      desired_count: 2
      capacity_provider: MicroProvider
      discovery: {}
    ingress:
      container: web
      container_port: 8080
      target_group:
        name: WebTg
        health_check:
          path: /
      rule:
        priority: 10
        path_patterns:
          - "/*"
"#;

fn build() -> App {
    let manifest = ManifestParser::parse(MANIFEST).unwrap();
    build_app(&manifest, &Config::default(), Some("staging")).unwrap()
}

fn template(app: &App, stack: &str) -> Value {
    let json = app.stack(stack).unwrap().template().to_json().unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_synthesis_is_deterministic() {
    let first = build();
    let second = build();
    for stack in first.stacks() {
        let a = stack.template().to_json().unwrap();
        let b = second.stack(stack.name()).unwrap().template().to_json().unwrap();
        assert_eq!(a, b, "stack {} differs between runs", stack.name());
    }
}

#[test]
fn test_listeners_reference_declared_load_balancer() {
    let app = build();
    let compute = template(&app, "compute");
    for listener in ["HttpListener", "HttpsListener"] {
        let arn = &compute["Resources"][listener]["Properties"]["LoadBalancerArn"];
        assert_eq!(arn["Ref"], "LoadBalancer", "{} points elsewhere", listener);
    }
}

#[test]
fn test_capacity_provider_references_declared_group() {
    let app = build();
    let compute = template(&app, "compute");
    let provider = &compute["Resources"]["MicroAsgAsgCapacityProvider"];
    assert_eq!(provider["Type"], "AWS::ECS::CapacityProvider");
    assert_eq!(
        provider["Properties"]["AutoScalingGroupProvider"]["AutoScalingGroupArn"]["Ref"],
        "MicroAsgAutoScalingGroup"
    );

    let associations = &compute["Resources"]["ClusterCapacityProviderAssociations"];
    assert_eq!(
        associations["Properties"]["CapacityProviders"][0]["Ref"],
        "MicroAsgAsgCapacityProvider"
    );
}

#[test]
fn test_load_balancer_group_admits_http_and_https() {
    let app = build();
    let compute = template(&app, "compute");
    let ingress = compute["Resources"]["LoadBalancerSecurityGroup"]["Properties"]
        ["SecurityGroupIngress"]
        .as_array()
        .unwrap();
    for port in [80, 443] {
        assert!(
            ingress.iter().any(|rule| rule["FromPort"] == port && rule["ToPort"] == port),
            "port {} not admitted",
            port
        );
    }
}

#[test]
fn test_instances_admit_load_balancer_traffic() {
    let app = build();
    let compute = template(&app, "compute");
    let ingress = compute["Resources"]["AutoScalingSecurityGroup"]["Properties"]
        ["SecurityGroupIngress"]
        .as_array()
        .unwrap();
    assert!(ingress.iter().any(|rule| {
        rule["IpProtocol"] == "-1"
            && rule["SourceSecurityGroupId"]["Fn::GetAtt"][0] == "LoadBalancerSecurityGroup"
    }));
    assert!(ingress.iter().any(|rule| rule["FromPort"] == 22));
}

#[test]
fn test_instance_user_data_targets_cluster() {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let app = build();
    let compute = template(&app, "compute");
    let encoded = compute["Resources"]["MicroAsgLaunchTemplate"]["Properties"]
        ["LaunchTemplateData"]["UserData"]
        .as_str()
        .unwrap();
    let script = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    assert!(script.contains("ECS_CLUSTER=DemoCluster"));
    assert!(script.contains("EBS_REGION=us-east-1"));
}

#[test]
fn test_http_redirects_when_certificate_present() {
    let app = build();
    let compute = template(&app, "compute");
    let action = &compute["Resources"]["HttpListener"]["Properties"]["DefaultActions"][0];
    assert_eq!(action["Type"], "redirect");
    assert_eq!(action["RedirectConfig"]["StatusCode"], "HTTP_301");
    assert_eq!(action["RedirectConfig"]["Host"], "#{host}");

    let https = &compute["Resources"]["HttpsListener"]["Properties"];
    assert_eq!(https["Port"], 443);
    assert_eq!(
        https["Certificates"][0]["CertificateArn"],
        "arn:aws:acm:us-east-1:111111111111:certificate/demo"
    );
}

#[test]
fn test_http_forwards_when_no_certificate() {
    let manifest_text = MANIFEST.replace(
        "    certificate_arn: arn:aws:acm:us-east-1:111111111111:certificate/demo\n",
        "",
    );
    let manifest = ManifestParser::parse(&manifest_text).unwrap();
    let app = build_app(&manifest, &Config::default(), Some("staging")).unwrap();

    let compute = template(&app, "compute");
    assert!(compute["Resources"]["HttpsListener"].is_null());
    let action = &compute["Resources"]["HttpListener"]["Properties"]["DefaultActions"][0];
    assert_eq!(action["Type"], "forward");
    assert_eq!(action["TargetGroupArn"]["Ref"], "DefaultTargetGroup");
}

#[test]
fn test_service_imports_compute_exports() {
    let app = build();
    let web = template(&app, "web");

    let service = &web["Resources"]["EcsService"]["Properties"];
    assert_eq!(service["Cluster"]["Fn::ImportValue"], "compute-ClusterName");
    assert_eq!(
        service["NetworkConfiguration"]["AwsvpcConfiguration"]["SecurityGroups"][0]
            ["Fn::ImportValue"],
        "compute-AsgSecurityGroupId"
    );

    let rule = &web["Resources"]["ListenerRule"]["Properties"];
    assert_eq!(rule["ListenerArn"]["Fn::ImportValue"], "compute-PrimaryListenerArn");
    assert_eq!(rule["Priority"], 10);
}

#[test]
fn test_network_override_applies_to_service_target_group() {
    let manifest_text = MANIFEST.replace(
        "  compute:\n    kind: compute\n",
        "  compute:\n    kind: compute\n    network:\n      vpc_id: vpc-override\n",
    );
    let manifest = ManifestParser::parse(&manifest_text).unwrap();
    let app = build_app(&manifest, &Config::default(), Some("staging")).unwrap();

    let compute = template(&app, "compute");
    assert_eq!(compute["Resources"]["DefaultTargetGroup"]["Properties"]["VpcId"], "vpc-override");
    assert_eq!(
        compute["Resources"]["LoadBalancerSecurityGroup"]["Properties"]["VpcId"],
        "vpc-override"
    );

    let web = template(&app, "web");
    assert_eq!(web["Resources"]["TargetGroup"]["Properties"]["VpcId"], "vpc-override");
}

#[test]
fn test_service_waits_for_listener_rule() {
    let app = build();
    let web = template(&app, "web");
    let depends = web["Resources"]["EcsService"]["DependsOn"].as_array().unwrap();
    assert!(depends.iter().any(|d| d == "ListenerRule"));
}

#[test]
fn test_service_discovery_registration() {
    let app = build();
    let web = template(&app, "web");

    let discovery = &web["Resources"]["DiscoveryService"]["Properties"];
    assert_eq!(discovery["DnsConfig"]["NamespaceId"]["Fn::ImportValue"], "compute-NamespaceId");
    assert_eq!(discovery["DnsConfig"]["DnsRecords"][0]["Type"], "A");
    assert_eq!(discovery["DnsConfig"]["DnsRecords"][0]["TTL"], 60);

    let registries = &web["Resources"]["EcsService"]["Properties"]["ServiceRegistries"];
    assert_eq!(registries[0]["RegistryArn"]["Fn::GetAtt"][0], "DiscoveryService");
}

#[test]
fn test_container_definition_carries_logging_and_health() {
    let app = build();
    let web = template(&app, "web");

    let container = &web["Resources"]["TaskDefinition"]["Properties"]["ContainerDefinitions"][0];
    assert_eq!(container["Name"], "web");
    assert_eq!(container["LogConfiguration"]["LogDriver"], "awslogs");
    assert_eq!(container["LogConfiguration"]["Options"]["awslogs-group"]["Ref"], "WebLogGroup");
    assert_eq!(container["HealthCheck"]["Command"][0], "CMD-SHELL");
    assert_eq!(container["Environment"][0]["Name"], "APP_ENV");

    assert_eq!(web["Resources"]["WebLogGroup"]["Properties"]["RetentionInDays"], 30);
}

#[test]
fn test_capacity_provider_strategy_on_service() {
    let app = build();
    let web = template(&app, "web");
    let strategy = &web["Resources"]["EcsService"]["Properties"]["CapacityProviderStrategy"][0];
    assert_eq!(strategy["CapacityProvider"], "MicroProvider");
    assert_eq!(strategy["Weight"], 1);
}

#[test]
fn test_missing_compute_section_fails() {
    let manifest_text = MANIFEST.replace("    load_balancer:\n      name: DemoLb\n", "");
    let err = ManifestParser::parse(&manifest_text).unwrap_err();
    assert!(matches!(err, StrataError::MissingSection { ref section, .. } if section == "load_balancer"));
}

#[test]
fn test_unknown_capacity_provider_fails() {
    let manifest_text = MANIFEST.replace("capacity_provider: MicroProvider", "capacity_provider: NoSuchProvider");
    let err = ManifestParser::parse(&manifest_text).unwrap_err();
    assert!(matches!(err, StrataError::UnknownCapacityProvider { .. }));
}

#[test]
fn test_unknown_target_fails() {
    let manifest = ManifestParser::parse(MANIFEST).unwrap();
    let err = build_app(&manifest, &Config::default(), Some("production")).unwrap_err();
    assert!(matches!(err, StrataError::UnknownTarget { ref target } if target == "production"));
}

#[test]
fn test_synth_writes_template_files() {
    let dir = TempDir::new().unwrap();
    let app = build();
    let written = app.synth(dir.path()).unwrap();

    assert!(dir.path().join("compute.template.json").exists());
    assert!(dir.path().join("web.template.json").exists());
    assert!(dir.path().join("manifest.json").exists());
    assert_eq!(written.len(), 2);

    let body = std::fs::read_to_string(dir.path().join("compute.template.json")).unwrap();
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["AWSTemplateFormatVersion"], "2010-09-09");
}
