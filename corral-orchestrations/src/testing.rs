//! Fixtures shared by the engine tests

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use corral_models::{
    ClusterSpec, CompositeServiceRequest, ContainerDefinition, CredentialSpec,
    NetworkConfiguration, RegistryEntrySpec, ServiceSpec, TaskTemplateSpec,
};

use crate::clients::PlatformClients;
use crate::context::{OrchestrationContext, OrchestrationPolicy, Tenant, TenantDefaults};
use crate::memory::MemoryPlatform;

pub(crate) const NAMESPACE_ID: &str = "ns-internal";

pub(crate) fn defaults() -> TenantDefaults {
    let mut defaults = TenantDefaults::new("acme");
    defaults.network = NetworkConfiguration {
        subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
        security_groups: vec!["sg-default".to_string()],
        assign_public_ip: false,
    };
    defaults
}

pub(crate) fn policy() -> OrchestrationPolicy {
    OrchestrationPolicy {
        retry_delay: Duration::from_millis(10),
        ..OrchestrationPolicy::default()
    }
}

pub(crate) fn setup() -> (Arc<MemoryPlatform>, OrchestrationContext) {
    let platform = Arc::new(MemoryPlatform::new());
    platform.add_namespace(NAMESPACE_ID, "internal.example");
    let tenant = Tenant::new(
        "acme",
        PlatformClients::from_platform(platform.clone()),
        defaults(),
    );
    let ctx = OrchestrationContext::new(Arc::new(tenant), policy());
    (platform, ctx)
}

pub(crate) fn cluster_spec(name: &str) -> ClusterSpec {
    ClusterSpec {
        name: name.to_string(),
        capacity_providers: vec!["FARGATE".to_string()],
        tags: Vec::new(),
    }
}

/// `app` pulls from a private registry, `proxy` does not
pub(crate) fn template_spec(family: &str) -> TaskTemplateSpec {
    let mut app = ContainerDefinition::new("app", "registry.example/web:1.4");
    app.port_mappings = vec![corral_models::PortMapping {
        container_port: 8080,
        host_port: None,
        protocol: "tcp".to_string(),
    }];
    TaskTemplateSpec {
        family: family.to_string(),
        cpu: "512".to_string(),
        memory: "1024".to_string(),
        network_mode: "awsvpc".to_string(),
        execution_role: Some("arn:corral:role/task-execution".to_string()),
        containers: vec![app, ContainerDefinition::new("proxy", "envoyproxy/envoy:v1.31")],
        tags: Vec::new(),
    }
}

pub(crate) fn credentials(container: &str, value: &str) -> BTreeMap<String, CredentialSpec> {
    BTreeMap::from([(
        container.to_string(),
        CredentialSpec {
            secret_string: value.to_string(),
            description: None,
        },
    )])
}

pub(crate) fn service_spec(name: &str) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        cluster: None,
        desired_count: 2,
        capacity_provider_strategy: Vec::new(),
        launch_type: Some("FARGATE".to_string()),
        network: None,
        task_template: None,
        registry_arns: Vec::new(),
        platform_version: None,
        tags: Vec::new(),
    }
}

/// New cluster, new two-container template with one credential, new registry entry
pub(crate) fn full_request() -> CompositeServiceRequest {
    CompositeServiceRequest {
        cluster: Some(cluster_spec("shared")),
        task_template: Some(template_spec("web")),
        service: Some(service_spec("web")),
        registry_entry: Some(RegistryEntrySpec {
            name: "web".to_string(),
            namespace_id: NAMESPACE_ID.to_string(),
            description: None,
            dns_ttl: 60,
            tags: Vec::new(),
        }),
        credentials: credentials("app", "registry-token-1"),
        tags: Vec::new(),
    }
}
