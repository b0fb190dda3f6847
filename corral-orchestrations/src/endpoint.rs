//! Registry entry → DNS name resolution

use corral_models::Service;

use crate::activities;
use crate::context::OrchestrationContext;
use crate::error::Result;

/// Resolve `<entry-name>.<namespace-name>` for a registry entry id or ARN.
///
/// An entry without a namespace has no endpoint.
pub async fn resolve_endpoint(ctx: &OrchestrationContext, entry: &str) -> Result<Option<String>> {
    let entry = activities::registry::get_registry_entry(ctx, entry).await?;
    let Some(namespace_id) = entry.namespace_id.as_deref() else {
        return Ok(None);
    };

    let namespace = activities::registry::get_namespace(ctx, namespace_id).await?;
    Ok(Some(format!("{}.{}", entry.name, namespace.name)))
}

/// Endpoint of the first registry binding of `service`.
///
/// Lookup failures are logged and reported as no endpoint.
pub async fn service_endpoint(ctx: &OrchestrationContext, service: &Service) -> Option<String> {
    let entry = service.registry_arns.first()?;
    match resolve_endpoint(ctx, entry).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::warn!("Could not resolve endpoint of service {}: {}", service.name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use corral_models::{RegistryEntry, RegistryEntrySpec};

    use crate::clients::{PlatformClients, RegistryApi};
    use crate::context::{OrchestrationPolicy, Tenant, TenantDefaults};
    use crate::error::ErrorKind;
    use crate::memory::MemoryPlatform;

    fn context(platform: &Arc<MemoryPlatform>) -> OrchestrationContext {
        let tenant = Tenant::new(
            "acme",
            PlatformClients::from_platform(platform.clone()),
            TenantDefaults::new("acme"),
        );
        OrchestrationContext::new(Arc::new(tenant), OrchestrationPolicy::default())
    }

    #[tokio::test]
    async fn test_endpoint_joins_entry_and_namespace() {
        let platform = Arc::new(MemoryPlatform::new());
        platform.add_namespace("ns-1", "internal.example");
        let entry = platform
            .create_entry(&RegistryEntrySpec {
                name: "web".to_string(),
                namespace_id: "ns-1".to_string(),
                description: None,
                dns_ttl: 60,
                tags: Vec::new(),
            })
            .await
            .unwrap();

        let endpoint = resolve_endpoint(&context(&platform), &entry.arn).await.unwrap();

        assert_eq!(endpoint.as_deref(), Some("web.internal.example"));
    }

    #[tokio::test]
    async fn test_entry_without_namespace_has_no_endpoint() {
        let platform = Arc::new(MemoryPlatform::new());
        platform.insert_registry_entry(RegistryEntry {
            id: "srv-orphan".to_string(),
            arn: "arn:corral:registry/srv-orphan".to_string(),
            name: "orphan".to_string(),
            namespace_id: None,
            description: None,
        });

        let endpoint = resolve_endpoint(&context(&platform), "srv-orphan").await.unwrap();

        assert_eq!(endpoint, None);
    }

    #[tokio::test]
    async fn test_missing_entry_is_classified() {
        let platform = Arc::new(MemoryPlatform::new());

        let err = resolve_endpoint(&context(&platform), "srv-missing")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("srv-missing"));
    }
}
