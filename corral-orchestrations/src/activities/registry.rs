//! Service registry activities

use corral_models::{Namespace, RegistryEntry, RegistryEntrySpec};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn create_registry_entry(
    ctx: &OrchestrationContext,
    spec: &RegistryEntrySpec,
) -> Result<RegistryEntry> {
    tracing::info!(
        "Creating registry entry {} in namespace {}",
        spec.name,
        spec.namespace_id
    );
    let entry = ctx
        .call(
            ResourceType::RegistryEntry,
            &spec.name,
            ctx.clients().registry.create_entry(spec),
        )
        .await?;
    tracing::info!("Registry entry {} created ({})", entry.name, entry.id);
    Ok(entry)
}

/// `id` may be the entry id or its ARN
pub async fn get_registry_entry(ctx: &OrchestrationContext, id: &str) -> Result<RegistryEntry> {
    ctx.call(
        ResourceType::RegistryEntry,
        id,
        ctx.clients().registry.get_entry(id),
    )
    .await
}

pub async fn delete_registry_entry(ctx: &OrchestrationContext, id: &str) -> Result<()> {
    tracing::info!("Deleting registry entry {}", id);
    ctx.call(
        ResourceType::RegistryEntry,
        id,
        ctx.clients().registry.delete_entry(id),
    )
    .await
}

pub async fn get_namespace(ctx: &OrchestrationContext, id: &str) -> Result<Namespace> {
    ctx.call(
        ResourceType::Namespace,
        id,
        ctx.clients().registry.get_namespace(id),
    )
    .await
}
