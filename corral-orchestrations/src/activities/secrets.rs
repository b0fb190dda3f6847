//! Secret activities
//!
//! Secret values are passed through but never logged.

use corral_models::{SecretCreateSpec, SecretDeletion, SecretHandle, SecretSummary, Tag};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn create_secret(ctx: &OrchestrationContext, spec: &SecretCreateSpec) -> Result<SecretHandle> {
    tracing::info!("Creating secret {}", spec.name);
    let handle = ctx
        .call(
            ResourceType::Secret,
            &spec.name,
            ctx.clients().secrets.create_secret(spec),
        )
        .await?;
    tracing::debug!("Secret {} stored as {}", spec.name, handle.arn);
    Ok(handle)
}

pub async fn update_secret(
    ctx: &OrchestrationContext,
    id: &str,
    secret_string: &str,
) -> Result<SecretHandle> {
    tracing::info!("Rotating secret {}", id);
    ctx.call(
        ResourceType::Secret,
        id,
        ctx.clients().secrets.update_secret(id, secret_string),
    )
    .await
}

pub async fn delete_secret(
    ctx: &OrchestrationContext,
    id: &str,
    grace_window_days: u32,
) -> Result<SecretDeletion> {
    tracing::info!(
        "Deleting secret {} (recovery window: {} day(s))",
        id,
        grace_window_days
    );
    ctx.call(
        ResourceType::Secret,
        id,
        ctx.clients().secrets.delete_secret(id, grace_window_days),
    )
    .await
}

pub async fn describe_secret(ctx: &OrchestrationContext, id: &str) -> Result<SecretSummary> {
    ctx.call(
        ResourceType::Secret,
        id,
        ctx.clients().secrets.describe_secret(id),
    )
    .await
}

pub async fn list_secrets(ctx: &OrchestrationContext, filter: &[Tag]) -> Result<Vec<SecretSummary>> {
    ctx.call(
        ResourceType::Secret,
        "*",
        ctx.clients().secrets.list_secrets(filter),
    )
    .await
}
