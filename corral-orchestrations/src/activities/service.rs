//! Service activities
//!
//! Services are identified as `<cluster>/<name>` in error messages.

use corral_models::{Service, ServiceChanges, ServiceSpec, Tag};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

fn service_id(cluster: &str, name: &str) -> String {
    format!("{}/{}", cluster, name)
}

pub async fn create_service(ctx: &OrchestrationContext, spec: &ServiceSpec) -> Result<Service> {
    let cluster = spec.cluster.as_deref().unwrap_or_default();
    let id = service_id(cluster, &spec.name);
    tracing::info!("Creating service {}", id);
    let service = ctx
        .call(
            ResourceType::Service,
            &id,
            ctx.clients().services.create_service(spec),
        )
        .await?;
    tracing::info!("Service {} created ({})", id, service.arn);
    Ok(service)
}

pub async fn update_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    changes: &ServiceChanges,
) -> Result<Service> {
    let id = service_id(cluster, name);
    tracing::info!("Updating service {}", id);
    ctx.call(
        ResourceType::Service,
        &id,
        ctx.clients().services.update_service(cluster, name, changes),
    )
    .await
}

pub async fn delete_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    force: bool,
) -> Result<Service> {
    let id = service_id(cluster, name);
    tracing::info!("Deleting service {} (force: {})", id, force);
    ctx.call(
        ResourceType::Service,
        &id,
        ctx.clients().services.delete_service(cluster, name, force),
    )
    .await
}

pub async fn describe_service(ctx: &OrchestrationContext, cluster: &str, name: &str) -> Result<Service> {
    ctx.call(
        ResourceType::Service,
        &service_id(cluster, name),
        ctx.clients().services.describe_service(cluster, name),
    )
    .await
}

pub async fn list_services(ctx: &OrchestrationContext, cluster: &str) -> Result<Vec<Service>> {
    ctx.call(
        ResourceType::Cluster,
        cluster,
        ctx.clients().services.list_services(cluster),
    )
    .await
}

pub async fn tag_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    tags: &[Tag],
) -> Result<()> {
    ctx.call(
        ResourceType::Service,
        &service_id(cluster, name),
        ctx.clients().services.tag_service(cluster, name, tags),
    )
    .await
}
