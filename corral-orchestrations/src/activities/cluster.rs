//! Cluster activities

use corral_models::{Cluster, ClusterSpec};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn create_cluster(ctx: &OrchestrationContext, spec: &ClusterSpec) -> Result<Cluster> {
    tracing::info!("Creating cluster {}", spec.name);
    let cluster = ctx
        .call(
            ResourceType::Cluster,
            &spec.name,
            ctx.clients().clusters.create_cluster(spec),
        )
        .await?;
    tracing::info!("Cluster {} created ({})", cluster.name, cluster.arn);
    Ok(cluster)
}

pub async fn describe_cluster(ctx: &OrchestrationContext, name: &str) -> Result<Cluster> {
    ctx.call(
        ResourceType::Cluster,
        name,
        ctx.clients().clusters.describe_cluster(name),
    )
    .await
}

/// Single delete attempt; the remote rejects it while the cluster is not empty
pub async fn delete_cluster(ctx: &OrchestrationContext, name: &str) -> Result<Cluster> {
    tracing::info!("Deleting cluster {}", name);
    ctx.call(
        ResourceType::Cluster,
        name,
        ctx.clients().clusters.delete_cluster(name),
    )
    .await
}

pub async fn list_service_names(ctx: &OrchestrationContext, cluster: &str) -> Result<Vec<String>> {
    ctx.call(
        ResourceType::Cluster,
        cluster,
        ctx.clients().clusters.list_service_names(cluster),
    )
    .await
}
