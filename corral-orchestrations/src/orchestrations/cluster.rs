use tracing::Instrument;

use crate::activities;
use crate::context::OrchestrationContext;
use crate::error::{ClassifiedError, ErrorKind, Result};
use crate::names::orchestrations;
use crate::teardown::{spawn_cluster_teardown, TeardownHandle};

/// Start deleting a cluster.
///
/// A missing cluster is NotFound and a cluster that still runs services is a
/// Conflict; otherwise the teardown loop waits out draining container instances.
pub async fn delete_cluster(ctx: &OrchestrationContext, name: &str) -> Result<TeardownHandle> {
    async {
        let cluster = activities::cluster::describe_cluster(ctx, name).await?;
        let services = activities::cluster::list_service_names(ctx, name).await?;
        if !services.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::Conflict,
                format!(
                    "cluster {} still runs {} service(s): {}",
                    name,
                    services.len(),
                    services.join(", ")
                ),
            ));
        }

        tracing::info!(
            "Starting teardown of cluster {} ({} registered instance(s))",
            cluster.name,
            cluster.registered_instances_count
        );
        Ok(spawn_cluster_teardown(ctx, &cluster.name))
    }
    .instrument(ctx.span(orchestrations::DELETE_CLUSTER))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clients::{ClusterApi, ServiceApi, TaskTemplateApi};
    use crate::teardown::TeardownOutcome;
    use crate::testing::{cluster_spec, service_spec, setup, template_spec};

    #[tokio::test(start_paused = true)]
    async fn test_delete_cluster_waits_for_instances_to_drain() {
        let (platform, ctx) = setup();
        platform.create_cluster(&cluster_spec("batch")).await.unwrap();
        platform.script_instance_drain("batch", [2, 1, 0]);

        let handle = delete_cluster(&ctx, "batch").await.unwrap();

        assert_eq!(
            handle.wait(Duration::from_secs(600)).await,
            TeardownOutcome::Deleted
        );
        assert!(!platform.cluster_exists("batch"));
    }

    #[tokio::test]
    async fn test_delete_missing_cluster_is_not_found() {
        let (_platform, ctx) = setup();

        let err = delete_cluster(&ctx, "nope").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_cluster_with_services_is_a_conflict() {
        let (platform, ctx) = setup();
        platform.create_cluster(&cluster_spec("shared")).await.unwrap();
        platform.register(&template_spec("web")).await.unwrap();
        let mut spec = service_spec("web");
        spec.cluster = Some("shared".to_string());
        spec.task_template = Some("web:1".to_string());
        spec.network = Some(ctx.defaults().network.clone());
        platform.create_service(&spec).await.unwrap();

        let err = delete_cluster(&ctx, "shared").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(err.message.contains("web"));
        assert!(platform.cluster_exists("shared"));
    }
}
