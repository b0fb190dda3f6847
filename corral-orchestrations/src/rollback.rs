//! Compensation for partially applied plans.
//!
//! Every successful plan step pushes the action that undoes it. When a later step
//! fails, [`RollbackStack::unwind`] runs the actions newest first. Compensating
//! actions never see the request's cancellation token and each one is bounded by
//! [`OrchestrationPolicy::rollback_step_timeout`]; their own failures are logged and
//! skipped so the original error is the one surfaced.
//!
//! [`OrchestrationPolicy::rollback_step_timeout`]: crate::context::OrchestrationPolicy

use serde::Serialize;

use crate::activities;
use crate::context::OrchestrationContext;
use crate::error::{ClassifiedError, ResourceType, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RollbackAction {
    DeleteCluster { name: String },
    /// Deleted without a recovery window: the secret never served a live revision
    DeleteSecret { arn: String },
    DeregisterTaskTemplate { id: String },
    DeleteRegistryEntry { id: String },
    DeleteService { cluster: String, name: String },
}

impl RollbackAction {
    fn target(&self) -> (ResourceType, String) {
        match self {
            RollbackAction::DeleteCluster { name } => (ResourceType::Cluster, name.clone()),
            RollbackAction::DeleteSecret { arn } => (ResourceType::Secret, arn.clone()),
            RollbackAction::DeregisterTaskTemplate { id } => {
                (ResourceType::TaskTemplate, id.clone())
            }
            RollbackAction::DeleteRegistryEntry { id } => {
                (ResourceType::RegistryEntry, id.clone())
            }
            RollbackAction::DeleteService { cluster, name } => {
                (ResourceType::Service, format!("{}/{}", cluster, name))
            }
        }
    }

    async fn compensate(&self, ctx: &OrchestrationContext) -> Result<()> {
        match self {
            RollbackAction::DeleteCluster { name } => {
                activities::cluster::delete_cluster(ctx, name).await?;
            }
            RollbackAction::DeleteSecret { arn } => {
                activities::secrets::delete_secret(ctx, arn, 0).await?;
            }
            RollbackAction::DeregisterTaskTemplate { id } => {
                activities::task_template::deregister_task_template(ctx, id).await?;
            }
            RollbackAction::DeleteRegistryEntry { id } => {
                activities::registry::delete_registry_entry(ctx, id).await?;
            }
            RollbackAction::DeleteService { cluster, name } => {
                activities::service::delete_service(ctx, cluster, name, true).await?;
            }
        }
        Ok(())
    }
}

/// Compensating actions of one request, oldest first
#[derive(Debug, Default, Serialize)]
pub struct RollbackStack {
    actions: Vec<RollbackAction>,
}

impl RollbackStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: RollbackAction) {
        tracing::debug!("Rollback step recorded: {:?}", action);
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[RollbackAction] {
        &self.actions
    }

    /// Forget every recorded action; the plan's effects are now permanent
    pub fn commit(&mut self) {
        self.actions.clear();
    }

    /// Run every recorded action, newest first, and leave the stack empty.
    ///
    /// Returns the actions that could not be compensated.
    pub async fn unwind(
        &mut self,
        ctx: &OrchestrationContext,
    ) -> Vec<(RollbackAction, ClassifiedError)> {
        if self.actions.is_empty() {
            return Vec::new();
        }

        let detached = ctx.detached();
        let step_timeout = detached.policy().rollback_step_timeout;
        let mut failures = Vec::new();

        tracing::info!("Rolling back {} step(s)", self.actions.len());
        while let Some(action) = self.actions.pop() {
            let (resource, id) = action.target();
            let result = match tokio::time::timeout(step_timeout, action.compensate(&detached)).await
            {
                Ok(result) => result,
                Err(_) => Err(ClassifiedError::timed_out(resource, &id)),
            };

            match result {
                Ok(()) => tracing::info!("Rolled back {} {}", resource, id),
                Err(e) => {
                    tracing::warn!("Rollback of {} {} failed: {}", resource, id, e);
                    failures.push((action, e));
                }
            }
        }

        if failures.is_empty() {
            tracing::info!("Rollback complete");
        } else {
            tracing::warn!("Rollback finished with {} failure(s)", failures.len());
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use corral_models::{ClusterSpec, SecretCreateSpec};
    use tokio_util::sync::CancellationToken;

    use crate::clients::{ClusterApi, PlatformClients, SecretApi};
    use crate::context::{OrchestrationPolicy, Tenant, TenantDefaults};
    use crate::error::RemoteError;
    use crate::memory::{MemoryPlatform, Operation};

    fn context(platform: &Arc<MemoryPlatform>) -> OrchestrationContext {
        let tenant = Tenant::new(
            "acme",
            PlatformClients::from_platform(platform.clone()),
            TenantDefaults::new("acme"),
        );
        OrchestrationContext::new(Arc::new(tenant), OrchestrationPolicy::default())
    }

    async fn seed(platform: &MemoryPlatform) -> String {
        platform
            .create_cluster(&ClusterSpec {
                name: "shared".to_string(),
                capacity_providers: Vec::new(),
                tags: Vec::new(),
            })
            .await
            .unwrap();
        platform
            .create_secret(&SecretCreateSpec {
                name: "corral/shared/web/app".to_string(),
                secret_string: "hunter2".to_string(),
                description: None,
                tags: Vec::new(),
            })
            .await
            .unwrap()
            .arn
    }

    #[tokio::test]
    async fn test_unwind_runs_newest_first_and_drains() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform);
        let arn = seed(&platform).await;

        let mut stack = RollbackStack::new();
        stack.push(RollbackAction::DeleteCluster {
            name: "shared".to_string(),
        });
        stack.push(RollbackAction::DeleteSecret { arn: arn.clone() });

        let failures = stack.unwind(&ctx).await;

        assert!(failures.is_empty());
        assert!(stack.is_empty());
        let journal = platform.journal();
        assert_eq!(
            &journal[2..],
            &[format!("delete_secret:{}", arn), "delete_cluster:shared".to_string()]
        );

        // second unwind has nothing left to do
        assert!(stack.unwind(&ctx).await.is_empty());
        assert_eq!(platform.journal().len(), journal.len());
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported_and_skipped() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform);
        let arn = seed(&platform).await;
        platform.fail_next(
            Operation::DeleteSecret,
            RemoteError::vendor("InternalServiceError", "try later"),
        );

        let mut stack = RollbackStack::new();
        stack.push(RollbackAction::DeleteCluster {
            name: "shared".to_string(),
        });
        stack.push(RollbackAction::DeleteSecret { arn });

        let failures = stack.unwind(&ctx).await;

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].0, RollbackAction::DeleteSecret { .. }));
        assert!(!platform.cluster_exists("shared"));
    }

    #[tokio::test]
    async fn test_unwind_ignores_request_cancellation() {
        let platform = Arc::new(MemoryPlatform::new());
        let token = CancellationToken::new();
        let ctx = context(&platform).with_cancellation(token.clone());
        seed(&platform).await;
        token.cancel();

        let mut stack = RollbackStack::new();
        stack.push(RollbackAction::DeleteCluster {
            name: "shared".to_string(),
        });

        assert!(stack.unwind(&ctx).await.is_empty());
        assert!(!platform.cluster_exists("shared"));
    }

    #[test]
    fn test_actions_serialize_tagged() {
        let action = RollbackAction::DeleteService {
            cluster: "shared".to_string(),
            name: "web".to_string(),
        };

        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["action"], "delete_service");
        assert_eq!(json["cluster"], "shared");
    }
}
