//! Eventual-consistency teardown loops.
//!
//! The remote platform refuses some deletes until earlier deletes have propagated: a
//! cluster cannot go while container instances are still deregistering, a registry
//! entry cannot go while instances are still registered with it. A teardown loop keeps
//! retrying such a delete in a spawned task, sleeping with capped exponential backoff
//! between attempts, until it succeeds, hits a non-retryable error, runs past the
//! policy deadline, or is cancelled.
//!
//! The loop reports at most once through a oneshot channel. A loop that ends without
//! reporting drops its sender, which the [`TeardownHandle`] turns into
//! [`TeardownOutcome::Unknown`].

use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::activities;
use crate::classify::{platform, registry};
use crate::context::OrchestrationContext;
use crate::error::{ClassifiedError, ResourceType, Result};
use crate::retry::jitter;

/// What a delete loop ended with
#[derive(Debug, Clone, PartialEq)]
pub enum TeardownOutcome {
    /// Deleted, or already gone
    Deleted,
    Failed(ClassifiedError),
    /// The loop ended without reporting: deadline, cancellation or an abandoned wait
    Unknown,
}

impl TeardownOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeardownOutcome::Deleted => "deleted",
            TeardownOutcome::Failed(_) => "failed",
            TeardownOutcome::Unknown => "unknown",
        }
    }
}

/// Report of one loop, as returned over the API
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TeardownReport {
    pub resource: String,
    pub id: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resources whose deletion needs a teardown loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownTarget {
    Cluster(String),
    RegistryEntry(String),
}

impl TeardownTarget {
    pub fn resource(&self) -> ResourceType {
        match self {
            TeardownTarget::Cluster(_) => ResourceType::Cluster,
            TeardownTarget::RegistryEntry(_) => ResourceType::RegistryEntry,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TeardownTarget::Cluster(id) | TeardownTarget::RegistryEntry(id) => id,
        }
    }

    /// Vendor codes meaning "not yet", as opposed to "never"
    fn retryable_codes(&self) -> &'static [&'static str] {
        match self {
            TeardownTarget::Cluster(_) => platform::CLUSTER_TEARDOWN_RETRYABLE,
            TeardownTarget::RegistryEntry(_) => registry::REGISTRY_TEARDOWN_RETRYABLE,
        }
    }

    fn is_retryable(&self, err: &ClassifiedError) -> bool {
        err.vendor_code()
            .is_some_and(|code| self.retryable_codes().contains(&code))
    }

    async fn attempt(&self, ctx: &OrchestrationContext) -> Result<()> {
        match self {
            TeardownTarget::Cluster(name) => {
                activities::cluster::delete_cluster(ctx, name).await?;
            }
            TeardownTarget::RegistryEntry(id) => {
                activities::registry::delete_registry_entry(ctx, id).await?;
            }
        }
        Ok(())
    }
}

/// Waiting side of a spawned teardown loop
#[derive(Debug)]
pub struct TeardownHandle {
    target: TeardownTarget,
    receiver: oneshot::Receiver<TeardownOutcome>,
    cancel: CancellationToken,
}

impl TeardownHandle {
    pub fn target(&self) -> &TeardownTarget {
        &self.target
    }

    /// Stop the loop; it exits without reporting
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait up to `timeout` for the loop's outcome.
    ///
    /// When the timeout fires first the loop is cancelled and the outcome is
    /// [`TeardownOutcome::Unknown`].
    pub async fn wait(mut self, timeout: Duration) -> TeardownOutcome {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => TeardownOutcome::Unknown,
            Err(_) => {
                tracing::warn!(
                    "Gave up waiting for {} {} after {:?}",
                    self.target.resource(),
                    self.target.id(),
                    timeout
                );
                self.cancel.cancel();
                TeardownOutcome::Unknown
            }
        }
    }

    /// [`wait`](Self::wait), shaped for the API response
    pub async fn report(self, timeout: Duration) -> TeardownReport {
        let resource = self.target.resource().to_string();
        let id = self.target.id().to_string();
        let outcome = self.wait(timeout).await;
        TeardownReport {
            resource,
            id,
            outcome: outcome.as_str(),
            error: match outcome {
                TeardownOutcome::Failed(e) => Some(e.to_string()),
                _ => None,
            },
        }
    }
}

pub fn spawn_cluster_teardown(ctx: &OrchestrationContext, name: &str) -> TeardownHandle {
    spawn_teardown(ctx, TeardownTarget::Cluster(name.to_string()))
}

pub fn spawn_registry_teardown(ctx: &OrchestrationContext, id: &str) -> TeardownHandle {
    spawn_teardown(ctx, TeardownTarget::RegistryEntry(id.to_string()))
}

/// Start a delete loop for `target` on its own task.
///
/// The loop is detached from the request's cancellation token; only the returned
/// handle and the policy deadline stop it.
pub fn spawn_teardown(ctx: &OrchestrationContext, target: TeardownTarget) -> TeardownHandle {
    let cancel = CancellationToken::new();
    let loop_ctx = ctx.detached().with_cancellation(cancel.clone());
    let deadline = ctx.policy().teardown_deadline;
    let (sender, receiver) = oneshot::channel();

    let span = tracing::info_span!(
        "teardown",
        resource = %target.resource(),
        id = %target.id(),
        tenant = %ctx.tenant_name(),
        request_id = %ctx.request_id(),
    );
    let loop_target = target.clone();
    tokio::spawn(
        async move {
            match tokio::time::timeout(deadline, run_teardown(&loop_target, &loop_ctx)).await {
                Ok(Some(outcome)) => {
                    // nobody listening is fine
                    let _ = sender.send(outcome);
                }
                Ok(None) => tracing::info!("Teardown cancelled"),
                Err(_) => tracing::warn!("Teardown abandoned after {:?}", deadline),
            }
        }
        .instrument(span),
    );

    TeardownHandle {
        target,
        receiver,
        cancel,
    }
}

/// `None` when cancelled
async fn run_teardown(
    target: &TeardownTarget,
    ctx: &OrchestrationContext,
) -> Option<TeardownOutcome> {
    let policy = ctx.policy();
    let mut backoff = policy.teardown_initial_backoff;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match target.attempt(ctx).await {
            Ok(()) => {
                tracing::info!("Deleted after {} attempt(s)", attempt);
                return Some(TeardownOutcome::Deleted);
            }
            Err(_) if ctx.is_cancelled() => return None,
            Err(e) if e.is_not_found() => {
                tracing::info!("Already gone");
                return Some(TeardownOutcome::Deleted);
            }
            Err(e) if target.is_retryable(&e) => {
                let pause = backoff + jitter(backoff);
                tracing::debug!(
                    "Attempt {} not yet possible ({}), retrying in {:?}",
                    attempt,
                    e,
                    pause
                );
                tokio::select! {
                    _ = ctx.cancellation_token().cancelled() => return None,
                    _ = tokio::time::sleep(pause) => {}
                }
                backoff = backoff.saturating_mul(2).min(policy.teardown_max_backoff);
            }
            Err(e) => {
                tracing::warn!("Teardown failed: {}", e);
                return Some(TeardownOutcome::Failed(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use corral_models::{ClusterSpec, RegistryEntrySpec};

    use crate::clients::{ClusterApi, PlatformClients, RegistryApi};
    use crate::context::{OrchestrationPolicy, Tenant, TenantDefaults};
    use crate::error::{ErrorKind, RemoteError};
    use crate::memory::{MemoryPlatform, Operation};

    fn context(platform: &Arc<MemoryPlatform>, policy: OrchestrationPolicy) -> OrchestrationContext {
        let tenant = Tenant::new(
            "acme",
            PlatformClients::from_platform(platform.clone()),
            TenantDefaults::new("acme"),
        );
        OrchestrationContext::new(Arc::new(tenant), policy)
    }

    async fn cluster(platform: &MemoryPlatform, name: &str) {
        platform
            .create_cluster(&ClusterSpec {
                name: name.to_string(),
                capacity_providers: Vec::new(),
                tags: Vec::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_teardown_converges_after_drain() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform, OrchestrationPolicy::default());
        cluster(&platform, "shared").await;
        platform.script_instance_drain("shared", [3, 1, 0]);

        let handle = spawn_cluster_teardown(&ctx, "shared");
        let outcome = handle.wait(Duration::from_secs(120)).await;

        assert_eq!(outcome, TeardownOutcome::Deleted);
        assert_eq!(platform.attempts(Operation::DeleteCluster), 3);
        assert!(!platform.cluster_exists("shared"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_converging_cluster_reports_unknown_at_deadline() {
        let platform = Arc::new(MemoryPlatform::new());
        let policy = OrchestrationPolicy {
            teardown_deadline: Duration::from_secs(30),
            ..OrchestrationPolicy::default()
        };
        let ctx = context(&platform, policy);
        cluster(&platform, "stuck").await;
        platform.set_registered_instances("stuck", 2);

        let start = tokio::time::Instant::now();
        let outcome = spawn_cluster_teardown(&ctx, "stuck")
            .wait(Duration::from_secs(600))
            .await;

        assert_eq!(outcome, TeardownOutcome::Unknown);
        assert!(start.elapsed() < Duration::from_secs(60));
        assert!(platform.cluster_exists("stuck"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_cancels_the_loop() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform, OrchestrationPolicy::default());
        cluster(&platform, "stuck").await;
        platform.set_registered_instances("stuck", 1);

        let outcome = spawn_cluster_teardown(&ctx, "stuck")
            .wait(Duration::from_secs(5))
            .await;
        let attempts = platform.attempts(Operation::DeleteCluster);
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(outcome, TeardownOutcome::Unknown);
        assert_eq!(platform.attempts(Operation::DeleteCluster), attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_resource_counts_as_deleted() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform, OrchestrationPolicy::default());

        let outcome = spawn_cluster_teardown(&ctx, "ghost")
            .wait(Duration::from_secs(10))
            .await;

        assert_eq!(outcome, TeardownOutcome::Deleted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_the_loop() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform, OrchestrationPolicy::default());
        cluster(&platform, "shared").await;
        platform.fail_next(
            Operation::DeleteCluster,
            RemoteError::vendor(platform::ACCESS_DENIED, "not allowed"),
        );

        let outcome = spawn_cluster_teardown(&ctx, "shared")
            .wait(Duration::from_secs(10))
            .await;

        match outcome {
            TeardownOutcome::Failed(e) => assert_eq!(e.kind, ErrorKind::Forbidden),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_entry_in_use_is_retried() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform, OrchestrationPolicy::default());
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
        platform.hold_registry_entry(&entry.id, 2);

        let report = spawn_registry_teardown(&ctx, &entry.arn)
            .report(Duration::from_secs(60))
            .await;

        assert_eq!(report.outcome, "deleted");
        assert_eq!(report.resource, "registry entry");
        assert_eq!(platform.attempts(Operation::DeleteRegistryEntry), 3);
        assert!(!platform.registry_entry_exists(&entry.id));
    }
}
