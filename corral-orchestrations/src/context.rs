//! Per-request orchestration context and the tenant map it is built from

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use corral_models::{NetworkConfiguration, Tag};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::classify::classify;
use crate::clients::{PlatformClients, RemoteResult};
use crate::error::{ClassifiedError, ResourceType, Result};

/// Tag key marking resources this system created for a tenant
pub const OWNERSHIP_TAG: &str = "corral:org";

/// Values a tenant falls back to when a request omits them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantDefaults {
    /// Organisation written into the ownership tag
    pub org: String,
    #[serde(default)]
    pub network: NetworkConfiguration,
    /// Secrets are named `<prefix>/<cluster>/<family>/<container>`
    #[serde(default = "default_secret_prefix")]
    pub secret_prefix: String,
    /// Recovery window when deleting credential secrets
    #[serde(default = "default_secret_grace_days")]
    pub secret_grace_days: u32,
}

fn default_secret_prefix() -> String {
    "corral".to_string()
}

fn default_secret_grace_days() -> u32 {
    7
}

impl TenantDefaults {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            network: NetworkConfiguration::default(),
            secret_prefix: default_secret_prefix(),
            secret_grace_days: default_secret_grace_days(),
        }
    }

    pub fn ownership_tag(&self) -> Tag {
        Tag::new(OWNERSHIP_TAG, &self.org)
    }

    /// Fill the parts of `requested` that were left empty
    pub fn resolve_network(&self, requested: Option<&NetworkConfiguration>) -> NetworkConfiguration {
        match requested {
            None => self.network.clone(),
            Some(net) => NetworkConfiguration {
                subnets: if net.subnets.is_empty() {
                    self.network.subnets.clone()
                } else {
                    net.subnets.clone()
                },
                security_groups: if net.security_groups.is_empty() {
                    self.network.security_groups.clone()
                } else {
                    net.security_groups.clone()
                },
                assign_public_ip: net.assign_public_ip,
            },
        }
    }
}

/// One account: its remote clients and defaults, fixed at startup
pub struct Tenant {
    pub name: String,
    pub clients: PlatformClients,
    pub defaults: TenantDefaults,
}

impl Tenant {
    pub fn new(name: impl Into<String>, clients: PlatformClients, defaults: TenantDefaults) -> Self {
        Self {
            name: name.into(),
            clients,
            defaults,
        }
    }
}

/// Read-only map of tenants, built once and shared by every request
#[derive(Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, Arc<Tenant>>,
}

impl TenantRegistry {
    pub fn builder() -> TenantRegistryBuilder {
        TenantRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tenant>> {
        self.tenants.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tenants.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[derive(Default)]
pub struct TenantRegistryBuilder {
    tenants: HashMap<String, Arc<Tenant>>,
}

impl TenantRegistryBuilder {
    pub fn tenant(mut self, tenant: Tenant) -> Self {
        self.tenants.insert(tenant.name.clone(), Arc::new(tenant));
        self
    }

    pub fn build(self) -> TenantRegistry {
        TenantRegistry {
            tenants: self.tenants,
        }
    }
}

/// Timing knobs of the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestrationPolicy {
    /// Attempts for steps wrapped in the retry primitive
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    /// First sleep of a teardown loop; doubles every iteration
    pub teardown_initial_backoff: Duration,
    pub teardown_max_backoff: Duration,
    /// Teardown loops are abandoned after this long
    pub teardown_deadline: Duration,
    /// Upper bound for each compensating action
    pub rollback_step_timeout: Duration,
}

impl Default for OrchestrationPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 5,
            retry_delay: Duration::from_millis(500),
            teardown_initial_backoff: Duration::from_secs(1),
            teardown_max_backoff: Duration::from_secs(60),
            teardown_deadline: Duration::from_secs(15 * 60),
            rollback_step_timeout: Duration::from_secs(60),
        }
    }
}

/// Everything one orchestration call needs: the tenant's clients and defaults,
/// timing policy, and the request's cancellation token.
#[derive(Clone)]
pub struct OrchestrationContext {
    tenant: Arc<Tenant>,
    policy: OrchestrationPolicy,
    cancel: CancellationToken,
    request_id: Uuid,
}

impl OrchestrationContext {
    pub fn new(tenant: Arc<Tenant>, policy: OrchestrationPolicy) -> Self {
        Self {
            tenant,
            policy,
            cancel: CancellationToken::new(),
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant.name
    }

    pub fn clients(&self) -> &PlatformClients {
        &self.tenant.clients
    }

    pub fn defaults(&self) -> &TenantDefaults {
        &self.tenant.defaults
    }

    pub fn policy(&self) -> &OrchestrationPolicy {
        &self.policy
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Same tenant and request, but immune to the request's cancellation.
    /// Compensating actions run on this.
    pub fn detached(&self) -> Self {
        Self {
            tenant: self.tenant.clone(),
            policy: self.policy.clone(),
            cancel: CancellationToken::new(),
            request_id: self.request_id,
        }
    }

    pub fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!(
            "orchestration",
            operation,
            tenant = %self.tenant.name,
            request_id = %self.request_id,
        )
    }

    /// Run one remote call: abort it on cancellation and classify its failure
    pub async fn call<T, F>(&self, resource: ResourceType, id: &str, fut: F) -> Result<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ClassifiedError::cancelled(resource, id));
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClassifiedError::cancelled(resource, id)),
            result = fut => result.map_err(|e| classify(resource, id, e)),
        }
    }
}
