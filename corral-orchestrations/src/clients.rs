//! Remote platform client interfaces
//!
//! One trait per remote API. Implementations are thin request/response wrappers;
//! every method reports failures as [`RemoteError`] and leaves classification to
//! [`crate::classify`].

use std::sync::Arc;

use async_trait::async_trait;
use corral_models::{
    Cluster, ClusterSpec, LogPage, LogQuery, Namespace, Parameter, ParameterSpec,
    RegistryEntry, RegistryEntrySpec, RunTaskRequest, SecretCreateSpec, SecretDeletion,
    SecretHandle, SecretSummary, Service, ServiceChanges, ServiceSpec, Tag, TaskSummary,
    TaskTemplate, TaskTemplateSpec,
};

use crate::error::RemoteError;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_cluster(&self, spec: &ClusterSpec) -> RemoteResult<Cluster>;

    async fn describe_cluster(&self, name: &str) -> RemoteResult<Cluster>;

    /// Fails while the cluster still has instances, services or tasks registered
    async fn delete_cluster(&self, name: &str) -> RemoteResult<Cluster>;

    /// Names of the active services in the cluster
    async fn list_service_names(&self, cluster: &str) -> RemoteResult<Vec<String>>;
}

#[async_trait]
pub trait TaskTemplateApi: Send + Sync {
    /// Register a new revision of `spec.family`
    async fn register(&self, spec: &TaskTemplateSpec) -> RemoteResult<TaskTemplate>;

    /// Describe `family:revision`, or the latest active revision of `family`
    async fn describe(&self, id: &str) -> RemoteResult<TaskTemplate>;

    async fn deregister(&self, id: &str) -> RemoteResult<TaskTemplate>;

    /// `family:revision` identifiers of active revisions, oldest first
    async fn list_revisions(&self, family: &str) -> RemoteResult<Vec<String>>;

    async fn tag(&self, id: &str, tags: &[Tag]) -> RemoteResult<()>;

    async fn run_task(&self, request: &RunTaskRequest) -> RemoteResult<Vec<TaskSummary>>;
}

#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// `spec.cluster` and `spec.task_template` are fully resolved by the caller
    async fn create_service(&self, spec: &ServiceSpec) -> RemoteResult<Service>;

    async fn update_service(
        &self,
        cluster: &str,
        name: &str,
        changes: &ServiceChanges,
    ) -> RemoteResult<Service>;

    async fn delete_service(&self, cluster: &str, name: &str, force: bool)
        -> RemoteResult<Service>;

    async fn describe_service(&self, cluster: &str, name: &str) -> RemoteResult<Service>;

    async fn list_services(&self, cluster: &str) -> RemoteResult<Vec<Service>>;

    async fn tag_service(&self, cluster: &str, name: &str, tags: &[Tag]) -> RemoteResult<()>;
}

#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn create_entry(&self, spec: &RegistryEntrySpec) -> RemoteResult<RegistryEntry>;

    /// Look up by id or ARN
    async fn get_entry(&self, id: &str) -> RemoteResult<RegistryEntry>;

    /// Fails while the entry still has registered instances
    async fn delete_entry(&self, id: &str) -> RemoteResult<()>;

    async fn get_namespace(&self, id: &str) -> RemoteResult<Namespace>;
}

#[async_trait]
pub trait SecretApi: Send + Sync {
    async fn create_secret(&self, spec: &SecretCreateSpec) -> RemoteResult<SecretHandle>;

    /// Store a new value at an existing secret
    async fn update_secret(&self, id: &str, secret_string: &str) -> RemoteResult<SecretHandle>;

    /// `grace_window_days == 0` deletes without a recovery window
    async fn delete_secret(&self, id: &str, grace_window_days: u32)
        -> RemoteResult<SecretDeletion>;

    async fn describe_secret(&self, id: &str) -> RemoteResult<SecretSummary>;

    /// Secrets carrying every tag in `filter`
    async fn list_secrets(&self, filter: &[Tag]) -> RemoteResult<Vec<SecretSummary>>;
}

#[async_trait]
pub trait ParameterApi: Send + Sync {
    async fn put_parameter(&self, spec: &ParameterSpec, overwrite: bool)
        -> RemoteResult<Parameter>;

    async fn get_parameter(&self, name: &str) -> RemoteResult<Parameter>;

    async fn delete_parameter(&self, name: &str) -> RemoteResult<()>;

    async fn list_parameters(&self, prefix: &str) -> RemoteResult<Vec<Parameter>>;
}

#[async_trait]
pub trait LogEventApi: Send + Sync {
    async fn get_log_events(&self, query: &LogQuery) -> RemoteResult<LogPage>;
}

/// The remote clients of one tenant
#[derive(Clone)]
pub struct PlatformClients {
    pub clusters: Arc<dyn ClusterApi>,
    pub task_templates: Arc<dyn TaskTemplateApi>,
    pub services: Arc<dyn ServiceApi>,
    pub registry: Arc<dyn RegistryApi>,
    pub secrets: Arc<dyn SecretApi>,
    pub parameters: Arc<dyn ParameterApi>,
    pub logs: Arc<dyn LogEventApi>,
}

impl PlatformClients {
    /// Use one object for every API
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: ClusterApi
            + TaskTemplateApi
            + ServiceApi
            + RegistryApi
            + SecretApi
            + ParameterApi
            + LogEventApi
            + 'static,
    {
        Self {
            clusters: platform.clone(),
            task_templates: platform.clone(),
            services: platform.clone(),
            registry: platform.clone(),
            secrets: platform.clone(),
            parameters: platform.clone(),
            logs: platform,
        }
    }
}
