use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CapacityProviderStrategyItem, NetworkConfiguration, Tag, TaskTemplate};

/// Desired state of a long-running service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    /// Existing cluster name; ignored when the request also carries a cluster spec
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,
    #[serde(default)]
    pub capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub network: Option<NetworkConfiguration>,
    /// Existing `family:revision`; used when the request carries no template spec
    #[serde(default)]
    pub task_template: Option<String>,
    /// Existing registry entries to bind when no registry spec is supplied
    #[serde(default)]
    pub registry_arns: Vec<String>,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

fn default_desired_count() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Active,
    Draining,
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Primary,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloutState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deployment {
    pub id: String,
    pub status: DeploymentStatus,
    pub rollout_state: RolloutState,
    pub task_template: String,
    pub desired_count: u32,
    pub running_count: u32,
    pub pending_count: u32,
}

/// A service as reported by the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub arn: String,
    pub cluster: String,
    pub status: ServiceStatus,
    pub desired_count: u32,
    pub running_count: u32,
    pub pending_count: u32,
    /// `family:revision` the primary deployment runs
    pub task_template: String,
    #[serde(default)]
    pub registry_arns: Vec<String>,
    #[serde(default)]
    pub network: Option<NetworkConfiguration>,
    #[serde(default)]
    pub capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
}

/// Parameters of a service update call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceChanges {
    pub task_template: Option<String>,
    pub desired_count: Option<u32>,
    pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
    pub network: Option<NetworkConfiguration>,
    pub force_new_deployment: bool,
}

/// A service resolved together with the template it runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDetail {
    pub service: Service,
    pub task_template: TaskTemplate,
    /// `<registry-entry>.<namespace>` when the service is discoverable
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Parameters for launching one-off tasks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunTaskRequest {
    pub cluster: String,
    pub task_template: String,
    #[serde(default = "default_task_count")]
    pub count: u32,
    #[serde(default)]
    pub capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub network: Option<NetworkConfiguration>,
    #[serde(default)]
    pub started_by: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

fn default_task_count() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSummary {
    pub arn: String,
    pub cluster: String,
    pub task_template: String,
    pub last_status: String,
    pub desired_status: String,
    #[serde(default)]
    pub started_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
