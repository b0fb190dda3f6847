//! Shared data model for the Corral management API.
//!
//! Types here are plain serde structs used by the orchestration engine, the HTTP
//! boundary and the CLI alike. Remote records (`Cluster`, `TaskTemplate`, `Service`,
//! ...) mirror what the container platform reports; `*Spec` and `*Request` types are
//! what clients send.

mod cluster;
mod logs;
mod parameters;
mod registry;
mod requests;
mod secrets;
mod service;
mod task_template;

pub use cluster::*;
pub use logs::*;
pub use parameters::*;
pub use registry::*;
pub use requests::*;
pub use secrets::*;
pub use service::*;
pub use task_template::*;

use serde::{Deserialize, Serialize};

/// Key/value tag attached to remote resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Merge `extra` into `base`, replacing values of keys that already exist.
pub fn merge_tags(base: &[Tag], extra: &[Tag]) -> Vec<Tag> {
    let mut merged: Vec<Tag> = base.to_vec();
    for tag in extra {
        match merged.iter_mut().find(|t| t.key == tag.key) {
            Some(existing) => existing.value = tag.value.clone(),
            None => merged.push(tag.clone()),
        }
    }
    merged
}

/// Subnet / security group placement for tasks and services
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfiguration {
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// One entry of a capacity-provider strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapacityProviderStrategyItem {
    pub capacity_provider: String,
    #[serde(default)]
    pub base: u32,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}
