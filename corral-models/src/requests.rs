//! Composite request and response bodies of the management API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    CapacityProviderStrategyItem, ClusterSpec, CredentialSpec, NetworkConfiguration,
    RegistryEntrySpec, ServiceSpec, Tag, TaskTemplate, TaskTemplateSpec,
};

/// Desired composite service.
///
/// Every sub-specification is optional: a populated field means "create it", an
/// absent one means "reference the existing resource named in `service`".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompositeServiceRequest {
    #[serde(default)]
    pub cluster: Option<ClusterSpec>,
    #[serde(default)]
    pub task_template: Option<TaskTemplateSpec>,
    #[serde(default)]
    pub service: Option<ServiceSpec>,
    #[serde(default)]
    pub registry_entry: Option<RegistryEntrySpec>,
    /// Container name -> registry credential to store for it
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialSpec>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Changes to apply to a running service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceUpdateRequest {
    /// New template revision to register and deploy
    #[serde(default)]
    pub task_template: Option<TaskTemplateSpec>,
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialSpec>,
    #[serde(default)]
    pub desired_count: Option<u32>,
    #[serde(default)]
    pub capacity_provider_strategy: Option<Vec<CapacityProviderStrategyItem>>,
    #[serde(default)]
    pub network: Option<NetworkConfiguration>,
    #[serde(default)]
    pub force_new_deployment: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Task template registration, optionally with the cluster it will run on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompositeTaskTemplateRequest {
    #[serde(default)]
    pub cluster: Option<ClusterSpec>,
    pub task_template: TaskTemplateSpec,
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialSpec>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// New revision of an existing family
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTemplateUpdateRequest {
    /// Replacement definition; absent means "re-register the latest revision"
    #[serde(default)]
    pub task_template: Option<TaskTemplateSpec>,
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialSpec>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTemplateDetail {
    pub task_template: TaskTemplate,
    /// Container name -> ARN of its credential secret
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

impl TaskTemplateDetail {
    pub fn new(task_template: TaskTemplate) -> Self {
        let credentials = task_template
            .containers
            .iter()
            .filter_map(|c| c.credentials_arn().map(|arn| (c.name.clone(), arn.to_string())))
            .collect();
        Self {
            task_template,
            credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_request_fields_are_optional() {
        let request: CompositeServiceRequest = serde_json::from_str(
            r#"{"service":{"name":"web","cluster":"shared","task_template":"web:4"}}"#,
        )
        .unwrap();

        assert!(request.cluster.is_none());
        assert!(request.task_template.is_none());
        assert!(request.credentials.is_empty());
        let service = request.service.unwrap();
        assert_eq!(service.desired_count, 1);
        assert_eq!(service.task_template.as_deref(), Some("web:4"));
    }
}
