//! Input and output types for Corral orchestrations

use std::collections::BTreeMap;

use corral_models::{
    merge_tags, ClusterSpec, CompositeServiceRequest, CredentialSpec, RegistryEntrySpec,
    Service, ServiceSpec, Tag, TaskTemplate, TaskTemplateSpec,
};
use serde::Serialize;

use crate::context::TenantDefaults;
use crate::credentials::validate_credentials;
use crate::error::{ClassifiedError, Result};
use crate::teardown::TeardownHandle;

// ============================================================================
// Create Service Orchestration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ClusterIntent {
    CreateNew(ClusterSpec),
    Existing { name: String },
}

impl ClusterIntent {
    pub fn name(&self) -> &str {
        match self {
            ClusterIntent::CreateNew(spec) => &spec.name,
            ClusterIntent::Existing { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum TemplateIntent {
    CreateNew(TaskTemplateSpec),
    /// `family:revision` or a bare family
    Existing { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum RegistryIntent {
    CreateNew(RegistryEntrySpec),
    Existing { arns: Vec<String> },
    None,
}

/// A validated create request.
///
/// Building one performs every check that does not need the remote platform, so an
/// invalid request never causes a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServicePlan {
    pub cluster: ClusterIntent,
    pub template: TemplateIntent,
    pub registry: RegistryIntent,
    #[serde(skip)]
    pub credentials: BTreeMap<String, CredentialSpec>,
    /// Service fields other than cluster, template and registry bindings
    pub service: ServiceSpec,
    /// Request tags plus the tenant ownership tag
    pub tags: Vec<Tag>,
}

impl ServicePlan {
    pub fn from_request(
        request: CompositeServiceRequest,
        defaults: &TenantDefaults,
    ) -> Result<Self> {
        let CompositeServiceRequest {
            cluster,
            task_template,
            service,
            registry_entry,
            credentials,
            tags,
        } = request;

        let Some(mut service) = service else {
            return Err(ClassifiedError::bad_request("a service spec is required"));
        };
        if service.name.trim().is_empty() {
            return Err(ClassifiedError::bad_request("service name must not be empty"));
        }
        let tags = merge_tags(&tags, &[defaults.ownership_tag()]);

        let cluster = match (cluster, service.cluster.take()) {
            (Some(spec), Some(named)) if spec.name != named => {
                return Err(ClassifiedError::bad_request(format!(
                    "service {}: cluster spec {} does not match service cluster {}",
                    service.name, spec.name, named
                )))
            }
            (Some(mut spec), _) => {
                if spec.name.trim().is_empty() {
                    return Err(ClassifiedError::bad_request("cluster name must not be empty"));
                }
                spec.tags = merge_tags(&spec.tags, &tags);
                ClusterIntent::CreateNew(spec)
            }
            (None, Some(name)) => ClusterIntent::Existing { name },
            (None, None) => {
                return Err(ClassifiedError::bad_request(format!(
                    "service {}: either a cluster spec or service.cluster is required",
                    service.name
                )))
            }
        };

        let template = match (task_template, service.task_template.take()) {
            (Some(_), Some(id)) => {
                return Err(ClassifiedError::bad_request(format!(
                    "service {}: task template spec and service.task_template {} are mutually exclusive",
                    service.name, id
                )))
            }
            (Some(mut spec), None) => {
                validate_template_spec(&spec)?;
                validate_credentials(&spec, &credentials)?;
                spec.tags = merge_tags(&spec.tags, &tags);
                TemplateIntent::CreateNew(spec)
            }
            (None, Some(id)) => {
                if !credentials.is_empty() {
                    return Err(ClassifiedError::bad_request(format!(
                        "service {}: credentials require a task template spec",
                        service.name
                    )));
                }
                TemplateIntent::Existing { id }
            }
            (None, None) => {
                return Err(ClassifiedError::bad_request(format!(
                    "service {}: either a task template spec or service.task_template is required",
                    service.name
                )))
            }
        };

        let arns = std::mem::take(&mut service.registry_arns);
        let registry = match (registry_entry, arns.is_empty()) {
            (Some(_), false) => {
                return Err(ClassifiedError::bad_request(format!(
                    "service {}: registry entry spec and service.registry_arns are mutually exclusive",
                    service.name
                )))
            }
            (Some(mut spec), true) => {
                if spec.name.trim().is_empty() || spec.namespace_id.trim().is_empty() {
                    return Err(ClassifiedError::bad_request(
                        "registry entry needs a name and a namespace_id",
                    ));
                }
                spec.tags = merge_tags(&spec.tags, &tags);
                RegistryIntent::CreateNew(spec)
            }
            (None, false) => RegistryIntent::Existing { arns },
            (None, true) => RegistryIntent::None,
        };

        service.tags = merge_tags(&service.tags, &tags);
        Ok(Self {
            cluster,
            template,
            registry,
            credentials,
            service,
            tags,
        })
    }
}

/// Checks the remote would otherwise reject after earlier steps already ran
pub fn validate_template_spec(spec: &TaskTemplateSpec) -> Result<()> {
    if spec.family.trim().is_empty() {
        return Err(ClassifiedError::bad_request(
            "task template family must not be empty",
        ));
    }
    if spec.containers.is_empty() {
        return Err(ClassifiedError::bad_request(format!(
            "task template {}: at least one container is required",
            spec.family
        )));
    }
    if let Some(name) = spec.duplicate_container_name() {
        return Err(ClassifiedError::bad_request(format!(
            "task template {}: duplicate container name {}",
            spec.family, name
        )));
    }
    Ok(())
}

// ============================================================================
// Delete Service Orchestration
// ============================================================================

/// Result of a service delete. Teardown loops may still be running.
#[derive(Debug)]
pub struct ServiceDeletion {
    pub service: Service,
    /// Revision deregistered by a recursive delete
    pub task_template: Option<TaskTemplate>,
    /// Credential secrets scheduled for deletion
    pub deleted_secrets: Vec<String>,
    pub teardowns: Vec<TeardownHandle>,
}
