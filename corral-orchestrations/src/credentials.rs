//! Repository credential reconciliation.
//!
//! Requests carry registry credentials keyed by container name. Each one ends up in a
//! secret whose ARN the container definition references:
//!
//! | container reference | credentials entry | action                         |
//! |---------------------|-------------------|--------------------------------|
//! | none                | present           | create secret, attach its ARN  |
//! | present             | present           | store new value at that ARN    |
//! | present             | absent            | leave untouched                |
//! | none                | absent            | nothing                        |
//!
//! A container never gets a second secret, so reconciling the same input twice only
//! rotates values.

use std::collections::BTreeMap;

use corral_models::{
    merge_tags, CredentialSpec, RepositoryCredentials, SecretCreateSpec, Tag, TaskTemplate,
    TaskTemplateSpec,
};
use serde::Serialize;

use crate::activities;
use crate::context::{OrchestrationContext, TenantDefaults};
use crate::error::{ClassifiedError, Result};
use crate::rollback::{RollbackAction, RollbackStack};

/// Containers whose credentials were created or rotated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub rotated: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.rotated.is_empty()
    }
}

/// `<prefix>/<cluster>/<family>/<container>`, or `<prefix>/<family>/<container>`
/// for templates not tied to a cluster
pub fn secret_name(
    defaults: &TenantDefaults,
    cluster: Option<&str>,
    family: &str,
    container: &str,
) -> String {
    match cluster {
        Some(cluster) => format!(
            "{}/{}/{}/{}",
            defaults.secret_prefix, cluster, family, container
        ),
        None => format!("{}/{}/{}", defaults.secret_prefix, family, container),
    }
}

/// Every credentials entry must name a container of `spec`
pub fn validate_credentials(
    spec: &TaskTemplateSpec,
    credentials: &BTreeMap<String, CredentialSpec>,
) -> Result<()> {
    for container in credentials.keys() {
        if spec.container(container).is_none() {
            return Err(ClassifiedError::bad_request(format!(
                "task template {}: credentials given for unknown container {}",
                spec.family, container
            )));
        }
    }
    Ok(())
}

/// Copy credential references of same-named containers from `current` into `spec`
pub fn carry_credentials(spec: &mut TaskTemplateSpec, current: &TaskTemplate) {
    for container in &mut spec.containers {
        if container.repository_credentials.is_some() {
            continue;
        }
        if let Some(previous) = current.containers.iter().find(|c| c.name == container.name) {
            container.repository_credentials = previous.repository_credentials.clone();
        }
    }
}

/// Reconcile `credentials` into the container definitions of `spec`.
///
/// Input is validated before any secret is touched. Every secret created here is
/// pushed onto `rollback`; rotations cannot be undone.
pub async fn reconcile_credentials(
    ctx: &OrchestrationContext,
    cluster: Option<&str>,
    spec: &mut TaskTemplateSpec,
    credentials: &BTreeMap<String, CredentialSpec>,
    tags: &[Tag],
    rollback: &mut RollbackStack,
) -> Result<ReconcileReport> {
    validate_credentials(spec, credentials)?;

    let mut report = ReconcileReport::default();
    if credentials.is_empty() {
        return Ok(report);
    }

    let secret_tags = merge_tags(tags, &[ctx.defaults().ownership_tag()]);
    let family = spec.family.clone();
    for container in &mut spec.containers {
        let Some(credential) = credentials.get(&container.name) else {
            continue;
        };

        match container.credentials_arn().map(str::to_string) {
            Some(arn) => {
                activities::secrets::update_secret(ctx, &arn, &credential.secret_string).await?;
                report.rotated.push(container.name.clone());
            }
            None => {
                let create = SecretCreateSpec {
                    name: secret_name(ctx.defaults(), cluster, &family, &container.name),
                    secret_string: credential.secret_string.clone(),
                    description: Some(credential.description.clone().unwrap_or_else(|| {
                        format!(
                            "Registry credentials for container {} of {}",
                            container.name, family
                        )
                    })),
                    tags: secret_tags.clone(),
                };
                let handle = activities::secrets::create_secret(ctx, &create).await?;
                rollback.push(RollbackAction::DeleteSecret {
                    arn: handle.arn.clone(),
                });
                container.repository_credentials = Some(RepositoryCredentials {
                    credentials_parameter: handle.arn,
                });
                report.created.push(container.name.clone());
            }
        }
    }

    tracing::info!(
        "Credentials reconciled: {} created, {} rotated",
        report.created.len(),
        report.rotated.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use corral_models::ContainerDefinition;

    use crate::clients::PlatformClients;
    use crate::context::{OrchestrationPolicy, Tenant};
    use crate::error::ErrorKind;
    use crate::memory::MemoryPlatform;

    fn context(platform: &Arc<MemoryPlatform>) -> OrchestrationContext {
        let tenant = Tenant::new(
            "acme",
            PlatformClients::from_platform(platform.clone()),
            TenantDefaults::new("acme"),
        );
        OrchestrationContext::new(Arc::new(tenant), OrchestrationPolicy::default())
    }

    fn spec() -> TaskTemplateSpec {
        TaskTemplateSpec {
            family: "web".to_string(),
            cpu: "512".to_string(),
            memory: "1024".to_string(),
            network_mode: "awsvpc".to_string(),
            execution_role: None,
            containers: vec![
                ContainerDefinition::new("app", "registry.example/web:1.4"),
                ContainerDefinition::new("proxy", "envoyproxy/envoy:v1.31"),
            ],
            tags: Vec::new(),
        }
    }

    fn credentials(value: &str) -> BTreeMap<String, CredentialSpec> {
        BTreeMap::from([(
            "app".to_string(),
            CredentialSpec {
                secret_string: value.to_string(),
                description: None,
            },
        )])
    }

    #[tokio::test]
    async fn test_second_run_only_rotates() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform);
        let mut spec = spec();
        let mut rollback = RollbackStack::new();

        let first = reconcile_credentials(
            &ctx,
            Some("shared"),
            &mut spec,
            &credentials("v1"),
            &[],
            &mut rollback,
        )
        .await
        .unwrap();
        let second = reconcile_credentials(
            &ctx,
            Some("shared"),
            &mut spec,
            &credentials("v2"),
            &[],
            &mut rollback,
        )
        .await
        .unwrap();

        assert_eq!(first.created, vec!["app".to_string()]);
        assert_eq!(second.created, Vec::<String>::new());
        assert_eq!(second.rotated, vec!["app".to_string()]);
        assert_eq!(rollback.len(), 1);

        let secrets = platform.live_secrets();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].name, "corral/shared/web/app");
        assert!(secrets[0].tags.contains(&Tag::new("corral:org", "acme")));
        let arn = spec.containers[0].credentials_arn().unwrap();
        assert_eq!(platform.secret_value(arn).as_deref(), Some("v2"));
        assert!(spec.containers[1].repository_credentials.is_none());
    }

    #[tokio::test]
    async fn test_unknown_container_rejected_before_any_secret() {
        let platform = Arc::new(MemoryPlatform::new());
        let ctx = context(&platform);
        let mut spec = spec();
        let mut creds = credentials("v1");
        creds.insert(
            "sidecar".to_string(),
            CredentialSpec {
                secret_string: "x".to_string(),
                description: None,
            },
        );

        let err = reconcile_credentials(
            &ctx,
            None,
            &mut spec,
            &creds,
            &[],
            &mut RollbackStack::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert!(err.message.contains("sidecar"));
        assert!(platform.live_secrets().is_empty());
    }

    #[test]
    fn test_carry_credentials_keeps_explicit_references() {
        let mut current = spec();
        current.containers[0].repository_credentials = Some(RepositoryCredentials {
            credentials_parameter: "arn:old-app".to_string(),
        });
        current.containers[1].repository_credentials = Some(RepositoryCredentials {
            credentials_parameter: "arn:old-proxy".to_string(),
        });
        let current = TaskTemplate {
            family: "web".to_string(),
            revision: 3,
            arn: "arn:corral:task-template/web:3".to_string(),
            status: corral_models::TaskTemplateStatus::Active,
            cpu: current.cpu,
            memory: current.memory,
            network_mode: current.network_mode,
            execution_role: None,
            containers: current.containers,
            tags: Vec::new(),
        };
        let mut next = spec();
        next.containers[1].repository_credentials = Some(RepositoryCredentials {
            credentials_parameter: "arn:new-proxy".to_string(),
        });

        carry_credentials(&mut next, &current);

        assert_eq!(next.containers[0].credentials_arn(), Some("arn:old-app"));
        assert_eq!(next.containers[1].credentials_arn(), Some("arn:new-proxy"));
    }

    #[test]
    fn test_secret_name_layout() {
        let defaults = TenantDefaults::new("acme");

        assert_eq!(
            secret_name(&defaults, Some("shared"), "web", "app"),
            "corral/shared/web/app"
        );
        assert_eq!(secret_name(&defaults, None, "web", "app"), "corral/web/app");
    }
}
