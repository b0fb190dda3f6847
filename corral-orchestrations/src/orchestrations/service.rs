//! Service orchestrations

use std::collections::BTreeSet;

use corral_models::{
    merge_tags, CompositeServiceRequest, Service, ServiceChanges, ServiceDetail, ServiceSpec,
    ServiceUpdateRequest, TaskTemplate, TaskTemplateStatus,
};
use tracing::Instrument;

use super::create_cluster_step;
use crate::activities;
use crate::context::OrchestrationContext;
use crate::credentials::{carry_credentials, reconcile_credentials, validate_credentials};
use crate::endpoint::service_endpoint;
use crate::error::{ClassifiedError, Result};
use crate::names::orchestrations;
use crate::retry::{retry, Retry};
use crate::rollback::{RollbackAction, RollbackStack};
use crate::teardown::{spawn_cluster_teardown, spawn_registry_teardown};
use crate::types::{
    validate_template_spec, ClusterIntent, RegistryIntent, ServiceDeletion, ServicePlan,
    TemplateIntent,
};

/// Create a composite service: cluster, credentials, task template, registry entry and
/// the service itself, rolling back every completed step on failure.
pub async fn create_service(
    ctx: &OrchestrationContext,
    request: CompositeServiceRequest,
) -> Result<ServiceDetail> {
    async {
        let plan = ServicePlan::from_request(request, ctx.defaults())?;
        tracing::info!(
            "Creating service {} on cluster {}",
            plan.service.name,
            plan.cluster.name()
        );

        let mut rollback = RollbackStack::new();
        match create_service_impl(ctx, plan, &mut rollback).await {
            Ok(detail) => {
                tracing::info!("Service {} created", detail.service.arn);
                Ok(detail)
            }
            Err(e) => {
                tracing::error!("Failed to create service: {}", e);
                rollback.unwind(ctx).await;
                Err(e)
            }
        }
    }
    .instrument(ctx.span(orchestrations::CREATE_SERVICE))
    .await
}

async fn create_service_impl(
    ctx: &OrchestrationContext,
    plan: ServicePlan,
    rollback: &mut RollbackStack,
) -> Result<ServiceDetail> {
    let ServicePlan {
        cluster,
        template,
        registry,
        credentials,
        service,
        tags,
    } = plan;

    let cluster_name = match cluster {
        ClusterIntent::CreateNew(spec) => {
            tracing::info!("Step 1: Creating cluster {}", spec.name);
            create_cluster_step(ctx, &spec, rollback).await?
        }
        ClusterIntent::Existing { name } => {
            tracing::info!("Step 1: Using existing cluster {}", name);
            activities::cluster::describe_cluster(ctx, &name).await?.name
        }
    };

    let task_template = match template {
        TemplateIntent::CreateNew(mut spec) => {
            tracing::info!(
                "Step 2: Reconciling credentials for {} container(s)",
                credentials.len()
            );
            reconcile_credentials(
                ctx,
                Some(&cluster_name),
                &mut spec,
                &credentials,
                &tags,
                rollback,
            )
            .await?;

            tracing::info!("Step 3: Registering task template {}", spec.family);
            let registered =
                activities::task_template::register_task_template(ctx, &spec).await?;
            rollback.push(RollbackAction::DeregisterTaskTemplate {
                id: registered.id(),
            });
            registered
        }
        TemplateIntent::Existing { id } => {
            tracing::info!("Step 3: Using existing task template {}", id);
            let existing = activities::task_template::describe_task_template(ctx, &id).await?;
            if existing.status != TaskTemplateStatus::Active {
                return Err(ClassifiedError::bad_request(format!(
                    "task template {} is inactive",
                    existing.id()
                )));
            }
            existing
        }
    };

    let registry_arns = match registry {
        RegistryIntent::CreateNew(spec) => {
            tracing::info!("Step 4: Creating registry entry {}", spec.name);
            let entry = activities::registry::create_registry_entry(ctx, &spec).await?;
            rollback.push(RollbackAction::DeleteRegistryEntry {
                id: entry.id.clone(),
            });
            vec![entry.arn]
        }
        RegistryIntent::Existing { arns } => {
            tracing::info!("Step 4: Binding {} existing registry entry(s)", arns.len());
            arns
        }
        RegistryIntent::None => {
            tracing::info!("Step 4: No registry binding");
            Vec::new()
        }
    };

    tracing::info!("Step 5: Resolving network configuration");
    let network = ctx.defaults().resolve_network(service.network.as_ref());

    let spec = ServiceSpec {
        cluster: Some(cluster_name.clone()),
        task_template: Some(task_template.id()),
        registry_arns,
        network: Some(network),
        ..service
    };
    tracing::info!("Step 6: Creating service {}", spec.name);
    let created = with_retry(ctx, || async {
        activities::service::create_service(ctx, &spec).await
    })
    .await?;
    rollback.push(RollbackAction::DeleteService {
        cluster: cluster_name,
        name: created.name.clone(),
    });

    let endpoint = service_endpoint(ctx, &created).await;
    Ok(ServiceDetail {
        service: created,
        task_template,
        endpoint,
    })
}

/// Update a service. A task template spec registers a new revision; credentials alone
/// rotate the current revision's secrets in place.
///
/// Request tags are applied after the update commits. A tagging failure is logged and
/// does not fail the update.
pub async fn update_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    request: ServiceUpdateRequest,
) -> Result<ServiceDetail> {
    async {
        tracing::info!("Updating service {}/{}", cluster, name);
        let mut rollback = RollbackStack::new();
        match update_service_impl(ctx, cluster, name, request, &mut rollback).await {
            Ok(detail) => Ok(detail),
            Err(e) => {
                tracing::error!("Failed to update service: {}", e);
                rollback.unwind(ctx).await;
                Err(e)
            }
        }
    }
    .instrument(ctx.span(orchestrations::UPDATE_SERVICE))
    .await
}

async fn update_service_impl(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    request: ServiceUpdateRequest,
    rollback: &mut RollbackStack,
) -> Result<ServiceDetail> {
    let ServiceUpdateRequest {
        task_template: template_spec,
        credentials,
        desired_count,
        capacity_provider_strategy,
        network,
        force_new_deployment,
        tags: request_tags,
    } = request;
    let owned_tags = merge_tags(&request_tags, &[ctx.defaults().ownership_tag()]);

    tracing::info!("Step 1: Describing service {}/{}", cluster, name);
    let current = activities::service::describe_service(ctx, cluster, name).await?;
    let current_template =
        activities::task_template::describe_task_template(ctx, &current.task_template).await?;

    let mut template = current_template.clone();
    let mut new_revision = false;
    match template_spec {
        Some(mut spec) => {
            if spec.family.trim().is_empty() {
                spec.family = current_template.family.clone();
            }
            validate_template_spec(&spec)?;
            validate_credentials(&spec, &credentials)?;
            carry_credentials(&mut spec, &current_template);
            spec.tags = merge_tags(&spec.tags, &owned_tags);

            tracing::info!("Step 2: Registering a new revision of {}", spec.family);
            reconcile_credentials(ctx, Some(cluster), &mut spec, &credentials, &owned_tags, rollback)
                .await?;
            template = activities::task_template::register_task_template(ctx, &spec).await?;
            rollback.push(RollbackAction::DeregisterTaskTemplate { id: template.id() });
            new_revision = true;
        }
        None if !credentials.is_empty() => {
            let mut spec = current_template.to_spec();
            tracing::info!("Step 2: Reconciling credentials of {}", current_template.id());
            let report =
                reconcile_credentials(ctx, Some(cluster), &mut spec, &credentials, &owned_tags, rollback)
                    .await?;
            if !report.created.is_empty() {
                // new secret references only exist in a new revision
                template = activities::task_template::register_task_template(ctx, &spec).await?;
                rollback.push(RollbackAction::DeregisterTaskTemplate { id: template.id() });
                new_revision = true;
            }
        }
        None => tracing::info!("Step 2: Task template unchanged"),
    }

    let changes = ServiceChanges {
        task_template: new_revision.then(|| template.id()),
        desired_count,
        capacity_provider_strategy,
        network: network.map(|n| ctx.defaults().resolve_network(Some(&n))),
        force_new_deployment,
    };
    let service = if changes == ServiceChanges::default() {
        tracing::info!("Step 3: No service changes requested");
        current
    } else {
        tracing::info!("Step 3: Updating service {}/{}", cluster, name);
        with_retry(ctx, || async {
            activities::service::update_service(ctx, cluster, name, &changes).await
        })
        .await?
    };
    rollback.commit();

    // the update has taken effect; tags are applied on a best-effort basis
    if !request_tags.is_empty() {
        tracing::info!("Step 4: Tagging service and task template");
        if let Err(e) = activities::service::tag_service(ctx, cluster, name, &owned_tags).await {
            tracing::warn!("Failed to tag service {}/{}: {}", cluster, name, e);
        }
        if let Err(e) =
            activities::task_template::tag_task_template(ctx, &template.id(), &owned_tags).await
        {
            tracing::warn!("Failed to tag task template {}: {}", template.id(), e);
        }
    }

    let endpoint = service_endpoint(ctx, &service).await;
    Ok(ServiceDetail {
        service,
        task_template: template,
        endpoint,
    })
}

/// Scale a service to zero and delete it.
///
/// A recursive delete also deregisters its task template revision, deletes the
/// credential secrets this tenant created for it, and starts teardown loops for its
/// registry entries and its cluster. Anything another service in the cluster still
/// uses is kept.
pub async fn delete_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
    recursive: bool,
) -> Result<ServiceDeletion> {
    async {
        tracing::info!(
            "Deleting service {}/{} (recursive: {})",
            cluster,
            name,
            recursive
        );

        tracing::info!("Step 1: Describing service");
        let service = activities::service::describe_service(ctx, cluster, name).await?;

        if service.desired_count > 0 {
            tracing::info!("Step 2: Scaling service to zero");
            let changes = ServiceChanges {
                desired_count: Some(0),
                ..ServiceChanges::default()
            };
            with_retry(ctx, || async {
                activities::service::update_service(ctx, cluster, name, &changes).await
            })
            .await?;
        }

        tracing::info!("Step 3: Deleting service");
        let deleted = with_retry(ctx, || async {
            activities::service::delete_service(ctx, cluster, name, true).await
        })
        .await?;

        let mut deletion = ServiceDeletion {
            service: deleted,
            task_template: None,
            deleted_secrets: Vec::new(),
            teardowns: Vec::new(),
        };
        if !recursive {
            return Ok(deletion);
        }

        let siblings = activities::service::list_services(ctx, cluster).await?;
        match siblings
            .iter()
            .find(|s| s.task_template == service.task_template)
        {
            Some(sibling) => tracing::info!(
                "Step 4: Keeping task template {}, service {} still runs it",
                service.task_template,
                sibling.name
            ),
            None => {
                tracing::info!("Step 4: Deregistering task template {}", service.task_template);
                match activities::task_template::deregister_task_template(
                    ctx,
                    &service.task_template,
                )
                .await
                {
                    Ok(template) => deletion.task_template = Some(template),
                    Err(e) if e.is_not_found() => {
                        tracing::info!("Task template {} already gone", service.task_template)
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if let Some(template) = &deletion.task_template {
            tracing::info!("Step 5: Deleting credential secrets");
            deletion.deleted_secrets = delete_owned_secrets(ctx, template).await?;
        }

        for arn in &service.registry_arns {
            match siblings.iter().find(|s| s.registry_arns.contains(arn)) {
                Some(sibling) => tracing::info!(
                    "Step 6: Keeping registry entry {}, service {} still binds it",
                    arn,
                    sibling.name
                ),
                None => {
                    tracing::info!("Step 6: Starting teardown of registry entry {}", arn);
                    deletion.teardowns.push(spawn_registry_teardown(ctx, arn));
                }
            }
        }

        let remaining = activities::cluster::list_service_names(ctx, cluster).await?;
        if remaining.is_empty() {
            tracing::info!("Step 7: Starting teardown of cluster {}", cluster);
            deletion.teardowns.push(spawn_cluster_teardown(ctx, cluster));
        } else {
            tracing::info!(
                "Step 7: Keeping cluster {}, {} service(s) remain",
                cluster,
                remaining.len()
            );
        }

        Ok(deletion)
    }
    .instrument(ctx.span(orchestrations::DELETE_SERVICE))
    .await
}

/// Delete the credential secrets of `template` that carry this tenant's ownership tag
/// and no other active revision of the family references
async fn delete_owned_secrets(
    ctx: &OrchestrationContext,
    template: &TaskTemplate,
) -> Result<Vec<String>> {
    let ownership = ctx.defaults().ownership_tag();
    let grace_days = ctx.defaults().secret_grace_days;

    let mut still_referenced = BTreeSet::new();
    for id in activities::task_template::list_revisions(ctx, &template.family).await? {
        if id == template.id() {
            continue;
        }
        let other = activities::task_template::describe_task_template(ctx, &id).await?;
        still_referenced.extend(
            other
                .containers
                .iter()
                .filter_map(|c| c.credentials_arn().map(str::to_string)),
        );
    }

    let arns: BTreeSet<&str> = template
        .containers
        .iter()
        .filter_map(|c| c.credentials_arn())
        .collect();
    let mut deleted = Vec::new();
    for arn in arns {
        if still_referenced.contains(arn) {
            tracing::info!("Keeping secret {}, another revision references it", arn);
            continue;
        }
        match activities::secrets::describe_secret(ctx, arn).await {
            Ok(summary) if summary.deletion_date.is_some() => {}
            Ok(summary) if summary.tags.contains(&ownership) => {
                activities::secrets::delete_secret(ctx, arn, grace_days).await?;
                deleted.push(arn.to_string());
            }
            Ok(_) => tracing::info!("Keeping secret {}, not created by this tenant", arn),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(deleted)
}

pub async fn get_service(
    ctx: &OrchestrationContext,
    cluster: &str,
    name: &str,
) -> Result<ServiceDetail> {
    async {
        let service = activities::service::describe_service(ctx, cluster, name).await?;
        let task_template =
            activities::task_template::describe_task_template(ctx, &service.task_template)
                .await?;
        let endpoint = service_endpoint(ctx, &service).await;
        Ok(ServiceDetail {
            service,
            task_template,
            endpoint,
        })
    }
    .instrument(ctx.span(orchestrations::GET_SERVICE))
    .await
}

pub async fn list_services(ctx: &OrchestrationContext, cluster: &str) -> Result<Vec<Service>> {
    activities::service::list_services(ctx, cluster)
        .instrument(ctx.span(orchestrations::LIST_SERVICES))
        .await
}

/// Service calls retry throttling and unclassifiable failures
async fn with_retry<T, F, Fut>(ctx: &OrchestrationContext, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let policy = ctx.policy();
    retry(policy.retry_attempts, policy.retry_delay, || {
        let attempt = operation();
        async move { attempt.await.map_err(Retry::from_classified) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use corral_models::{CompositeServiceRequest, Tag};
    use tokio_util::sync::CancellationToken;

    use crate::classify::{platform, registry, secrets};
    use crate::error::{ErrorKind, RemoteError};
    use crate::memory::Operation;
    use crate::teardown::TeardownOutcome;
    use crate::testing::{credentials, full_request, service_spec, setup, template_spec};

    #[tokio::test]
    async fn test_create_service_builds_every_resource() {
        let (platform, ctx) = setup();

        let detail = create_service(&ctx, full_request()).await.unwrap();

        assert_eq!(detail.task_template.id(), "web:1");
        assert_eq!(detail.service.task_template, "web:1");
        assert_eq!(detail.endpoint.as_deref(), Some("web.internal.example"));
        let network = detail.service.network.clone().unwrap();
        assert_eq!(network.subnets, vec!["subnet-a", "subnet-b"]);
        assert!(detail.service.tags.contains(&Tag::new("corral:org", "acme")));

        let app = detail.task_template.container("app").unwrap();
        let arn = app.credentials_arn().unwrap();
        assert_eq!(platform.secret_value(arn).as_deref(), Some("registry-token-1"));
        assert!(detail.task_template.container("proxy").unwrap().repository_credentials.is_none());
        assert!(platform.service_exists("shared", "web"));
    }

    #[tokio::test]
    async fn test_registration_failure_removes_cluster_and_secret() {
        let (platform, ctx) = setup();
        let mut request = full_request();
        request.registry_entry = None;
        platform.fail_next(
            Operation::RegisterTaskTemplate,
            RemoteError::vendor(platform::CLIENT, "Invalid setting for container app."),
        );

        let err = create_service(&ctx, request).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert!(!platform.cluster_exists("shared"));
        assert!(platform.live_secrets().is_empty());
        assert!(platform.active_revisions("web").is_empty());
        assert!(!platform.service_exists("shared", "web"));

        let journal = platform.journal();
        assert_eq!(journal.len(), 4);
        assert!(journal[2].starts_with("delete_secret:arn:corral:secret:corral/shared/web/app"));
        assert_eq!(journal[3], "delete_cluster:shared");
    }

    #[tokio::test]
    async fn test_service_failure_unwinds_steps_in_reverse() {
        let (platform, ctx) = setup();
        platform.fail_next(
            Operation::CreateService,
            RemoteError::vendor(platform::INVALID_PARAMETER, "Invalid security group."),
        );

        let err = create_service(&ctx, full_request()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(platform.attempts(Operation::CreateService), 1);
        let journal = platform.journal();
        assert_eq!(
            journal_ops(&journal[4..]),
            vec!["delete_entry", "deregister", "delete_secret", "delete_cluster"]
        );
        assert!(journal[5].ends_with("web:1"));
    }

    fn journal_ops(journal: &[String]) -> Vec<&str> {
        journal
            .iter()
            .map(|entry| entry.split(':').next().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_cluster_failure_leaves_nothing_to_undo() {
        let (platform, ctx) = setup();
        platform.fail_next(
            Operation::CreateCluster,
            RemoteError::vendor(platform::CLIENT, "Invalid capacity provider."),
        );

        let err = create_service(&ctx, full_request()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert!(platform.journal().is_empty());
        assert_eq!(platform.attempts(Operation::CreateSecret), 0);
        assert_eq!(platform.attempts(Operation::DeleteCluster), 0);
    }

    #[tokio::test]
    async fn test_second_secret_failure_removes_first_secret_then_cluster() {
        let (platform, ctx) = setup();
        let mut request = full_request();
        request.registry_entry = None;
        request.credentials.extend(credentials("proxy", "mirror-token-1"));
        platform.fail_after(
            Operation::CreateSecret,
            1,
            RemoteError::vendor(secrets::LIMIT_EXCEEDED, "Too many secrets."),
        );

        let err = create_service(&ctx, request).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::LimitExceeded);
        assert_eq!(platform.attempts(Operation::CreateSecret), 2);
        assert_eq!(platform.attempts(Operation::RegisterTaskTemplate), 0);
        let journal = platform.journal();
        assert_eq!(
            journal_ops(&journal),
            vec!["create_cluster", "create_secret", "delete_secret", "delete_cluster"]
        );
        assert!(journal[2].starts_with("delete_secret:arn:corral:secret:corral/shared/web/app"));
        assert!(platform.live_secrets().is_empty());
        assert!(!platform.cluster_exists("shared"));
    }

    #[tokio::test]
    async fn test_registry_failure_deregisters_template_before_secret_and_cluster() {
        let (platform, ctx) = setup();
        platform.fail_next(
            Operation::CreateRegistryEntry,
            RemoteError::vendor(registry::INVALID_INPUT, "DnsConfig is invalid."),
        );

        let err = create_service(&ctx, full_request()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(platform.attempts(Operation::CreateService), 0);
        let journal = platform.journal();
        assert_eq!(
            journal_ops(&journal),
            vec![
                "create_cluster",
                "create_secret",
                "register",
                "deregister",
                "delete_secret",
                "delete_cluster"
            ]
        );
        assert_eq!(journal[3], "deregister:web:1");
        assert!(platform.active_revisions("web").is_empty());
        assert!(platform.live_secrets().is_empty());
        assert!(!platform.cluster_exists("shared"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_service_creation_is_retried() {
        let (platform, ctx) = setup();
        platform.fail_times(
            Operation::CreateService,
            RemoteError::vendor(platform::THROTTLING, "Rate exceeded"),
            2,
        );

        create_service(&ctx, full_request()).await.unwrap();

        assert_eq!(platform.attempts(Operation::CreateService), 3);
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_remote_call() {
        let (platform, ctx) = setup();
        let mut request = full_request();
        request.credentials = credentials("sidecar", "token");

        let err = create_service(&ctx, request).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(platform.attempts(Operation::DescribeCluster), 0);
        assert!(platform.journal().is_empty());
    }

    #[tokio::test]
    async fn test_existing_cluster_is_not_adopted() {
        let (platform, ctx) = setup();
        create_service(&ctx, full_request()).await.unwrap();

        let mut request = full_request();
        request.service = Some(service_spec("api"));
        request.registry_entry = None;
        request.task_template = Some(template_spec("api"));
        let err = create_service(&ctx, request).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(platform.cluster_exists("shared"));
        assert!(platform.service_exists("shared", "web"));
    }

    #[tokio::test]
    async fn test_existing_references_are_reused() {
        let (platform, ctx) = setup();
        let first = create_service(&ctx, full_request()).await.unwrap();

        let mut service = service_spec("worker");
        service.cluster = Some("shared".to_string());
        service.task_template = Some(first.task_template.id());
        service.registry_arns = first.service.registry_arns.clone();
        let detail = create_service(
            &ctx,
            CompositeServiceRequest {
                service: Some(service),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.task_template.id(), "web:1");
        assert_eq!(detail.endpoint.as_deref(), Some("web.internal.example"));
        assert_eq!(platform.active_revisions("web").len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_reports_internal_error() {
        let (platform, ctx) = setup();
        let token = CancellationToken::new();
        let ctx = ctx.with_cancellation(token.clone());
        token.cancel();

        let err = create_service(&ctx, full_request()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(err.message.contains("cancelled"));
        assert!(platform.journal().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_template_carries_credentials() {
        let (platform, ctx) = setup();
        let created = create_service(&ctx, full_request()).await.unwrap();
        let old_arn = created
            .task_template
            .container("app")
            .and_then(|c| c.credentials_arn())
            .map(str::to_string)
            .unwrap();

        let mut spec = template_spec("");
        spec.containers[0].image = "registry.example/web:1.5".to_string();
        let detail = update_service(
            &ctx,
            "shared",
            "web",
            ServiceUpdateRequest {
                task_template: Some(spec),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.task_template.id(), "web:2");
        assert_eq!(detail.service.task_template, "web:2");
        assert_eq!(
            detail.task_template.container("app").unwrap().credentials_arn(),
            Some(old_arn.as_str())
        );
        assert_eq!(platform.live_secrets().len(), 1);
    }

    #[tokio::test]
    async fn test_update_with_credentials_only_rotates_in_place() {
        let (platform, ctx) = setup();
        let created = create_service(&ctx, full_request()).await.unwrap();

        let detail = update_service(
            &ctx,
            "shared",
            "web",
            ServiceUpdateRequest {
                credentials: credentials("app", "registry-token-2"),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.task_template.id(), created.task_template.id());
        let arn = detail.task_template.container("app").unwrap().credentials_arn().unwrap();
        assert_eq!(platform.secret_value(arn).as_deref(), Some("registry-token-2"));
        assert_eq!(platform.active_revisions("web"), vec!["web:1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_update_deregisters_new_revision() {
        let (platform, ctx) = setup();
        create_service(&ctx, full_request()).await.unwrap();
        platform.fail_next(
            Operation::UpdateService,
            RemoteError::vendor(platform::SERVICE_NOT_ACTIVE, "Service was not ACTIVE."),
        );

        let err = update_service(
            &ctx,
            "shared",
            "web",
            ServiceUpdateRequest {
                task_template: Some(template_spec("web")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(platform.active_revisions("web"), vec!["web:1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recursive_delete_tears_everything_down() {
        let (platform, ctx) = setup();
        let created = create_service(&ctx, full_request()).await.unwrap();
        let entry = created.service.registry_arns[0].clone();
        platform.hold_registry_entry(&entry, 1);

        let deletion = delete_service(&ctx, "shared", "web", true).await.unwrap();

        assert_eq!(deletion.teardowns.len(), 2);
        assert_eq!(deletion.deleted_secrets.len(), 1);
        assert_eq!(
            deletion.task_template.as_ref().map(|t| t.status),
            Some(TaskTemplateStatus::Inactive)
        );
        for handle in deletion.teardowns {
            assert_eq!(
                handle.wait(Duration::from_secs(120)).await,
                TeardownOutcome::Deleted
            );
        }
        assert!(!platform.service_exists("shared", "web"));
        assert!(!platform.registry_entry_exists(&entry));
        assert!(!platform.cluster_exists("shared"));
        assert!(platform.live_secrets().is_empty());
    }

    #[tokio::test]
    async fn test_recursive_delete_keeps_shared_cluster() {
        let (platform, ctx) = setup();
        let created = create_service(&ctx, full_request()).await.unwrap();
        let mut other = service_spec("worker");
        other.cluster = Some("shared".to_string());
        other.task_template = Some(created.task_template.id());
        create_service(
            &ctx,
            CompositeServiceRequest {
                service: Some(other),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let deletion = delete_service(&ctx, "shared", "worker", true).await.unwrap();

        assert!(deletion.teardowns.is_empty());
        assert!(deletion.task_template.is_none());
        assert!(platform.cluster_exists("shared"));
        assert_eq!(platform.live_secrets().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recursive_delete_keeps_registry_entry_bound_by_sibling() {
        let (platform, ctx) = setup();
        let created = create_service(&ctx, full_request()).await.unwrap();
        let entry = created.service.registry_arns[0].clone();
        let mut worker = service_spec("worker");
        worker.cluster = Some("shared".to_string());
        worker.task_template = Some(created.task_template.id());
        worker.registry_arns = vec![entry.clone()];
        create_service(
            &ctx,
            CompositeServiceRequest {
                service: Some(worker),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let deletion = delete_service(&ctx, "shared", "web", true).await.unwrap();

        assert!(deletion.teardowns.is_empty());
        assert!(platform.registry_entry_exists(&entry));
        assert_eq!(platform.attempts(Operation::DeleteRegistryEntry), 0);

        let deletion = delete_service(&ctx, "shared", "worker", true).await.unwrap();

        assert_eq!(deletion.teardowns.len(), 2);
        for handle in deletion.teardowns {
            assert_eq!(
                handle.wait(Duration::from_secs(120)).await,
                TeardownOutcome::Deleted
            );
        }
        assert!(!platform.registry_entry_exists(&entry));
        assert!(!platform.cluster_exists("shared"));
    }

    #[tokio::test]
    async fn test_tagging_failure_does_not_fail_committed_update() {
        let (platform, ctx) = setup();
        create_service(&ctx, full_request()).await.unwrap();
        platform.fail_next(
            Operation::TagService,
            RemoteError::vendor(platform::SERVER, "Internal failure."),
        );

        let detail = update_service(
            &ctx,
            "shared",
            "web",
            ServiceUpdateRequest {
                desired_count: Some(4),
                tags: vec![Tag::new("team", "edge")],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.service.desired_count, 4);
        assert_eq!(platform.attempts(Operation::TagService), 1);
        assert_eq!(platform.attempts(Operation::TagTaskTemplate), 1);
    }

    #[tokio::test]
    async fn test_plain_delete_leaves_dependencies() {
        let (platform, ctx) = setup();
        create_service(&ctx, full_request()).await.unwrap();

        let deletion = delete_service(&ctx, "shared", "web", false).await.unwrap();

        assert!(deletion.teardowns.is_empty());
        assert!(deletion.task_template.is_none());
        assert!(platform.cluster_exists("shared"));
        assert_eq!(platform.active_revisions("web").len(), 1);
        assert_eq!(platform.live_secrets().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_service_is_not_found() {
        let (_platform, ctx) = setup();
        create_service(&ctx, full_request()).await.unwrap();

        let err = get_service(&ctx, "shared", "api").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(list_services(&ctx, "shared").await.unwrap().len(), 1);
    }
}
