//! Task template and task orchestrations

use corral_models::{
    merge_tags, CompositeTaskTemplateRequest, RunTaskRequest, TaskSummary, TaskTemplate,
    TaskTemplateDetail, TaskTemplateUpdateRequest,
};
use tracing::Instrument;

use super::create_cluster_step;
use crate::activities;
use crate::context::OrchestrationContext;
use crate::credentials::{carry_credentials, reconcile_credentials, validate_credentials};
use crate::error::{ClassifiedError, ResourceType, Result};
use crate::names::orchestrations;
use crate::rollback::RollbackStack;
use crate::types::validate_template_spec;

/// Tasks started by one run request
const MAX_TASKS_PER_RUN: u32 = 10;

/// Register a task template, optionally creating the cluster its secrets are named after
pub async fn create_task_template(
    ctx: &OrchestrationContext,
    request: CompositeTaskTemplateRequest,
) -> Result<TaskTemplateDetail> {
    async {
        let CompositeTaskTemplateRequest {
            cluster,
            task_template: mut spec,
            credentials,
            tags,
        } = request;
        validate_template_spec(&spec)?;
        validate_credentials(&spec, &credentials)?;
        let tags = merge_tags(&tags, &[ctx.defaults().ownership_tag()]);
        spec.tags = merge_tags(&spec.tags, &tags);

        tracing::info!("Creating task template {}", spec.family);
        let mut rollback = RollbackStack::new();
        let result = async {
            let cluster_name = match cluster {
                Some(mut cluster) => {
                    tracing::info!("Step 1: Creating cluster {}", cluster.name);
                    cluster.tags = merge_tags(&cluster.tags, &tags);
                    Some(create_cluster_step(ctx, &cluster, &mut rollback).await?)
                }
                None => None,
            };

            tracing::info!("Step 2: Reconciling credentials");
            reconcile_credentials(
                ctx,
                cluster_name.as_deref(),
                &mut spec,
                &credentials,
                &tags,
                &mut rollback,
            )
            .await?;

            tracing::info!("Step 3: Registering task template {}", spec.family);
            activities::task_template::register_task_template(ctx, &spec).await
        }
        .await;

        match result {
            Ok(template) => Ok(TaskTemplateDetail::new(template)),
            Err(e) => {
                tracing::error!("Failed to create task template: {}", e);
                rollback.unwind(ctx).await;
                Err(e)
            }
        }
    }
    .instrument(ctx.span(orchestrations::CREATE_TASK_TEMPLATE))
    .await
}

/// Register the next revision of `family`.
///
/// Starts from the supplied spec, or from the latest active revision when none is
/// given. Credential references of same-named containers carry over, so credentials
/// in the request rotate existing secrets rather than creating new ones.
pub async fn update_task_template(
    ctx: &OrchestrationContext,
    family: &str,
    request: TaskTemplateUpdateRequest,
) -> Result<TaskTemplateDetail> {
    async {
        let TaskTemplateUpdateRequest {
            task_template,
            credentials,
            tags,
        } = request;

        tracing::info!("Step 1: Describing latest revision of {}", family);
        let current = activities::task_template::describe_task_template(ctx, family).await?;

        let mut spec = match task_template {
            Some(spec) if !spec.family.is_empty() && spec.family != family => {
                return Err(ClassifiedError::bad_request(format!(
                    "task template {}: spec names family {}",
                    family, spec.family
                )))
            }
            Some(mut spec) => {
                spec.family = family.to_string();
                spec
            }
            None => current.to_spec(),
        };
        validate_template_spec(&spec)?;
        validate_credentials(&spec, &credentials)?;
        carry_credentials(&mut spec, &current);
        let tags = merge_tags(&tags, &[ctx.defaults().ownership_tag()]);
        spec.tags = merge_tags(&spec.tags, &tags);

        let mut rollback = RollbackStack::new();
        let result = async {
            tracing::info!("Step 2: Reconciling credentials");
            reconcile_credentials(ctx, None, &mut spec, &credentials, &tags, &mut rollback)
                .await?;
            tracing::info!("Step 3: Registering revision {} of {}", current.revision + 1, family);
            activities::task_template::register_task_template(ctx, &spec).await
        }
        .await;

        match result {
            Ok(template) => Ok(TaskTemplateDetail::new(template)),
            Err(e) => {
                tracing::error!("Failed to update task template: {}", e);
                rollback.unwind(ctx).await;
                Err(e)
            }
        }
    }
    .instrument(ctx.span(orchestrations::UPDATE_TASK_TEMPLATE))
    .await
}

/// Deregister `family:revision`, or every active revision of `family`
pub async fn delete_task_template(
    ctx: &OrchestrationContext,
    family: &str,
    revision: Option<u32>,
) -> Result<Vec<TaskTemplate>> {
    async {
        let ids = match revision {
            Some(revision) => vec![format!("{}:{}", family, revision)],
            None => {
                let ids = activities::task_template::list_revisions(ctx, family).await?;
                if ids.is_empty() {
                    return Err(ClassifiedError::not_found(ResourceType::TaskTemplate, family));
                }
                ids
            }
        };

        let mut deregistered = Vec::with_capacity(ids.len());
        for id in ids {
            deregistered.push(activities::task_template::deregister_task_template(ctx, &id).await?);
        }
        Ok(deregistered)
    }
    .instrument(ctx.span(orchestrations::DELETE_TASK_TEMPLATE))
    .await
}

pub async fn get_task_template(
    ctx: &OrchestrationContext,
    family: &str,
    revision: Option<u32>,
) -> Result<TaskTemplateDetail> {
    let id = match revision {
        Some(revision) => format!("{}:{}", family, revision),
        None => family.to_string(),
    };
    activities::task_template::describe_task_template(ctx, &id)
        .instrument(ctx.span(orchestrations::GET_TASK_TEMPLATE))
        .await
        .map(TaskTemplateDetail::new)
}

/// Start `count` one-off tasks from a task template
pub async fn run_task(
    ctx: &OrchestrationContext,
    mut request: RunTaskRequest,
) -> Result<Vec<TaskSummary>> {
    async {
        if request.count == 0 || request.count > MAX_TASKS_PER_RUN {
            return Err(ClassifiedError::bad_request(format!(
                "task template {}: count must be between 1 and {}, got {}",
                request.task_template, MAX_TASKS_PER_RUN, request.count
            )));
        }
        request.network = Some(ctx.defaults().resolve_network(request.network.as_ref()));
        request.tags = merge_tags(&request.tags, &[ctx.defaults().ownership_tag()]);

        let tasks = activities::task_template::run_task(ctx, &request).await?;
        tracing::info!("Started {} task(s)", tasks.len());
        Ok(tasks)
    }
    .instrument(ctx.span(orchestrations::RUN_TASK))
    .await
}
