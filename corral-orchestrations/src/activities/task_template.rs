//! Task template and task activities

use corral_models::{RunTaskRequest, Tag, TaskSummary, TaskTemplate, TaskTemplateSpec};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn register_task_template(
    ctx: &OrchestrationContext,
    spec: &TaskTemplateSpec,
) -> Result<TaskTemplate> {
    tracing::info!(
        "Registering task template {} ({} container(s))",
        spec.family,
        spec.containers.len()
    );
    let template = ctx
        .call(
            ResourceType::TaskTemplate,
            &spec.family,
            ctx.clients().task_templates.register(spec),
        )
        .await?;
    tracing::info!("Registered task template {}", template.id());
    Ok(template)
}

/// `id` is `family:revision`, or a bare family for its latest active revision
pub async fn describe_task_template(ctx: &OrchestrationContext, id: &str) -> Result<TaskTemplate> {
    ctx.call(
        ResourceType::TaskTemplate,
        id,
        ctx.clients().task_templates.describe(id),
    )
    .await
}

pub async fn deregister_task_template(
    ctx: &OrchestrationContext,
    id: &str,
) -> Result<TaskTemplate> {
    tracing::info!("Deregistering task template {}", id);
    ctx.call(
        ResourceType::TaskTemplate,
        id,
        ctx.clients().task_templates.deregister(id),
    )
    .await
}

pub async fn list_revisions(ctx: &OrchestrationContext, family: &str) -> Result<Vec<String>> {
    ctx.call(
        ResourceType::TaskTemplate,
        family,
        ctx.clients().task_templates.list_revisions(family),
    )
    .await
}

pub async fn tag_task_template(ctx: &OrchestrationContext, id: &str, tags: &[Tag]) -> Result<()> {
    ctx.call(
        ResourceType::TaskTemplate,
        id,
        ctx.clients().task_templates.tag(id, tags),
    )
    .await
}

pub async fn run_task(ctx: &OrchestrationContext, request: &RunTaskRequest) -> Result<Vec<TaskSummary>> {
    tracing::info!(
        "Running {} task(s) of {} on cluster {}",
        request.count,
        request.task_template,
        request.cluster
    );
    ctx.call(
        ResourceType::Task,
        &request.task_template,
        ctx.clients().task_templates.run_task(request),
    )
    .await
}
