//! Configuration parameter activities

use corral_models::{Parameter, ParameterSpec};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn put_parameter(
    ctx: &OrchestrationContext,
    spec: &ParameterSpec,
    overwrite: bool,
) -> Result<Parameter> {
    tracing::info!("Writing parameter {} (overwrite: {})", spec.name, overwrite);
    ctx.call(
        ResourceType::Parameter,
        &spec.name,
        ctx.clients().parameters.put_parameter(spec, overwrite),
    )
    .await
}

pub async fn get_parameter(ctx: &OrchestrationContext, name: &str) -> Result<Parameter> {
    ctx.call(
        ResourceType::Parameter,
        name,
        ctx.clients().parameters.get_parameter(name),
    )
    .await
}

pub async fn delete_parameter(ctx: &OrchestrationContext, name: &str) -> Result<()> {
    tracing::info!("Deleting parameter {}", name);
    ctx.call(
        ResourceType::Parameter,
        name,
        ctx.clients().parameters.delete_parameter(name),
    )
    .await
}

pub async fn list_parameters(ctx: &OrchestrationContext, prefix: &str) -> Result<Vec<Parameter>> {
    ctx.call(
        ResourceType::Parameter,
        prefix,
        ctx.clients().parameters.list_parameters(prefix),
    )
    .await
}
