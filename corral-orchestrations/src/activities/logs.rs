//! Log event activities

use corral_models::{LogPage, LogQuery};

use crate::context::OrchestrationContext;
use crate::error::{ResourceType, Result};

pub async fn get_log_events(ctx: &OrchestrationContext, query: &LogQuery) -> Result<LogPage> {
    let stream = format!("{}:{}", query.log_group(), query.log_stream());
    ctx.call(
        ResourceType::LogEvents,
        &stream,
        ctx.clients().logs.get_log_events(query),
    )
    .await
}
