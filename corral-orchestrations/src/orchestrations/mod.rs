//! Orchestrations: dependency-ordered plans over the activities.
//!
//! Each orchestration runs inside an `orchestration` span named after its constant in
//! [`crate::names::orchestrations`]. Plans that create resources record a
//! [`RollbackAction`] after every successful step and unwind on the first failure.

mod cluster;
mod service;
mod task_template;

pub use cluster::delete_cluster;
pub use service::{create_service, delete_service, get_service, list_services, update_service};
pub use task_template::{
    create_task_template, delete_task_template, get_task_template, run_task,
    update_task_template,
};

use corral_models::ClusterSpec;

use crate::activities;
use crate::context::OrchestrationContext;
use crate::error::{ClassifiedError, ErrorKind, Result};
use crate::rollback::{RollbackAction, RollbackStack};

/// Create a cluster that must not exist yet.
///
/// Cluster creation is idempotent on the remote side, so an existing cluster is
/// rejected up front rather than adopted and later deleted by a rollback.
pub(crate) async fn create_cluster_step(
    ctx: &OrchestrationContext,
    spec: &ClusterSpec,
    rollback: &mut RollbackStack,
) -> Result<String> {
    match activities::cluster::describe_cluster(ctx, &spec.name).await {
        Ok(_) => {
            return Err(ClassifiedError::new(
                ErrorKind::Conflict,
                format!(
                    "cluster {} already exists; reference it by name instead",
                    spec.name
                ),
            ))
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let cluster = activities::cluster::create_cluster(ctx, spec).await?;
    rollback.push(RollbackAction::DeleteCluster {
        name: cluster.name.clone(),
    });
    Ok(cluster.name)
}
