//! Name constants for Corral orchestrations
//!
//! Naming convention: {crate-name}::{type}::{name}. The names label tracing spans
//! and log lines.

/// Orchestration names
pub mod orchestrations {
    /// Create a composite service
    ///
    /// **Input:** [`corral_models::CompositeServiceRequest`], validated into
    /// [`crate::types::ServicePlan`]
    /// **Output:** [`corral_models::ServiceDetail`]
    /// **Steps:** cluster, credentials, task template, registry entry, network
    /// defaults, service
    /// **Rollback:** every completed step, newest first
    pub const CREATE_SERVICE: &str = "corral-orchestrations::orchestration::create-service";

    /// Update a service, registering a new task template revision when needed
    ///
    /// **Input:** [`corral_models::ServiceUpdateRequest`]
    /// **Output:** [`corral_models::ServiceDetail`]
    pub const UPDATE_SERVICE: &str = "corral-orchestrations::orchestration::update-service";

    /// Scale to zero and delete a service; recursively tears down what it used
    ///
    /// **Output:** [`crate::types::ServiceDeletion`]
    /// **Background:** registry and cluster teardown loops
    pub const DELETE_SERVICE: &str = "corral-orchestrations::orchestration::delete-service";

    pub const GET_SERVICE: &str = "corral-orchestrations::orchestration::get-service";

    pub const LIST_SERVICES: &str = "corral-orchestrations::orchestration::list-services";

    /// Register a task template with its credentials
    ///
    /// **Input:** [`corral_models::CompositeTaskTemplateRequest`]
    /// **Output:** [`corral_models::TaskTemplateDetail`]
    pub const CREATE_TASK_TEMPLATE: &str =
        "corral-orchestrations::orchestration::create-task-template";

    /// Register the next revision of a family
    ///
    /// **Input:** [`corral_models::TaskTemplateUpdateRequest`]
    /// **Output:** [`corral_models::TaskTemplateDetail`]
    pub const UPDATE_TASK_TEMPLATE: &str =
        "corral-orchestrations::orchestration::update-task-template";

    /// Deregister one revision, or every active revision of a family
    pub const DELETE_TASK_TEMPLATE: &str =
        "corral-orchestrations::orchestration::delete-task-template";

    pub const GET_TASK_TEMPLATE: &str = "corral-orchestrations::orchestration::get-task-template";

    /// **Input:** [`corral_models::RunTaskRequest`]
    pub const RUN_TASK: &str = "corral-orchestrations::orchestration::run-task";

    /// Start the cluster teardown loop
    ///
    /// **Output:** [`crate::teardown::TeardownHandle`]
    pub const DELETE_CLUSTER: &str = "corral-orchestrations::orchestration::delete-cluster";
}
