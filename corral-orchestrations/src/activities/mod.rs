//! Activities: one thin async function per remote call.
//!
//! Each activity resolves the tenant's client from the [`OrchestrationContext`], races
//! the call against the request's cancellation token and classifies any failure.
//! Orchestrations never touch the clients directly.
//!
//! [`OrchestrationContext`]: crate::context::OrchestrationContext

pub mod cluster;
pub mod logs;
pub mod parameters;
pub mod registry;
pub mod secrets;
pub mod service;
pub mod task_template;
