//! Corral Orchestrations - composite resource plans over a container platform
//!
//! This crate turns one composite request (cluster, task template, registry entry,
//! credentials, service) into a dependency-ordered sequence of remote calls. Completed
//! steps are compensated newest-first when a later step fails, remote errors are
//! classified into a small kind taxonomy, and deletes that the platform only accepts
//! after earlier deletes have propagated run as background teardown loops.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use corral_orchestrations::{
//!     create_service, MemoryPlatform, OrchestrationContext, OrchestrationPolicy,
//!     PlatformClients, Tenant, TenantDefaults,
//! };
//!
//! # async fn example(request: corral_models::CompositeServiceRequest) -> anyhow::Result<()> {
//! let platform = Arc::new(MemoryPlatform::new());
//! let tenant = Tenant::new(
//!     "acme",
//!     PlatformClients::from_platform(platform),
//!     TenantDefaults::new("acme"),
//! );
//! let ctx = OrchestrationContext::new(Arc::new(tenant), OrchestrationPolicy::default());
//!
//! let detail = create_service(&ctx, request).await?;
//! println!("{} -> {:?}", detail.service.arn, detail.endpoint);
//! # Ok(())
//! # }
//! ```

pub mod activities;
pub mod classify;
pub mod clients;
pub mod context;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod names;
pub mod retry;
pub mod rollback;
pub mod teardown;
pub mod types;

mod orchestrations;

#[cfg(test)]
mod testing;

pub use clients::PlatformClients;
pub use context::{
    OrchestrationContext, OrchestrationPolicy, Tenant, TenantDefaults, TenantRegistry,
};
pub use error::{ClassifiedError, ErrorKind, RemoteError, ResourceType, Result};
pub use memory::MemoryPlatform;
pub use orchestrations::*;
pub use teardown::{TeardownHandle, TeardownOutcome, TeardownReport};
pub use types::*;
