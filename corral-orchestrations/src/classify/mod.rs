//! Translation of remote error vocabularies into [`ErrorKind`].
//!
//! Each remote API gets its own module holding an exhaustive match over the codes it
//! documents. Codes a module does not recognise become `BadRequest` with the vendor
//! message embedded; failures that never reached the vendor become `InternalError`.

pub mod logs;
pub mod parameters;
pub mod platform;
pub mod registry;
pub mod secrets;

use crate::error::{ClassifiedError, ErrorKind, RemoteError, ResourceType};

/// Classify a remote failure that happened while operating on `resource` `id`
pub fn classify(resource: ResourceType, id: &str, err: RemoteError) -> ClassifiedError {
    let (kind, message) = match &err {
        RemoteError::Vendor { code, message } => match kind_for(resource, code) {
            Some(kind) => (kind, format!("{} {}: {}", resource, id, message)),
            None => (
                ErrorKind::BadRequest,
                format!("{} {}: {} ({})", resource, id, message, code),
            ),
        },
        RemoteError::Transport(detail) => (
            ErrorKind::InternalError,
            format!("{} {}: {}", resource, id, detail),
        ),
    };

    ClassifiedError::new(kind, message).with_cause(err)
}

fn kind_for(resource: ResourceType, code: &str) -> Option<ErrorKind> {
    match resource {
        ResourceType::Cluster
        | ResourceType::TaskTemplate
        | ResourceType::Service
        | ResourceType::Task => platform::kind_for(code),
        ResourceType::RegistryEntry | ResourceType::Namespace => registry::kind_for(code),
        ResourceType::Secret => secrets::kind_for(code),
        ResourceType::Parameter => parameters::kind_for(code),
        ResourceType::LogEvents => logs::kind_for(code),
    }
}
