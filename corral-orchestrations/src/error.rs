//! Error taxonomy shared by every orchestration and the HTTP boundary

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a remote platform client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote API answered with one of its documented error codes
    #[error("{code}: {message}")]
    Vendor { code: String, message: String },

    /// The call never produced a vendor answer (connection reset, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn vendor(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vendor {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Vendor { code, .. } => Some(code),
            RemoteError::Transport(_) => None,
        }
    }
}

/// Closed set of error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    /// The resource exists or is in a state that forbids the operation
    Conflict,
    BadRequest,
    Forbidden,
    LimitExceeded,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::LimitExceeded => "limit_exceeded",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote resource types the engine talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Cluster,
    TaskTemplate,
    Service,
    Task,
    RegistryEntry,
    Namespace,
    Secret,
    Parameter,
    LogEvents,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Cluster => "cluster",
            ResourceType::TaskTemplate => "task template",
            ResourceType::Service => "service",
            ResourceType::Task => "task",
            ResourceType::RegistryEntry => "registry entry",
            ResourceType::Namespace => "namespace",
            ResourceType::Secret => "secret",
            ResourceType::Parameter => "parameter",
            ResourceType::LogEvents => "log stream",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error translated into the uniform taxonomy.
///
/// `message` always names the resource type and identifier involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Original remote failure, if there was one
    #[source]
    pub cause: Option<RemoteError>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: RemoteError) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(resource: ResourceType, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{} {} not found", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn cancelled(resource: ResourceType, id: &str) -> Self {
        Self::internal(format!("request cancelled while calling {} {}", resource, id))
    }

    pub fn timed_out(resource: ResourceType, id: &str) -> Self {
        Self::internal(format!("timed out while calling {} {}", resource, id))
    }

    /// Vendor code of the underlying remote failure
    pub fn vendor_code(&self) -> Option<&str> {
        self.cause.as_ref().and_then(RemoteError::code)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, ClassifiedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_error_display_carries_kind_and_message() {
        let err = ClassifiedError::not_found(ResourceType::Cluster, "shared");
        assert_eq!(err.to_string(), "not_found: cluster shared not found");
        assert!(err.is_not_found());
        assert_eq!(err.vendor_code(), None);
    }

    #[test]
    fn test_vendor_code_comes_from_cause() {
        let err = ClassifiedError::new(ErrorKind::Conflict, "cluster shared: busy")
            .with_cause(RemoteError::vendor("ClusterContainsServicesException", "busy"));
        assert_eq!(err.vendor_code(), Some("ClusterContainsServicesException"));
    }
}
