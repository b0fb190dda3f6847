//! Service registry API (registry entries and namespaces)

use crate::error::ErrorKind;

pub const CUSTOM_HEALTH_NOT_FOUND: &str = "CustomHealthNotFound";
pub const DUPLICATE_REQUEST: &str = "DuplicateRequest";
pub const INSTANCE_NOT_FOUND: &str = "InstanceNotFound";
pub const INVALID_INPUT: &str = "InvalidInput";
pub const NAMESPACE_ALREADY_EXISTS: &str = "NamespaceAlreadyExists";
pub const NAMESPACE_NOT_FOUND: &str = "NamespaceNotFound";
pub const OPERATION_NOT_FOUND: &str = "OperationNotFound";
pub const REQUEST_LIMIT_EXCEEDED: &str = "RequestLimitExceeded";
pub const RESOURCE_IN_USE: &str = "ResourceInUse";
pub const RESOURCE_LIMIT_EXCEEDED: &str = "ResourceLimitExceeded";
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const SERVICE_ALREADY_EXISTS: &str = "ServiceAlreadyExists";
pub const SERVICE_NOT_FOUND: &str = "ServiceNotFound";
pub const TOO_MANY_TAGS: &str = "TooManyTagsException";
pub const ACCESS_DENIED: &str = "AccessDeniedException";

/// Codes a registry teardown loop waits out instead of failing on
pub const REGISTRY_TEARDOWN_RETRYABLE: &[&str] =
    &[RESOURCE_IN_USE, REQUEST_LIMIT_EXCEEDED, DUPLICATE_REQUEST];

pub fn kind_for(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        CUSTOM_HEALTH_NOT_FOUND => ErrorKind::NotFound,
        DUPLICATE_REQUEST => ErrorKind::Conflict,
        INSTANCE_NOT_FOUND => ErrorKind::NotFound,
        INVALID_INPUT => ErrorKind::BadRequest,
        NAMESPACE_ALREADY_EXISTS => ErrorKind::Conflict,
        NAMESPACE_NOT_FOUND => ErrorKind::NotFound,
        OPERATION_NOT_FOUND => ErrorKind::NotFound,
        REQUEST_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        RESOURCE_IN_USE => ErrorKind::Conflict,
        RESOURCE_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        RESOURCE_NOT_FOUND => ErrorKind::NotFound,
        SERVICE_ALREADY_EXISTS => ErrorKind::Conflict,
        SERVICE_NOT_FOUND => ErrorKind::NotFound,
        TOO_MANY_TAGS => ErrorKind::BadRequest,
        ACCESS_DENIED => ErrorKind::Forbidden,
        _ => return None,
    };
    Some(kind)
}
