//! Container platform API (clusters, task templates, services, tasks)

use crate::error::ErrorKind;

pub const ACCESS_DENIED: &str = "AccessDeniedException";
pub const ATTRIBUTE_LIMIT_EXCEEDED: &str = "AttributeLimitExceededException";
pub const BLOCKED: &str = "BlockedException";
pub const CLIENT: &str = "ClientException";
pub const CLUSTER_CONTAINS_INSTANCES: &str = "ClusterContainsContainerInstancesException";
pub const CLUSTER_CONTAINS_SERVICES: &str = "ClusterContainsServicesException";
pub const CLUSTER_CONTAINS_TASKS: &str = "ClusterContainsTasksException";
pub const CLUSTER_NOT_FOUND: &str = "ClusterNotFoundException";
pub const CONFLICT: &str = "ConflictException";
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
pub const LIMIT_EXCEEDED: &str = "LimitExceededException";
pub const MISSING_VERSION: &str = "MissingVersionException";
pub const NAMESPACE_NOT_FOUND: &str = "NamespaceNotFoundException";
pub const NO_UPDATE_AVAILABLE: &str = "NoUpdateAvailableException";
pub const PLATFORM_INCOMPATIBLE: &str = "PlatformTaskDefinitionIncompatibilityException";
pub const PLATFORM_UNKNOWN: &str = "PlatformUnknownException";
pub const RESOURCE_IN_USE: &str = "ResourceInUseException";
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const SERVER: &str = "ServerException";
pub const SERVICE_NOT_ACTIVE: &str = "ServiceNotActiveException";
pub const SERVICE_NOT_FOUND: &str = "ServiceNotFoundException";
pub const TARGET_NOT_CONNECTED: &str = "TargetNotConnectedException";
pub const TARGET_NOT_FOUND: &str = "TargetNotFoundException";
pub const TASK_SET_NOT_FOUND: &str = "TaskSetNotFoundException";
pub const THROTTLING: &str = "ThrottlingException";
pub const UNSUPPORTED_FEATURE: &str = "UnsupportedFeatureException";
pub const UPDATE_IN_PROGRESS: &str = "UpdateInProgressException";

/// Codes a cluster teardown loop waits out instead of failing on
pub const CLUSTER_TEARDOWN_RETRYABLE: &[&str] = &[
    CLUSTER_CONTAINS_INSTANCES,
    CLUSTER_CONTAINS_SERVICES,
    CLUSTER_CONTAINS_TASKS,
    UPDATE_IN_PROGRESS,
    RESOURCE_IN_USE,
    LIMIT_EXCEEDED,
];

pub fn kind_for(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        ACCESS_DENIED => ErrorKind::Forbidden,
        ATTRIBUTE_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        BLOCKED => ErrorKind::Forbidden,
        CLIENT => ErrorKind::BadRequest,
        CLUSTER_CONTAINS_INSTANCES => ErrorKind::Conflict,
        CLUSTER_CONTAINS_SERVICES => ErrorKind::Conflict,
        CLUSTER_CONTAINS_TASKS => ErrorKind::Conflict,
        CLUSTER_NOT_FOUND => ErrorKind::NotFound,
        CONFLICT => ErrorKind::Conflict,
        INVALID_PARAMETER => ErrorKind::BadRequest,
        LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        MISSING_VERSION => ErrorKind::BadRequest,
        NAMESPACE_NOT_FOUND => ErrorKind::NotFound,
        NO_UPDATE_AVAILABLE => ErrorKind::Conflict,
        PLATFORM_INCOMPATIBLE => ErrorKind::BadRequest,
        PLATFORM_UNKNOWN => ErrorKind::BadRequest,
        RESOURCE_IN_USE => ErrorKind::Conflict,
        RESOURCE_NOT_FOUND => ErrorKind::NotFound,
        SERVER => ErrorKind::InternalError,
        SERVICE_NOT_ACTIVE => ErrorKind::Conflict,
        SERVICE_NOT_FOUND => ErrorKind::NotFound,
        TARGET_NOT_CONNECTED => ErrorKind::Conflict,
        TARGET_NOT_FOUND => ErrorKind::NotFound,
        TASK_SET_NOT_FOUND => ErrorKind::NotFound,
        THROTTLING => ErrorKind::LimitExceeded,
        UNSUPPORTED_FEATURE => ErrorKind::BadRequest,
        UPDATE_IN_PROGRESS => ErrorKind::Conflict,
        _ => return None,
    };
    Some(kind)
}
