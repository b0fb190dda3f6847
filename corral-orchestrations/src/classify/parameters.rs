//! Parameter store API

use crate::error::ErrorKind;

pub const ACCESS_DENIED: &str = "AccessDeniedException";
pub const HIERARCHY_LEVEL_LIMIT_EXCEEDED: &str = "HierarchyLevelLimitExceededException";
pub const HIERARCHY_TYPE_MISMATCH: &str = "HierarchyTypeMismatchException";
pub const INCOMPATIBLE_POLICY: &str = "IncompatiblePolicyException";
pub const INTERNAL_SERVER_ERROR: &str = "InternalServerError";
pub const INVALID_ALLOWED_PATTERN: &str = "InvalidAllowedPatternException";
pub const INVALID_FILTER_KEY: &str = "InvalidFilterKey";
pub const INVALID_FILTER_OPTION: &str = "InvalidFilterOption";
pub const INVALID_FILTER_VALUE: &str = "InvalidFilterValue";
pub const INVALID_KEY_ID: &str = "InvalidKeyId";
pub const INVALID_NEXT_TOKEN: &str = "InvalidNextToken";
pub const INVALID_POLICY_ATTRIBUTE: &str = "InvalidPolicyAttributeException";
pub const INVALID_POLICY_TYPE: &str = "InvalidPolicyTypeException";
pub const INVALID_RESOURCE_ID: &str = "InvalidResourceId";
pub const INVALID_RESOURCE_TYPE: &str = "InvalidResourceType";
pub const PARAMETER_ALREADY_EXISTS: &str = "ParameterAlreadyExists";
pub const PARAMETER_LIMIT_EXCEEDED: &str = "ParameterLimitExceeded";
pub const PARAMETER_MAX_VERSION_LIMIT_EXCEEDED: &str = "ParameterMaxVersionLimitExceeded";
pub const PARAMETER_NOT_FOUND: &str = "ParameterNotFound";
pub const PARAMETER_PATTERN_MISMATCH: &str = "ParameterPatternMismatchException";
pub const PARAMETER_VERSION_LABEL_LIMIT_EXCEEDED: &str = "ParameterVersionLabelLimitExceeded";
pub const PARAMETER_VERSION_NOT_FOUND: &str = "ParameterVersionNotFound";
pub const POLICIES_LIMIT_EXCEEDED: &str = "PoliciesLimitExceededException";
pub const THROTTLING: &str = "ThrottlingException";
pub const TOO_MANY_TAGS: &str = "TooManyTagsError";
pub const TOO_MANY_UPDATES: &str = "TooManyUpdates";
pub const UNSUPPORTED_PARAMETER_TYPE: &str = "UnsupportedParameterType";

pub fn kind_for(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        ACCESS_DENIED => ErrorKind::Forbidden,
        HIERARCHY_LEVEL_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        HIERARCHY_TYPE_MISMATCH => ErrorKind::BadRequest,
        INCOMPATIBLE_POLICY => ErrorKind::BadRequest,
        INTERNAL_SERVER_ERROR => ErrorKind::InternalError,
        INVALID_ALLOWED_PATTERN => ErrorKind::BadRequest,
        INVALID_FILTER_KEY => ErrorKind::BadRequest,
        INVALID_FILTER_OPTION => ErrorKind::BadRequest,
        INVALID_FILTER_VALUE => ErrorKind::BadRequest,
        INVALID_KEY_ID => ErrorKind::BadRequest,
        INVALID_NEXT_TOKEN => ErrorKind::BadRequest,
        INVALID_POLICY_ATTRIBUTE => ErrorKind::BadRequest,
        INVALID_POLICY_TYPE => ErrorKind::BadRequest,
        INVALID_RESOURCE_ID => ErrorKind::BadRequest,
        INVALID_RESOURCE_TYPE => ErrorKind::BadRequest,
        PARAMETER_ALREADY_EXISTS => ErrorKind::Conflict,
        PARAMETER_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        PARAMETER_MAX_VERSION_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        PARAMETER_NOT_FOUND => ErrorKind::NotFound,
        PARAMETER_PATTERN_MISMATCH => ErrorKind::BadRequest,
        PARAMETER_VERSION_LABEL_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        PARAMETER_VERSION_NOT_FOUND => ErrorKind::NotFound,
        POLICIES_LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        THROTTLING => ErrorKind::LimitExceeded,
        TOO_MANY_TAGS => ErrorKind::BadRequest,
        TOO_MANY_UPDATES => ErrorKind::Conflict,
        UNSUPPORTED_PARAMETER_TYPE => ErrorKind::BadRequest,
        _ => return None,
    };
    Some(kind)
}
