//! Secret store API

use crate::error::ErrorKind;

pub const ACCESS_DENIED: &str = "AccessDeniedException";
pub const DECRYPTION_FAILURE: &str = "DecryptionFailure";
pub const ENCRYPTION_FAILURE: &str = "EncryptionFailure";
pub const INTERNAL_SERVICE_ERROR: &str = "InternalServiceError";
pub const INVALID_NEXT_TOKEN: &str = "InvalidNextTokenException";
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
pub const INVALID_REQUEST: &str = "InvalidRequestException";
pub const LIMIT_EXCEEDED: &str = "LimitExceededException";
pub const MALFORMED_POLICY_DOCUMENT: &str = "MalformedPolicyDocumentException";
pub const PRECONDITION_NOT_MET: &str = "PreconditionNotMetException";
pub const PUBLIC_POLICY: &str = "PublicPolicyException";
pub const RESOURCE_EXISTS: &str = "ResourceExistsException";
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

pub fn kind_for(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        ACCESS_DENIED => ErrorKind::Forbidden,
        DECRYPTION_FAILURE => ErrorKind::BadRequest,
        ENCRYPTION_FAILURE => ErrorKind::BadRequest,
        INTERNAL_SERVICE_ERROR => ErrorKind::InternalError,
        INVALID_NEXT_TOKEN => ErrorKind::BadRequest,
        INVALID_PARAMETER => ErrorKind::BadRequest,
        // also returned for secrets already scheduled for deletion
        INVALID_REQUEST => ErrorKind::BadRequest,
        LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        MALFORMED_POLICY_DOCUMENT => ErrorKind::BadRequest,
        PRECONDITION_NOT_MET => ErrorKind::BadRequest,
        PUBLIC_POLICY => ErrorKind::Forbidden,
        RESOURCE_EXISTS => ErrorKind::Conflict,
        RESOURCE_NOT_FOUND => ErrorKind::NotFound,
        _ => return None,
    };
    Some(kind)
}
