//! Log event API

use crate::error::ErrorKind;

pub const DATA_ALREADY_ACCEPTED: &str = "DataAlreadyAcceptedException";
pub const INVALID_OPERATION: &str = "InvalidOperationException";
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
pub const INVALID_SEQUENCE_TOKEN: &str = "InvalidSequenceTokenException";
pub const LIMIT_EXCEEDED: &str = "LimitExceededException";
pub const MALFORMED_QUERY: &str = "MalformedQueryException";
pub const OPERATION_ABORTED: &str = "OperationAbortedException";
pub const RESOURCE_ALREADY_EXISTS: &str = "ResourceAlreadyExistsException";
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const SERVICE_UNAVAILABLE: &str = "ServiceUnavailableException";
pub const THROTTLING: &str = "ThrottlingException";
pub const UNRECOGNIZED_CLIENT: &str = "UnrecognizedClientException";

pub fn kind_for(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        DATA_ALREADY_ACCEPTED => ErrorKind::Conflict,
        INVALID_OPERATION => ErrorKind::BadRequest,
        INVALID_PARAMETER => ErrorKind::BadRequest,
        INVALID_SEQUENCE_TOKEN => ErrorKind::BadRequest,
        LIMIT_EXCEEDED => ErrorKind::LimitExceeded,
        MALFORMED_QUERY => ErrorKind::BadRequest,
        OPERATION_ABORTED => ErrorKind::Conflict,
        RESOURCE_ALREADY_EXISTS => ErrorKind::Conflict,
        RESOURCE_NOT_FOUND => ErrorKind::NotFound,
        SERVICE_UNAVAILABLE => ErrorKind::InternalError,
        THROTTLING => ErrorKind::LimitExceeded,
        UNRECOGNIZED_CLIENT => ErrorKind::Forbidden,
        _ => return None,
    };
    Some(kind)
}
