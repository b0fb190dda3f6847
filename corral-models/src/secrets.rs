use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Tag;

/// Plaintext credential a client wants stored for one container.
///
/// The value never appears in `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialSpec {
    pub secret_string: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("secret_string", &"<redacted>")
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretCreateSpec {
    pub name: String,
    pub secret_string: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl fmt::Debug for SecretCreateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCreateSpec")
            .field("name", &self.name)
            .field("secret_string", &"<redacted>")
            .field("description", &self.description)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Identity of a stored secret version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretHandle {
    pub arn: String,
    pub name: String,
    pub version_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretSummary {
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub last_changed: DateTime<Utc>,
    /// Set once a deletion has been scheduled
    #[serde(default)]
    pub deletion_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretDeletion {
    pub arn: String,
    pub deletion_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let spec = CredentialSpec {
            secret_string: "hunter2".to_string(),
            description: Some("registry pull".to_string()),
        };
        let debug = format!("{:?}", spec);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
