use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Tag;

/// Configuration parameter to create or overwrite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored encrypted and masked in listings
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub version: u64,
    pub secure: bool,
    pub last_modified: DateTime<Utc>,
}
