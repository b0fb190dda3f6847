use serde::{Deserialize, Serialize};

use crate::Tag;

/// Request to create a DNS-discoverable registry entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntrySpec {
    pub name: String,
    pub namespace_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_dns_ttl")]
    pub dns_ttl: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

fn default_dns_ttl() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub namespace_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Namespace {
    pub id: String,
    pub arn: String,
    /// DNS suffix, e.g. `internal.example.net`
    pub name: String,
}
