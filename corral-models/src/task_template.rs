use serde::{Deserialize, Serialize};

use crate::Tag;

/// Environment variable passed to a container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    #[serde(default)]
    pub host_port: Option<u16>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "tcp".to_string()
}

/// Reference to an already-stored registry credential secret
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryCredentials {
    /// ARN of the secret holding the credential
    pub credentials_parameter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub cpu: Option<u32>,
    #[serde(default)]
    pub memory: Option<u32>,
    #[serde(default = "default_essential")]
    pub essential: bool,
    #[serde(default)]
    pub environment: Vec<KeyValuePair>,
    #[serde(default)]
    pub port_mappings: Vec<PortMapping>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub repository_credentials: Option<RepositoryCredentials>,
}

fn default_essential() -> bool {
    true
}

impl ContainerDefinition {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            cpu: None,
            memory: None,
            essential: true,
            environment: Vec::new(),
            port_mappings: Vec::new(),
            command: Vec::new(),
            repository_credentials: None,
        }
    }

    /// ARN of the credential secret this container pulls with, if any
    pub fn credentials_arn(&self) -> Option<&str> {
        self.repository_credentials
            .as_ref()
            .map(|c| c.credentials_parameter.as_str())
    }
}

/// Request to register a task template revision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTemplateSpec {
    /// Template family; every registration adds a revision to it
    pub family: String,
    /// CPU units, e.g. "256"
    pub cpu: String,
    /// Memory in MiB, e.g. "512"
    pub memory: String,
    #[serde(default = "default_network_mode")]
    pub network_mode: String,
    #[serde(default)]
    pub execution_role: Option<String>,
    pub containers: Vec<ContainerDefinition>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

fn default_network_mode() -> String {
    "awsvpc".to_string()
}

impl TaskTemplateSpec {
    /// First container name that appears more than once
    pub fn duplicate_container_name(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.containers
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    pub fn container(&self, name: &str) -> Option<&ContainerDefinition> {
        self.containers.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskTemplateStatus {
    Active,
    Inactive,
}

/// A registered, immutable task template revision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskTemplate {
    pub family: String,
    pub revision: u32,
    pub arn: String,
    pub status: TaskTemplateStatus,
    pub cpu: String,
    pub memory: String,
    pub network_mode: String,
    #[serde(default)]
    pub execution_role: Option<String>,
    pub containers: Vec<ContainerDefinition>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl TaskTemplate {
    /// `family:revision` identifier
    pub fn id(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }

    /// Spec that would register an identical new revision
    pub fn to_spec(&self) -> TaskTemplateSpec {
        TaskTemplateSpec {
            family: self.family.clone(),
            cpu: self.cpu.clone(),
            memory: self.memory.clone(),
            network_mode: self.network_mode.clone(),
            execution_role: self.execution_role.clone(),
            containers: self.containers.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn container(&self, name: &str) -> Option<&ContainerDefinition> {
        self.containers.iter().find(|c| c.name == name)
    }
}

/// Parse `family` or `family:revision`
pub fn parse_template_id(id: &str) -> (&str, Option<u32>) {
    match id.rsplit_once(':') {
        Some((family, revision)) => match revision.parse() {
            Ok(rev) => (family, Some(rev)),
            Err(_) => (id, None),
        },
        None => (id, None),
    }
}
