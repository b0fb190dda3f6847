use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use corral_models::NetworkConfiguration;
use corral_orchestrations::{
    MemoryPlatform, OrchestrationPolicy, PlatformClients, Tenant, TenantDefaults,
    TenantRegistry,
};
use serde::Deserialize;

/// Tenant used when no tenants file is configured
pub const DEFAULT_TENANT: &str = "default";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Bearer token required on `/api/*`; unset disables auth
    pub api_token: Option<String>,
    pub tenants_file: Option<PathBuf>,
    /// How long a DELETE waits for its teardown loops by default
    pub teardown_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: std::env::var("CORRAL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env_or("CORRAL_PORT", "8080")
                .parse()
                .context("CORRAL_PORT must be a valid port number")?,
            api_token: std::env::var("CORRAL_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            tenants_file: std::env::var("CORRAL_TENANTS_FILE").ok().map(PathBuf::from),
            teardown_timeout: Duration::from_secs(
                env_or("CORRAL_TEARDOWN_TIMEOUT_SECS", "120")
                    .parse()
                    .context("CORRAL_TEARDOWN_TIMEOUT_SECS must be a number of seconds")?,
            ),
            retry_attempts: env_or("CORRAL_RETRY_ATTEMPTS", "5")
                .parse()
                .context("CORRAL_RETRY_ATTEMPTS must be a number")?,
            retry_delay: Duration::from_millis(
                env_or("CORRAL_RETRY_DELAY_MS", "500")
                    .parse()
                    .context("CORRAL_RETRY_DELAY_MS must be a number of milliseconds")?,
            ),
        })
    }

    pub fn policy(&self) -> OrchestrationPolicy {
        OrchestrationPolicy {
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay,
            ..OrchestrationPolicy::default()
        }
    }

    pub fn tenant_configs(&self) -> Result<Vec<TenantConfig>> {
        match &self.tenants_file {
            Some(path) => load_tenants_file(path),
            None => Ok(vec![TenantConfig::named(DEFAULT_TENANT)]),
        }
    }

    /// Build the read-only tenant map, one in-memory platform per tenant
    pub fn build_tenants(&self) -> Result<TenantRegistry> {
        let mut builder = TenantRegistry::builder();
        for tenant in self.tenant_configs()? {
            tracing::info!(
                "Configured tenant {} (org {}, {} namespace(s))",
                tenant.name,
                tenant.org(),
                tenant.namespaces.len()
            );
            builder = builder.tenant(tenant.into_tenant());
        }
        Ok(builder.build())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Deserialize)]
struct TenantsFile {
    tenants: Vec<TenantConfig>,
}

/// One entry of the tenants file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TenantConfig {
    pub name: String,
    /// Ownership tag value; defaults to the tenant name
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub assign_public_ip: bool,
    #[serde(default)]
    pub secret_prefix: Option<String>,
    #[serde(default)]
    pub secret_grace_days: Option<u32>,
    /// Registry namespaces seeded into the in-memory platform
    #[serde(default)]
    pub namespaces: Vec<NamespaceConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub id: String,
    pub name: String,
}

impl TenantConfig {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            org: None,
            subnets: Vec::new(),
            security_groups: Vec::new(),
            assign_public_ip: false,
            secret_prefix: None,
            secret_grace_days: None,
            namespaces: Vec::new(),
        }
    }

    pub fn org(&self) -> &str {
        self.org.as_deref().unwrap_or(&self.name)
    }

    pub fn defaults(&self) -> TenantDefaults {
        let mut defaults = TenantDefaults::new(self.org());
        defaults.network = NetworkConfiguration {
            subnets: self.subnets.clone(),
            security_groups: self.security_groups.clone(),
            assign_public_ip: self.assign_public_ip,
        };
        if let Some(prefix) = &self.secret_prefix {
            defaults.secret_prefix = prefix.clone();
        }
        if let Some(days) = self.secret_grace_days {
            defaults.secret_grace_days = days;
        }
        defaults
    }

    fn into_tenant(self) -> Tenant {
        let platform = Arc::new(MemoryPlatform::new());
        for namespace in &self.namespaces {
            platform.add_namespace(&namespace.id, &namespace.name);
        }
        let defaults = self.defaults();
        Tenant::new(self.name, PlatformClients::from_platform(platform), defaults)
    }
}

fn load_tenants_file(path: &Path) -> Result<Vec<TenantConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tenants file {}", path.display()))?;
    parse_tenants(&raw).with_context(|| format!("Invalid tenants file {}", path.display()))
}

fn parse_tenants(raw: &str) -> Result<Vec<TenantConfig>> {
    let file: TenantsFile = serde_yaml::from_str(raw)?;
    if file.tenants.is_empty() {
        anyhow::bail!("at least one tenant is required");
    }
    let mut seen = std::collections::HashSet::new();
    for tenant in &file.tenants {
        if !seen.insert(tenant.name.as_str()) {
            anyhow::bail!("tenant {} is listed twice", tenant.name);
        }
    }
    Ok(file.tenants)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TENANTS: &str = r#"
tenants:
  - name: acme
    org: acme-corp
    subnets: [subnet-a, subnet-b]
    security_groups: [sg-web]
    secret_grace_days: 14
    namespaces:
      - id: ns-internal
        name: internal.acme
  - name: globex
"#;

    #[test]
    fn test_parse_tenants_file() {
        let tenants = parse_tenants(TENANTS).unwrap();

        assert_eq!(tenants.len(), 2);
        let acme = tenants[0].defaults();
        assert_eq!(acme.org, "acme-corp");
        assert_eq!(acme.network.subnets, vec!["subnet-a", "subnet-b"]);
        assert_eq!(acme.secret_grace_days, 14);
        assert_eq!(acme.secret_prefix, "corral");
        assert_eq!(tenants[0].namespaces[0].name, "internal.acme");

        let globex = tenants[1].defaults();
        assert_eq!(globex.org, "globex");
        assert!(globex.network.subnets.is_empty());
    }

    #[test]
    fn test_duplicate_tenants_are_rejected() {
        let err = parse_tenants("tenants:\n  - name: a\n  - name: a\n").unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_empty_tenants_file_is_rejected() {
        assert!(parse_tenants("tenants: []\n").is_err());
    }
}
