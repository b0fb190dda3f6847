use anyhow::Result;

use crate::config::Config;

/// Variables the server reads, with their defaults
const VARIABLES: &[(&str, &str)] = &[
    ("CORRAL_HOST", "0.0.0.0"),
    ("CORRAL_PORT", "8080"),
    ("CORRAL_API_TOKEN", "unset: /api/* is unauthenticated"),
    ("CORRAL_TENANTS_FILE", "unset: single 'default' tenant"),
    ("CORRAL_TEARDOWN_TIMEOUT_SECS", "120"),
    ("CORRAL_RETRY_ATTEMPTS", "5"),
    ("CORRAL_RETRY_DELAY_MS", "500"),
    ("CORRAL_API_URL", "http://localhost:8080"),
    ("RUST_LOG", "info,corral_server=debug,corral_orchestrations=debug"),
];

const SECRET_VARIABLES: &[&str] = &["CORRAL_API_TOKEN"];

pub async fn config() -> Result<()> {
    let config = Config::load()?;
    let policy = config.policy();

    println!("Server Configuration");
    println!("{}", "=".repeat(80));
    println!();

    println!("Server:");
    println!("  Listen:            {}:{}", config.server_host, config.server_port);
    println!(
        "  Auth:              {}",
        if config.api_token.is_some() { "bearer token" } else { "disabled" }
    );
    println!();

    println!("Orchestration:");
    println!("  Retry attempts:    {}", policy.retry_attempts);
    println!("  Retry delay:       {:?}", policy.retry_delay);
    println!("  Teardown wait:     {:?}", config.teardown_timeout);
    println!("  Teardown deadline: {:?}", policy.teardown_deadline);
    println!();

    println!("Tenants:");
    match &config.tenants_file {
        Some(path) => println!("  File:              {}", path.display()),
        None => println!("  File:              not set"),
    }
    for tenant in config.tenant_configs()? {
        let defaults = tenant.defaults();
        println!(
            "  {:<18} org={} subnets={} secret_prefix={} grace_days={}",
            tenant.name,
            defaults.org,
            defaults.network.subnets.len(),
            defaults.secret_prefix,
            defaults.secret_grace_days
        );
    }
    println!();

    let dir = crate::corral_dir();
    println!("Paths:");
    println!("  PID File:          {}", dir.join("server.pid").display());
    println!("  Log File:          {}", dir.join("server.log").display());

    Ok(())
}

pub async fn env(show_secrets: bool) -> Result<()> {
    println!("Environment Variables");
    println!("{}", "=".repeat(80));
    println!();

    for (name, default) in VARIABLES {
        match std::env::var(name) {
            Ok(_) if SECRET_VARIABLES.contains(name) && !show_secrets => {
                println!("  {:<30} ✓ Set (***hidden***)", name)
            }
            Ok(value) => println!("  {:<30} ✓ Set ({})", name, value),
            Err(_) => println!("  {:<30} ✗ Not set (default: {})", name, default),
        }
    }

    if !show_secrets {
        println!();
        println!("Use --show-secrets to reveal hidden values (not recommended)");
    }

    Ok(())
}
