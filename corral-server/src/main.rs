use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod cli;
mod commands;
mod config;

use cli::{Args, Mode};

/// Directory holding the PID file and the server log
pub fn corral_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".corral")
}

/// Initialize tracing with dual output:
/// 1. stderr - for foreground runs
/// 2. File output (~/.corral/server.log) - read by `server logs`
fn initialize_tracing() -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         corral_server=debug,\
         corral_orchestrations=debug,\
         tower_http=debug"
            .into()
    });

    let corral_dir = corral_dir();
    std::fs::create_dir_all(&corral_dir).ok();

    let file_appender = tracing_appender::rolling::never(&corral_dir, "server.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes on drop; it has to live as long as the process
    std::mem::forget(guard);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    initialize_tracing()?;

    match args.mode {
        Mode::Standalone { port } => commands::server::run_standalone_mode(port).await,
        Mode::Create { file, tenant } => commands::service::run_create(file, tenant).await,
        Mode::Delete {
            cluster,
            name,
            recursive,
            wait,
            tenant,
        } => commands::service::run_delete(cluster, name, recursive, wait, tenant).await,
        Mode::List {
            cluster,
            tenant,
            output,
        } => commands::service::run_list(cluster, tenant, output).await,
        Mode::Get {
            cluster,
            name,
            tenant,
            output,
        } => commands::service::run_get(cluster, name, tenant, output).await,
        Mode::Server { command } => commands::server::handle_command(command).await,
    }
}
