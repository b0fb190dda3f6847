use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::ServerCommand;
use crate::config::Config;

pub async fn handle_command(command: ServerCommand) -> Result<()> {
    let corral_dir = crate::corral_dir();
    let pid_file = corral_dir.join("server.pid");
    let log_file = corral_dir.join("server.log");

    match command {
        ServerCommand::Start { port, foreground } => {
            start(port, foreground, &pid_file, &log_file).await
        }
        ServerCommand::Stop => stop(&pid_file).await,
        ServerCommand::Status => status(&pid_file).await,
        ServerCommand::Logs {
            follow,
            tail,
            filter,
        } => logs(&log_file, follow, tail, filter).await,
        ServerCommand::Config => crate::commands::system::config().await,
        ServerCommand::Env { show_secrets } => crate::commands::system::env(show_secrets).await,
    }
}

pub async fn run_standalone_mode(port: Option<u16>) -> Result<()> {
    let config = Config::load()?;
    let port = port.unwrap_or(config.server_port);

    tracing::info!("Starting Corral API server");
    let tenants = config.build_tenants()?;
    if config.api_token.is_none() {
        tracing::warn!("CORRAL_API_TOKEN is not set; /api/* accepts unauthenticated requests");
    }

    let state = crate::api::AppState {
        tenants: Arc::new(tenants),
        policy: config.policy(),
        api_token: config.api_token.clone(),
        teardown_timeout: config.teardown_timeout,
    };

    let host = config.server_host.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = crate::api::start_server(&host, port, state).await {
            tracing::error!("API server error: {}", e);
        }
    });

    tracing::info!("✓ Corral server ready");
    tracing::info!("  API: http://{}:{}", config.server_host, port);
    tracing::info!("  Press Ctrl+C to stop");

    wait_for_shutdown().await?;

    tracing::info!("Shutting down...");
    api_handle.abort();

    Ok(())
}

/// Ctrl+C, or SIGTERM from `server stop`
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

async fn start(port: u16, foreground: bool, pid_file: &Path, log_file: &Path) -> Result<()> {
    use std::process::{Command, Stdio};

    if is_running(pid_file)? {
        let pid = read_pid(pid_file)?;
        tracing::warn!("Server is already running (PID: {})", pid);
        println!("✓ Server is already running");
        println!("  PID: {}", pid);
        println!("  Use 'corral-server server status' for details");
        return Ok(());
    }

    if foreground {
        println!("Starting Corral server in foreground mode...");
        println!("Press Ctrl+C to stop");
        return run_standalone_mode(Some(port)).await;
    }

    if let Some(parent) = pid_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let exe = std::env::current_exe()?;

    println!("Starting Corral server in background...");

    // The child writes its own log file; its stderr goes along for startup panics
    let log_file_handle = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open {}", log_file.display()))?;

    let child = Command::new(exe)
        .args(["standalone", "--port", &port.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::from(log_file_handle))
        .spawn()?;

    std::fs::write(pid_file, child.id().to_string())?;

    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

    if is_running(pid_file)? {
        println!("✓ Server started successfully");
        println!("  PID: {}", child.id());
        println!("  API: http://localhost:{}", port);
        println!("  Logs: {}", log_file.display());
        println!();
        println!("Use 'corral-server server stop' to stop the server");
        println!("Use 'corral-server server logs -f' to view logs");
        Ok(())
    } else {
        std::fs::remove_file(pid_file).ok();
        anyhow::bail!("Server failed to start. Check logs at: {}", log_file.display())
    }
}

async fn stop(pid_file: &Path) -> Result<()> {
    if !pid_file.exists() {
        println!("✗ Server is not running (no PID file found)");
        return Ok(());
    }

    let pid = read_pid(pid_file)?;

    println!("Stopping Corral server (PID: {})...", pid);

    // SIGTERM lets in-flight requests finish their rollback
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            println!("✗ Failed to send stop signal: {}", e);
            std::fs::remove_file(pid_file).ok();
            return Err(anyhow::anyhow!("Process may not be running"));
        }
    }

    #[cfg(not(unix))]
    {
        println!("⚠️  Graceful shutdown not supported on this platform");
        return Err(anyhow::anyhow!("Platform not supported for server management"));
    }

    for i in 0..30 {
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;

        if !is_running(pid_file)? {
            std::fs::remove_file(pid_file).ok();
            println!("✓ Server stopped successfully");
            return Ok(());
        }

        if i == 29 {
            println!("⚠️  Server did not stop gracefully, force killing...");
            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;
                kill(Pid::from_raw(pid), Signal::SIGKILL).ok();
            }
            std::fs::remove_file(pid_file).ok();
        }
    }

    Ok(())
}

async fn status(pid_file: &Path) -> Result<()> {
    if !pid_file.exists() {
        println!("✗ Server is not running");
        return Ok(());
    }

    let pid = read_pid(pid_file)?;

    if is_running(pid_file)? {
        let api_url = api_url();
        println!("✓ Server is running");
        println!("  PID: {}", pid);
        println!("  API: {}", api_url);

        if let Ok(response) = reqwest::get(format!("{}/health", api_url)).await {
            if let Ok(json) = response.json::<serde_json::Value>().await {
                println!(
                    "  Status: {}",
                    json.get("status").and_then(|v| v.as_str()).unwrap_or("unknown")
                );
                println!(
                    "  Version: {}",
                    json.get("version").and_then(|v| v.as_str()).unwrap_or("unknown")
                );
                if let Some(tenants) = json.get("tenants").and_then(|v| v.as_array()) {
                    let names: Vec<&str> = tenants.iter().filter_map(|t| t.as_str()).collect();
                    println!("  Tenants: {}", names.join(", "));
                }
            }
        }
    } else {
        println!("✗ Server is not running (stale PID file)");
        std::fs::remove_file(pid_file).ok();
    }

    Ok(())
}

async fn logs(log_file: &Path, follow: bool, tail: usize, filter: Option<String>) -> Result<()> {
    if !log_file.exists() {
        println!("✗ No log file found at: {}", log_file.display());
        println!("  Server may not have been started yet");
        return Ok(());
    }

    if follow {
        match &filter {
            Some(text) => println!(
                "Following logs from: {} (filtered by: {})",
                log_file.display(),
                text
            ),
            None => println!("Following logs from: {}", log_file.display()),
        }
        println!("Press Ctrl+C to stop");
        println!();

        #[cfg(unix)]
        {
            let path = log_file.display().to_string();
            let status = match filter {
                Some(text) => std::process::Command::new("sh")
                    .args([
                        "-c",
                        "tail -f -n \"$1\" \"$2\" | grep --line-buffered -F -- \"$3\"",
                        "sh",
                        &tail.to_string(),
                        &path,
                        &text,
                    ])
                    .status()?,
                None => std::process::Command::new("tail")
                    .args(["-f", "-n", &tail.to_string(), &path])
                    .status()?,
            };
            if !status.success() {
                anyhow::bail!("Failed to tail logs");
            }
        }

        #[cfg(not(unix))]
        {
            anyhow::bail!("Follow mode not supported on this platform");
        }
    } else {
        let contents = std::fs::read_to_string(log_file)?;
        let lines = last_matching(&contents, filter.as_deref(), tail);

        if let Some(text) = &filter {
            if lines.is_empty() {
                println!("No log entries found containing: {}", text);
                return Ok(());
            }
            println!("Showing {} log entries containing: {}", lines.len(), text);
            println!("{}", "-".repeat(80));
            println!();
        }

        for line in lines {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Last `tail` lines of `contents`, keeping only those containing `filter`
fn last_matching<'a>(contents: &'a str, filter: Option<&str>, tail: usize) -> Vec<&'a str> {
    let matching: Vec<&str> = contents
        .lines()
        .filter(|line| filter.map_or(true, |text| line.contains(text)))
        .collect();
    let start = matching.len().saturating_sub(tail);
    matching[start..].to_vec()
}

fn is_running(pid_file: &Path) -> Result<bool> {
    if !pid_file.exists() {
        return Ok(false);
    }

    let pid = read_pid(pid_file)?;

    #[cfg(unix)]
    {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        // signal 0 only checks that the process exists
        Ok(kill(Pid::from_raw(pid), None).is_ok())
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Ok(true)
    }
}

fn read_pid(pid_file: &Path) -> Result<i32> {
    let contents = std::fs::read_to_string(pid_file)?;
    contents
        .trim()
        .parse::<i32>()
        .map_err(|e| anyhow::anyhow!("Invalid PID file: {}", e))
}

pub fn api_url() -> String {
    std::env::var("CORRAL_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Ensure the API server is reachable before a client command
pub async fn ensure_server_running() -> Result<()> {
    let api_url = api_url();

    if let Ok(response) = reqwest::get(format!("{}/health", api_url)).await {
        if response.status().is_success() {
            return Ok(());
        }
    }

    if !api_url.starts_with("http://localhost") && !api_url.starts_with("http://127.0.0.1") {
        anyhow::bail!(
            "Cannot connect to remote API: {}\nPlease ensure the server is running.",
            api_url
        );
    }

    let pid_file = crate::corral_dir().join("server.pid");

    if is_running(&pid_file)? {
        println!("Server is starting up, waiting...");
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        if let Ok(response) = reqwest::get(format!("{}/health", api_url)).await {
            if response.status().is_success() {
                return Ok(());
            }
        }

        anyhow::bail!("Server is running but not responding. Check logs: corral-server server logs");
    }

    anyhow::bail!("Server is required for this command. Start it with: corral-server server start");
}
