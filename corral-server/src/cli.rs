use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Corral - composite container services over a managed platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Run the API server in the foreground
    Standalone {
        /// API port (default: CORRAL_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a composite service from a request file
    Create {
        /// YAML or JSON composite service request
        #[arg(short, long)]
        file: PathBuf,

        /// Tenant to create the service for
        #[arg(short, long, default_value = "default")]
        tenant: String,
    },

    /// Delete a service
    Delete {
        /// Cluster the service runs on
        cluster: String,

        /// Service name
        name: String,

        /// Also remove its task template, credentials, registry entries and an emptied cluster
        #[arg(short, long)]
        recursive: bool,

        /// Seconds to wait for background teardown before reporting
        #[arg(short, long, default_value = "120")]
        wait: u64,

        #[arg(short, long, default_value = "default")]
        tenant: String,
    },

    /// List services on a cluster
    List {
        cluster: String,

        #[arg(short, long, default_value = "default")]
        tenant: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Get details of a specific service
    Get {
        cluster: String,

        name: String,

        #[arg(short, long, default_value = "default")]
        tenant: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Manage local development server
    Server {
        #[command(subcommand)]
        command: ServerCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Start the server in background
    Start {
        /// API port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Run in foreground (default: background)
        #[arg(short, long)]
        foreground: bool,
    },

    /// Stop the server
    Stop,

    /// Check if server is running
    Status,

    /// View server logs
    Logs {
        /// Follow log output
        #[arg(short, long)]
        follow: bool,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "100")]
        tail: usize,

        /// Only show lines containing this text (a request id, a tenant, ...)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show current configuration
    Config,

    /// Show environment variables
    Env {
        /// Show actual secret values (use with caution)
        #[arg(long)]
        show_secrets: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_flags() {
        let args = Args::try_parse_from([
            "corral-server",
            "delete",
            "shared",
            "web",
            "--recursive",
            "--wait",
            "30",
            "--tenant",
            "acme",
        ])
        .unwrap();

        match args.mode {
            Mode::Delete {
                cluster,
                name,
                recursive,
                wait,
                tenant,
            } => {
                assert_eq!(cluster, "shared");
                assert_eq!(name, "web");
                assert!(recursive);
                assert_eq!(wait, 30);
                assert_eq!(tenant, "acme");
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_create_requires_a_file() {
        assert!(Args::try_parse_from(["corral-server", "create"]).is_err());
    }
}
