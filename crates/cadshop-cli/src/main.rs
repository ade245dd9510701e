//! CadShop Admin - terminal front end for the admin session gate.
//!
//! Logs in against the storefront auth API (falling back to the configured
//! allow-list when it is unreachable), inspects and verifies the stored
//! session, and opens guarded admin views.

mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cadshop_core::AppConfig;

/// Admin session gate for the CadShop storefront
#[derive(Parser, Debug)]
#[command(name = "cadshop-admin", version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: platform-specific config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store a session
    Login {
        /// Username (default: CADSHOP_ADMIN_USERNAME)
        #[arg(short, long, env = "CADSHOP_ADMIN_USERNAME")]
        username: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show whether a session is stored and who it belongs to
    Status,
    /// Verify the stored session without clearing it
    Verify,
    /// Open a protected view through the route guard
    Open {
        /// Name of the admin view
        #[arg(default_value = "dashboard")]
        view: String,
    },
    /// Hash a password for the fallback allow-list
    HashPassword,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let log_guard = init_tracing(args.log_file.as_deref())?;
    info!("CadShop admin starting");

    let config = load_config(args.config.as_deref())?;

    let ok = match args.command {
        Command::Login { username } => commands::login(&config, username).await?,
        Command::Logout => commands::logout(&config)?,
        Command::Status => commands::status(&config)?,
        Command::Verify => commands::verify(&config).await?,
        Command::Open { view } => commands::open(&config, &view).await?,
        Command::HashPassword => commands::hash_password()?,
    };

    if !ok {
        // Flush the file log before exiting
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
