use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use notebook::config::parse_bind_addr;
use notebook::{AppState, Config, ConfigError, Database, api, logging};
use tracing::info;

/// notebook - tagged note-taking HTTP backend
#[derive(Parser)]
#[command(name = "notebook")]
#[command(about = "Serves notes with normalized tags over a JSON HTTP API")]
#[command(version)]
struct Cli {
    /// Dotenv file loaded before reading configuration
    #[arg(long, value_name = "PATH", default_value = ".env")]
    env_file: PathBuf,

    /// Listen address, overrides BIND_ADDR
    #[arg(long, value_name = "HOST:PORT")]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Configuration problems are the operator's to fix; everything else is internal.
        let exit_code = if is_config_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn is_config_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<ConfigError>())
}

fn run(cli: Cli) -> Result<()> {
    // A missing .env is fine; real environment variables always win.
    let env_loaded = dotenvy::from_path(&cli.env_file).is_ok();

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind.as_deref() {
        config.bind = parse_bind_addr(bind)?;
    }
    if let Some(filter) = cli.log {
        config.log_filter = filter;
    }

    let _ = logging::init_logging(&config.log_filter);
    info!(
        env_file = %cli.env_file.display(),
        env_loaded,
        store = %config.store_summary(),
        bind = %config.bind,
        "starting notebook"
    );

    let db = Database::connect(&config.store).context("Failed to open database")?;
    let state = AppState::from_store(Arc::new(db));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind))?;
        api::serve(listener, state, shutdown_signal())
            .await
            .context("HTTP server failed")
    })?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
