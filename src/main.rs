use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use kanban_server::{CorsConfig, ServerConfig};
use kanban_settings::KanbanSettings;
use kanban_store::{Database, TaskRepo};
use kanban_telemetry::TelemetryConfig;

/// Task board API server.
#[derive(Debug, Parser)]
#[command(name = "kanban", version)]
struct Cli {
    /// Settings file (defaults to ~/.kanban/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address.
    #[arg(long)]
    host: Option<String>,

    /// Listen port.
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Renumber broken columns and exit.
    #[arg(long)]
    repair_positions: bool,
}

impl Cli {
    fn apply(&self, settings: &mut KanbanSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(db) = &self.db {
            settings.database.path.clone_from(db);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => kanban_settings::load_settings_from_path(path),
        None => kanban_settings::load_settings(),
    }
    .context("failed to load settings")?;
    cli.apply(&mut settings);

    kanban_telemetry::init_telemetry(&TelemetryConfig::from_level_str(
        &settings.logging.level,
        settings.logging.json,
    ));

    let db = Database::open(&settings.database.path).context("failed to open database")?;
    let tasks = TaskRepo::new(db);

    if cli.repair_positions || settings.board.repair_positions_on_start {
        let changed = tasks.repair_positions().context("failed to repair positions")?;
        tracing::info!(changed, "position repair finished");
        if cli.repair_positions {
            return Ok(());
        }
    }

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
        cors: CorsConfig {
            allowed_origins: settings.cors.allowed_origins.clone(),
            allow_credentials: settings.cors.allow_credentials,
        },
    };
    let handle = kanban_server::start(config, tasks)
        .await
        .context("failed to start server")?;

    tracing::info!(port = handle.port, "Kanban server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}
