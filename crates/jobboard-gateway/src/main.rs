use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jobboard_core::JobboardConfig;
use jobboard_postings::PostingStore;
use tracing::info;

mod app;
mod http;

#[derive(Parser)]
#[command(name = "jobboard-gateway", version, about = "Job posting API and pipeline trigger")]
struct Cli {
    /// Path to the TOML config file (default: ./jobboard.toml).
    #[arg(long, env = "JOBBOARD_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (the default).
    Serve,
    /// Upsert postings from a JSON array file into the database.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "jobboard_gateway=info,jobboard_pipeline=info,jobboard_postings=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let config = JobboardConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        JobboardConfig::default()
    });

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    jobboard_postings::db::init_db(&db)?;
    let postings = PostingStore::new(db);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let written = postings.import_json(&json)?;
            println!("imported {written} posting(s) into {db_path}");
            Ok(())
        }
        Command::Serve => serve(config, postings).await,
    }
}

async fn serve(config: JobboardConfig, postings: PostingStore) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;

    if let Err(e) = jobboard_pipeline::PipelineSettings::from_config(&config.pipeline) {
        tracing::warn!("{e}; pipeline runs will end without starting a process");
    }

    let state = Arc::new(app::AppState::new(config.pipeline, postings));
    let router = app::build_router(state);

    info!("jobboard gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
