//! shelfctl entry point.

mod config;
mod remote;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shelf_client::ApiClient;
use shelf_upload::{Dispatcher, StorageApi, UploaderConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shelfctl", version, about = "Command line client for Shelf object storage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload files or directories; the last path is the remote target directory
    Upload {
        /// Local files or directories to upload, followed by the
        /// remote target directory
        #[arg(required = true, num_args = 2..)]
        paths: Vec<String>,

        /// Concurrent upload worker count
        #[arg(short, long, default_value_t = 2)]
        workers: u32,

        /// Upload attempts per file before it is reported failed
        #[arg(short = 'r', long, default_value_t = 3)]
        max_retries: u32,

        /// Remote parent folder id the target path is resolved under
        #[arg(long, default_value_t = 0)]
        parent_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Upload {
            paths,
            workers,
            max_retries,
            parent_id,
        } => upload(paths, workers, max_retries, parent_id).await,
    }
}

async fn upload(
    mut paths: Vec<String>,
    workers: u32,
    max_retries: u32,
    parent_id: i64,
) -> anyhow::Result<()> {
    // clap guarantees at least two paths; the last one is the target.
    let target = paths.pop().expect("clap enforces num_args 2..");
    let inputs: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();

    let config = config::CliConfig::load()?;
    let credentials = config.credentials()?;
    let client = ApiClient::new(config.base_url.clone(), credentials)?;
    let store: Arc<dyn StorageApi> = Arc::new(remote::RemoteStore::new(client));

    let dispatcher = Dispatcher::new(
        store,
        UploaderConfig {
            workers,
            max_retries,
            ..Default::default()
        },
    )?;

    // Ctrl-C lets in-flight work drain instead of killing the process
    // mid-slice.
    let cancel = dispatcher.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight uploads");
            cancel.cancel();
        }
    });

    let report = dispatcher.run(&inputs, &target, parent_id).await?;

    info!(
        total_files = report.total_files,
        total_failed = report.failed_count(),
        "all files processed"
    );
    if !report.all_succeeded() {
        warn!(failed_files = ?report.failed_paths, "upload failed file list");
    }

    // Per-file failures are reported above, not via the exit code.
    Ok(())
}
