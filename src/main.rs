mod cli;

use crate::cli::{Cli, StoreKind};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use tablemirror::pipeline::Pipeline;
use tablemirror::source::HttpFetcher;
use tablemirror::store::RelationalStore;
use tablemirror::{MemoryStore, MirrorConfig, PostgresStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = MirrorConfig::from_env().context("Failed to load configuration")?;
    cli.apply(&mut config);

    let store: Arc<dyn RelationalStore> = match cli.store {
        StoreKind::Postgres => Arc::new(PostgresStore::new(config.store.clone())),
        StoreKind::Memory => {
            warn!("Using the in-memory store; nothing outlives this process");
            Arc::new(MemoryStore::new())
        }
    };
    let fetcher = Arc::new(
        HttpFetcher::new(config.http_timeout).context("Failed to initialise the HTTP client")?,
    );

    let datasets = cli.datasets();
    let stage = cli.stage();
    info!(
        store = store.name(),
        %stage,
        datasets = datasets.len(),
        target = %config.store.to_url(),
        "Starting"
    );

    let pipeline = Pipeline::new(config, fetcher, store);
    let report = pipeline.run_all(&datasets, stage).await;

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Finished"
    );

    if report.all_failed() {
        bail!("All {} datasets failed", report.failed.len());
    }
    Ok(())
}
