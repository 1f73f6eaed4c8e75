use std::sync::Arc;

use clap::Parser;
use sitewatch::{
    config::read_config_file,
    fetch::HttpFetcher,
    gate::gate_from_config,
    notify::notifier_from_config,
    scheduler::{SchedulerDeps, SchedulerHandle},
    storage::MemoryStore,
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_target("sitewatch", LevelFilter::TRACE);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let targets: Vec<_> = config
        .targets
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|target_config| target_config.into_target())
        .collect();

    debug!("monitoring {} targets", targets.len());

    let deps = SchedulerDeps {
        store: Arc::new(MemoryStore::with_targets(targets).await),
        fetcher: Arc::new(HttpFetcher::new(&config.fetch)?),
        gate: Arc::from(gate_from_config(&config.gate)),
        notifier: Arc::from(notifier_from_config(&config.notifier)),
    };

    let scheduler = SchedulerHandle::spawn(deps, config.interval_secs);

    info!(
        "sitewatch running, polling every {}s (ctrl-c to stop)",
        config.interval_secs
    );

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    scheduler.shutdown().await?;

    Ok(())
}
