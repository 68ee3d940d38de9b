use clap::Parser;
use impactbot::archive::Archiver;
use impactbot::batch::Batch;
use impactbot::config::Config;
use impactbot::dataset;
use impactbot::summary::FsSummaryStore;
use tracing::info;

async fn real_main() -> color_eyre::Result<()> {
    let config = Config::parse();

    let records = dataset::load(&config.dataset)?;
    info!(rows = records.len(), "loaded {}", config.dataset.display());

    let archiver = if config.archive {
        Some(Archiver::new(config.timeout())?)
    } else {
        None
    };

    let report = Batch::new(
        config.api_url.clone(),
        config.credentials(),
        FsSummaryStore::new(&config.summaries),
    )
    .edit_summary(&config.edit_summary)
    .delay(config.delay())
    .timeout(config.timeout())
    .archiver(archiver)
    .run(&records)
    .await?;

    report.log_summary();
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    impactbot::setup(real_main)
}
