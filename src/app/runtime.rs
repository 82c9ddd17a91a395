use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, anyhow};
use clap::Parser;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

use crate::analytics::Analytics;
use crate::config::{Config, LogFormat, LoggingConfig};
use crate::scrape::Scraper;

use super::crawl::{AbortTaskOnDrop, build_client, run_crawler};
use super::data_io::{resolve_output, write_report};
use super::types::{Cli, CrawlEvent, CrawlState};

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging, cli.verbose)?;

    let (output_path, output_format) = resolve_output(cli.output.as_deref(), cli.format);
    let policy = Arc::new(config.policy);
    let analytics = Arc::new(Analytics::new(policy.clone()));
    let scraper = Arc::new(Scraper::new(policy.clone(), analytics.clone()));
    let client = build_client(&config.crawl).context("failed to build HTTP client")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = shutdown.clone();
    let ctrl_c_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_flag.store(true, Ordering::Relaxed);
        }
    });
    let _ctrl_c_guard = AbortTaskOnDrop(ctrl_c_task.abort_handle());

    let (tx, mut rx) = mpsc::unbounded_channel::<CrawlEvent>();
    let crawl_handle = tokio::spawn(run_crawler(
        scraper,
        client,
        config.crawl.clone(),
        cli.seeds.clone(),
        shutdown,
        tx,
    ));
    let state = run_headless(&mut rx).await;

    let fetched = match crawl_handle.await {
        Ok(fetched) => fetched,
        Err(err) => {
            tracing::error!(error = %err, "crawler task join error");
            state.fetched
        }
    };

    let report = analytics.report(policy.top_words);
    write_report(&report, &output_path, output_format)
        .with_context(|| format!("failed to write report {output_path}"))?;

    tracing::info!(
        fetched,
        scraped = state.scraped,
        marked_bad = state.marked_bad,
        skipped = state.skipped,
        errors = state.errors,
        unique_pages = report.unique_pages,
        output = %output_path,
        "finished crawl"
    );
    Ok(())
}

async fn run_headless(rx: &mut UnboundedReceiver<CrawlEvent>) -> CrawlState {
    let mut state = CrawlState::default();
    while let Some(event) = rx.recv().await {
        match &event {
            CrawlEvent::Page {
                url,
                status,
                outcome,
                discovered,
            } => {
                tracing::debug!(%url, status, ?outcome, discovered, "page done");
            }
            CrawlEvent::Status(message) => tracing::info!("{message}"),
            CrawlEvent::Error(err) => tracing::warn!("{err}"),
            CrawlEvent::Finished => {}
        }
        state.apply(&event);
        if state.fetched > 0 && state.fetched % 100 == 0 && matches!(event, CrawlEvent::Page { .. })
        {
            tracing::info!(
                fetched = state.fetched,
                scraped = state.scraped,
                discovered = state.discovered,
                "crawl progress"
            );
        }
        if state.done {
            break;
        }
    }
    state
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig, verbosity: u8) -> anyhow::Result<()> {
    let level = config.level.raised_by(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkgate={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| anyhow!("failed to initialise logging: {err}"))
}
