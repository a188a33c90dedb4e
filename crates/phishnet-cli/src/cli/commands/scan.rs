//! `phishnet scan` - score files against the reputation service.

use anyhow::{Context as _, Result};
use phishnet::{batch, CancellationToken, ReputationClient, ScanConfig, ScanOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::Context;
use crate::cli::args::ScanArgs;
use crate::output;

pub async fn execute(ctx: Context, args: ScanArgs) -> Result<()> {
    let scan_config = scan_config(&ctx.config.scan, &args);
    let scanner = build_scanner(&ctx, scan_config)?;

    let files = batch::collect_files(&args.path)
        .await
        .with_context(|| format!("cannot scan {}", args.path.display()))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling outstanding scans");
            on_interrupt.cancel();
        }
    });

    let scans = batch::scan_paths(&scanner, &files, &cancel).await?;
    output::print_scans(&scans, ctx.output_format)
}

/// Command-line overrides on top of the configured tunables
fn scan_config(base: &ScanConfig, args: &ScanArgs) -> ScanConfig {
    let mut config = base.clone();
    if let Some(concurrency) = args.concurrency {
        config = config.max_concurrency(concurrency);
    }
    if let Some(secs) = args.poll_interval {
        config = config.poll_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = args.timeout {
        config = config.timeout(Duration::from_secs(secs));
    }
    config
}

fn build_scanner(ctx: &Context, config: ScanConfig) -> Result<ScanOrchestrator> {
    let Some(key) = ctx.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        return Ok(ScanOrchestrator::disabled(config));
    };

    let mut client = ReputationClient::builder(key);
    if let Some(url) = &ctx.config.base_url {
        client = client.base_url(url);
    }
    if let Some(limit) = config.requests_per_minute {
        client = client.requests_per_minute(limit);
    }

    Ok(ScanOrchestrator::new(Arc::new(client.build()?), config))
}
