//! Runs catalog demos against a live backend without a browser and writes
//! the resulting trace to a file.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use smarthome_api_client::{ApiClientConfig, LogTraceSink, normalize_base_url, native_panel};
use smarthome_panel_core::{ACTION_CATALOG, MemoryPage, MemoryTraceSink, PanelConfig};

#[derive(Parser, Debug)]
#[command(about = "Exercise the smart-home panel against a running backend")]
struct Args {
    /// Backend origin. Defaults to SMARTHOME_API_BASE_URL, then the local backend.
    #[arg(long)]
    base_url: Option<String>,

    /// Api base path prepended to every endpoint.
    #[arg(long)]
    api_base: Option<String>,

    /// Pattern ids to run, in order. Runs the whole catalog when omitted.
    #[arg(long = "pattern")]
    patterns: Vec<String>,

    /// File receiving the rendered trace, newest entry last.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = match args.base_url.as_deref() {
        Some(base_url) => ApiClientConfig::new(normalize_base_url(base_url)?),
        None => ApiClientConfig::from_env()?,
    };
    let config = PanelConfig::default().with_api_base_path(args.api_base.as_deref())?;

    let page = Rc::new(MemoryPage::new());
    let trace = Rc::new(MemoryTraceSink::new());
    let mut panel = native_panel(client.clone(), page, config)?;
    panel.add_sink(Rc::new(LogTraceSink));
    panel.add_sink(trace.clone());

    tracing::info!(base_url = %client.base_url, "probing backend");
    panel.boot().await;

    let patterns = if args.patterns.is_empty() {
        ACTION_CATALOG
            .iter()
            .map(|descriptor| descriptor.id.to_string())
            .collect()
    } else {
        args.patterns
    };
    let mut failed = 0_usize;
    for pattern in &patterns {
        if panel.run_pattern(pattern).await.is_none() {
            failed += 1;
        }
    }
    tracing::info!(ran = patterns.len(), failed, "probe finished");

    if let Some(path) = args.output {
        let rendered = trace
            .entries()
            .iter()
            .map(|entry| entry.render())
            .collect::<Vec<_>>()
            .join("\n\n");
        std::fs::write(&path, rendered)
            .with_context(|| format!("write trace to {}", path.display()))?;
    }
    Ok(())
}
