//! 🚀 es2es-cli: the front door, the bouncer, the maitre d' of es2es.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the library do the heavy lifting.
//! Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 🚚 Copy every document of one search index into another, via scroll and bulk.
#[derive(Debug, Parser)]
#[command(name = "es2es-cli", version, about)]
struct Cli {
    /// 🔧 TOML file describing [origin], [destination], [scroll] and [http].
    /// Leave it out and everything comes from ES2ES_* environment variables.
    #[arg(env = "ES2ES_CONFIG")]
    config: Option<PathBuf>,
}

/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Run the transfer (send it and pray 🙏)
/// 5. Handle errors (cry)
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 Validate the config file exists before we get too emotionally attached
    if let Some(config_file) = &cli.config {
        let exists = config_file.try_exists().with_context(|| {
            format!(
                "💀 Couldn't check whether the configuration file exists. Was checking here: '{}'",
                config_file.display()
            )
        })?;
        if !exists {
            anyhow::bail!(
                "💀 Configuration file not found at '{}'. If it's a relative path, remember it's relative to where you ran this, not where the binary lives.",
                config_file.display()
            );
        }
    }

    let app_config = es2es::load_config(cli.config.as_deref())
        .context("💀 Couldn't load the configuration. Make sure [origin] and [destination] both have a url and an index.")?;

    let origin_url = app_config.origin.url.clone();
    let destination_url = app_config.destination.url.clone();

    match es2es::run(app_config).await {
        Ok(summary) => {
            info!("✅ Transfer complete");
            println!("{}", summary.to_table());
            Ok(())
        }
        Err(err) => {
            // 🧅 the whole onion on one line
            error!("💀 {err:#}");
            if let Some(endpoint) = unreachable_endpoint(&err) {
                error!(
                    "🔧 hint: the {} at {endpoint} isn't answering. Is Elasticsearch running there, on that port? ☕",
                    side_of(&endpoint, &origin_url, &destination_url)
                );
            }
            std::process::exit(1);
        }
    }
}

/// 🔌 The scheme://host:port that refused us or timed out, if that's what sank the transfer.
fn unreachable_endpoint(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .find(|cause| cause.is_connect() || cause.is_timeout())
        .and_then(|cause| cause.url())
        .map(|url| url.origin().ascii_serialization())
}

fn side_of(endpoint: &str, origin_url: &str, destination_url: &str) -> &'static str {
    match (origin_url.starts_with(endpoint), destination_url.starts_with(endpoint)) {
        (true, true) => "cluster (origin and destination both)",
        (true, false) => "origin",
        (false, true) => "destination",
        (false, false) => "cluster",
    }
}
