#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use pulse_lib::abuse::{BlockList, FixedWindowLimiter};
use pulse_lib::comments::store::{MemoryCommentStore, StaticPostDirectory};
use pulse_lib::comments::CommentPipeline;
use pulse_lib::config::load_from_path;
use pulse_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use pulse_lib::{AppState, Config, Gateway, KeyScheme, RedisCounterStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time engagement collector")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "demos/config/basic.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&config.logging, &config.telemetry.otel_log_level) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(1);
    }

    info!(listen = %config.listen, locales = config.ingest.locales.len(), "configuration loaded");

    if let Err(err) = run_collector(config).await {
        error!(%err, "collector exited with error");
        std::process::exit(1);
    }
}

async fn run_collector(config: Config) -> pulse_lib::Result<()> {
    let (metrics, registry) = match init_metrics() {
        Ok(pair) => pair,
        Err(err) => {
            return Err(pulse_lib::CollectorError::Config(format!(
                "failed to initialize metrics: {err}"
            )))
        }
    };

    if let Some(port) = config.telemetry.metrics_port {
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(err) = start_observability_server(port, registry).await {
                error!(%err, "observability server exited with error");
            }
        });
    }

    let store = Arc::new(RedisCounterStore::connect(&config.store).await?);
    let keys = KeyScheme::new(config.store.retention_days, config.ingest.trending_ttl_hours);

    let gateway = Arc::new(Gateway::new(
        Arc::clone(&store),
        config.ingest.clone(),
        keys.clone(),
        Some(Arc::clone(&metrics)),
    ));

    // Comment persistence and the post directory are CMS integration
    // points; the standalone binary runs with the in-process fallbacks.
    let limiter = FixedWindowLimiter::new(
        Arc::clone(&store),
        "comment",
        &config.comments.rate_limit,
        Some(Arc::clone(&metrics)),
    );
    let pipeline = Arc::new(CommentPipeline::new(
        limiter,
        Arc::new(BlockList::new()),
        Arc::new(MemoryCommentStore::new()),
        Arc::new(StaticPostDirectory::allow_all()),
        &config.comments,
        config.ingest.salt.clone(),
        Some(Arc::clone(&metrics)),
    ));

    let state = AppState { gateway, comments: pipeline, metrics: Some(metrics) };

    pulse_lib::http::server::run(&config, state).await
}
