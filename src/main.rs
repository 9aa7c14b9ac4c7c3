//! Keyline controller binary.

use anyhow::Context;
use clap::Parser;
use keyline::config::Settings;
use keyline::delivery::{DeliveryRegistry, ObjectDeliveryConfig, TargetKind};
use keyline::observability::{init_tracing, LogFormat};
use keyline::reconciler::Controller;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "keyline", version, about = "Secret synchronization controller")]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, default_value = "keyline.yaml")]
    config: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    info!(version = keyline::VERSION, config = %cli.config.display(), "Starting keyline");

    let settings = Settings::from_yaml_file(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;

    let source = settings.build_source().context("building secret source")?;

    let object_config = ObjectDeliveryConfig {
        token: std::env::var("KEYLINE_OBJECT_TOKEN").ok(),
        ..ObjectDeliveryConfig::default()
    };
    if settings.uses_target_kind(TargetKind::Object) && object_config.token.is_none() {
        info!("No KEYLINE_OBJECT_TOKEN set; object deliveries will be unauthenticated");
    }
    let registry =
        DeliveryRegistry::with_defaults(object_config).context("building delivery adapters")?;

    let controller =
        Controller::spawn(settings.sync_specs(), source, &registry, settings.retry_policy())
            .context("starting controller")?;

    shutdown_signal().await;
    info!("Shutdown signal received, draining in-flight cycles");
    controller.shutdown().await;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
