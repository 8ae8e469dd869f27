use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tokio::task::JoinSet;

use grayscale_relay::config::load_config_or_default;
use grayscale_relay::lifecycle::{wait_for_signal, Shutdown};
use grayscale_relay::observability::{logging, metrics};
use grayscale_relay::{HttpServer, Stage};

#[derive(Parser)]
#[command(name = "grayscale-relay", version)]
#[command(about = "Upload → relay → grayscale transform pipeline", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stage to run in this process.
    #[arg(value_enum)]
    stage: StageArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Ingestion,
    Relay,
    Transform,
    /// All three stages in one process.
    All,
}

impl StageArg {
    fn stages(self) -> Vec<Stage> {
        match self {
            StageArg::Ingestion => vec![Stage::Ingestion],
            StageArg::Relay => vec![Stage::Relay],
            StageArg::Transform => vec![Stage::Transform],
            StageArg::All => Stage::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config_or_default(cli.config.as_deref())?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "grayscale-relay starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let mut servers = JoinSet::new();
    for stage in cli.stage.stages() {
        let server = HttpServer::new(stage, &config)?;
        tracing::info!(
            stage = %stage,
            bind_address = %server.listener_config().bind_address,
            tls = server.listener_config().tls.is_some(),
            "Stage configured"
        );
        let rx = shutdown.subscribe();
        servers.spawn(async move { (stage, server.serve(rx).await) });
    }

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let mut failed = false;
    while let Some(joined) = servers.join_next().await {
        match joined {
            Ok((stage, Ok(()))) => tracing::info!(stage = %stage, "Stage stopped"),
            Ok((stage, Err(e))) => {
                tracing::error!(stage = %stage, error = %e, "Stage failed");
                failed = true;
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Stage task panicked");
                failed = true;
                shutdown.trigger();
            }
        }
    }

    tracing::info!("Shutdown complete");
    if failed {
        return Err("one or more stages failed".into());
    }
    Ok(())
}
