use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deckgauge::{CatalogKind, ChannelSink, Gauge, Relay, RelayConfig, SlotController, SlotSettings};

#[derive(Parser, Debug)]
#[command(name = "deckgauge")]
#[command(about = "Relay live hardware telemetry to rendered gauge images")]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the producer's IPC channel
    #[arg(short, long)]
    pipe: Option<String>,

    /// Supervisor tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Measurement type to show; repeat for more slots
    #[arg(short, long = "slot", value_name = "TYPE")]
    slots: Vec<String>,

    /// Directory the rendered slot-<n>.svg files are written to
    #[arg(short, long, default_value = "gauges")]
    out_dir: PathBuf,

    /// Measurement-type catalog flavour
    #[arg(long, value_enum)]
    catalog: Option<CatalogKind>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = RelayConfig::load(args.config.as_deref())
        .with_context(|| "failed to load configuration")?;
    if let Some(pipe) = &args.pipe {
        config.pipe_name = pipe.clone();
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(catalog) = args.catalog {
        config.catalog = catalog;
    }
    // Standalone, nobody reports lifecycle edges; keep trying instead.
    config.assume_producer_running = true;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.slots, args.out_dir))
}

async fn run(config: RelayConfig, slots: Vec<String>, out_dir: PathBuf) -> Result<()> {
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let catalog = config.catalog.build();
    let (relay, handle) = Relay::with_connector(&config, config.connector(), catalog.clone());
    let relay_task = relay.spawn();

    let mut controller = SlotController::new(handle.clone(), catalog);
    let mut writers = Vec::new();

    if slots.is_empty() {
        warn!("no --slot given; the connection stays closed until something subscribes");
    }

    for (index, measurement_type) in slots.into_iter().enumerate() {
        let slot = format!("slot-{}", index);
        let (sink, gauges) = ChannelSink::create();
        let settings = SlotSettings {
            enabled: Some(true),
            measurement_type: Some(measurement_type),
        };

        let settings = controller.activate(&slot, settings, Box::new(sink)).await?;
        info!(
            %slot,
            measurement_type = settings.measurement_type.as_deref().unwrap_or_default(),
            "slot active"
        );

        let path = out_dir.join(format!("{}.svg", slot));
        writers.push(tokio::spawn(write_gauges(gauges, path)));
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");

    for index in 0..controller.active_slots() {
        controller.deactivate(&format!("slot-{}", index))?;
    }
    handle.shutdown()?;
    relay_task.await?;

    // The relay dropped every sink on exit, so each writer drains what is
    // queued and returns.
    for writer in writers {
        writer.await?;
    }
    Ok(())
}

/// Write every gauge a slot receives to `path`, replacing the previous image.
async fn write_gauges(mut gauges: mpsc::UnboundedReceiver<Gauge>, path: PathBuf) {
    while let Some(gauge) = gauges.recv().await {
        if let Err(err) = write_svg(&path, &gauge).await {
            error!(path = %path.display(), error = %err, "failed to write gauge");
        }
    }
}

async fn write_svg(path: &Path, gauge: &Gauge) -> std::io::Result<()> {
    let tmp = path.with_extension("svg.tmp");
    tokio::fs::write(&tmp, gauge.to_svg()).await?;
    tokio::fs::rename(&tmp, path).await
}
