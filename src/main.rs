mod config;

use clap::Parser;
use config::PipelineConfig;
use seine_core::Reader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seine", about = "Shipboard sensor-data acquisition pipeline")]
struct Cli {
    /// Pipeline definition (TOML).
    #[arg(long, short)]
    config: PathBuf,

    /// Write debug logs to /tmp/seine-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/seine-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("seine debug log started; tail -f /tmp/seine-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let cfg = PipelineConfig::load(&cli.config)?;
    let (mut reader, mut writer) = config::build_pipeline(&cfg)?;
    tracing::info!(
        sources = cfg.sources.len(),
        transforms = cfg.transforms.len(),
        "pipeline running"
    );

    while let Some(record) = reader.read()? {
        writer.write(record)?;
    }
    reader.join();
    tracing::info!("all sources exhausted; shutting down");
    Ok(())
}
