use anyhow::Result;
use clap::Parser;
use haulwatch_common::observability::{init_logging, LogConfig};
use haulwatch_config::{HaulwatchConfig, HaulwatchConfigLoader};
use rig::{build_from_config, Rig};
mod rig;

#[derive(Parser, Debug)]
#[command(name = "haulwatch", about = "Watches ati.su load postings and notifies Telegram")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "haulwatch.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: HaulwatchConfig = HaulwatchConfigLoader::new().with_file(&cli.config).load()?;

    init_logging(LogConfig {
        emit_stderr: true,
        default_filter: cfg.logger.level.clone(),
        ..LogConfig::default()
    })?;

    let mut rig = Rig::new();
    build_from_config(&mut rig, cfg).await?;

    rig.run().await
}
