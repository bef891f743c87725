// rhy-recorder: record note charts against an audio track.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rhy_input::KeyBindings;
use tracing::{info, warn};

use rhy_recorder::{RecorderConfig, SessionContext};

#[derive(Parser, Debug)]
#[command(name = "rhy-recorder", about = "Record rhythm-game note charts")]
struct Args {
    /// Path to recorder config JSON file.
    #[arg(long, default_value = rhy_recorder::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Storage server URL (overrides the config file).
    #[arg(long, env = "RHY_SERVER_URL")]
    server: Option<String>,

    /// Write the effective config and key bindings to disk and exit.
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = RecorderConfig::read_or_default(&args.config)?;
    if let Some(server) = args.server {
        config.server_url = server;
        config.validate();
    }

    let bindings = KeyBindings::load_from(&config.key_bindings_path)?;
    if args.write_config {
        config.write(&args.config)?;
        bindings.save_to(&config.key_bindings_path)?;
        info!(path = %args.config.display(), "Config written");
        return Ok(());
    }
    let key_map = bindings.to_key_map()?;

    let context = SessionContext::load(&config.session_path).unwrap_or_else(|e| {
        warn!("Starting logged out: {e:#}");
        SessionContext::default()
    });

    info!(server = %config.server_url, lanes = key_map.lane_count(), "rhy-recorder starting");
    rhy_recorder::run(config, key_map, context)
}
