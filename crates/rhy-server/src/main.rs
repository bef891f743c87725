// rhy-server: storage service for the chart recorder.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rhy_server::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "rhy-server", about = "Storage server for recorded note charts")]
struct Args {
    /// Path to server config JSON file.
    #[arg(long, default_value = rhy_server::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on (overrides the config file).
    #[arg(long, env = "RHY_BIND")]
    bind: Option<String>,

    /// Write the effective config back to `--config` and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::read_or_default(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
        config.validate();
    }

    if args.write_config {
        config.write(&args.config)?;
        info!(path = %args.config.display(), "Config written");
        return Ok(());
    }

    info!(
        database = %config.database_path.display(),
        objects = %config.object_store_dir.display(),
        "rhy-server starting"
    );
    rhy_server::serve(&config).await
}
