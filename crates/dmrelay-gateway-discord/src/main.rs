use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dmrelay::Config;
use dmrelay_gateway_discord::{DiscordConfig, DiscordGateway};

#[derive(Parser)]
#[command(name = "dmrelay-discord", version, about = "Relay Discord direct messages into a server channel")]
struct Args {
    /// Path to the YAML config file.
    #[arg(long, default_value = Config::DEFAULT_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).await?;
    let token = config.token()?;

    DiscordGateway::new(DiscordConfig::from_config(&config, token))
        .run()
        .await
}
