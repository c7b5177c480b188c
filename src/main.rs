//! # Enveloping client
//!
//! Inspects the relays serving an enveloping deployment.
use alloy::providers::{Provider, ProviderBuilder};
use clap::{Parser, Subcommand};
use enveloping::{
    config::EnvelopingConfig,
    context::EnvelopingContext,
    http::{HttpRelayClient, RelayServerApi},
    relays::KnownRelaysManager,
    version::{ENVELOPING_LONG_VERSION, ENVELOPING_SHORT_VERSION},
};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

/// Inspects the relays serving an enveloping deployment.
#[derive(Debug, Parser)]
#[command(
    author,
    about = "Enveloping client",
    version = ENVELOPING_SHORT_VERSION,
    long_version = ENVELOPING_LONG_VERSION,
    long_about = None
)]
struct Args {
    /// Path to a YAML configuration file.
    #[arg(long, value_name = "PATH", env = "ENVELOPING_CONFIG")]
    config: Option<PathBuf>,
    /// The command to run.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover the relays registered in the hub and list every candidate in selection order.
    Relays {
        /// The RPC endpoint of the chain the relay hub is deployed on.
        #[arg(long, value_name = "RPC_ENDPOINT", env = "ENVELOPING_RPC_URL")]
        rpc_url: Url,
    },
    /// Ask a relay server for its hub information.
    Ping {
        /// The relay server URL.
        url: Url,
    },
    /// Print the effective configuration.
    Config,
}

impl Args {
    async fn run(self) -> eyre::Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();

        let config = match &self.config {
            Some(path) => EnvelopingConfig::load_from_file(path)?,
            None => EnvelopingConfig::default(),
        };

        match self.command {
            Command::Config => {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Command::Ping { url } => {
                let http = HttpRelayClient::new(config.http_timeout)?;
                let hub_info =
                    http.chain_info(url.as_str(), Some(config.relay_verifier_address)).await?;
                println!("{}", serde_json::to_string_pretty(&hub_info)?);
            }
            Command::Relays { rpc_url } => {
                let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
                let chain_id = provider.get_chain_id().await?;
                if chain_id != config.chain_id {
                    eyre::bail!(
                        "chain id {chain_id} does not match configured {}",
                        config.chain_id
                    );
                }

                let known_relays =
                    KnownRelaysManager::new(EnvelopingContext::new(provider, config));
                known_relays.refresh().await?;

                let [preferred, discovered] = known_relays.relays_sorted_for_transaction().await;
                info!(preferred = preferred.len(), discovered = discovered.len(), "Known relays");
                for relay in preferred {
                    println!("preferred  {}", relay.url);
                }
                for relay in discovered {
                    println!("discovered {} {}", relay.url, relay.manager);
                }
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = args.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
