use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use weather_core::{Config, ProviderId};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather aggregation API server")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server.
    Serve {
        /// Address to bind, overrides config and `BIND_ADDR`.
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on, overrides config and `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind, port } => {
                let mut config = weather_server::load_config(self.config.as_deref())?;
                if let Some(bind) = bind {
                    config.server.bind = bind;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                weather_server::run_server(config).await
            }
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };

                let api_key = Password::new(&format!("API key for {}:", id.label()))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let mut config = Config::load_from(&path)?;
                config.upsert_provider_api_key(id, api_key.trim().to_string());
                config.save_to(&path)?;

                println!("Saved {} credentials to {}", id.label(), path.display());
                Ok(())
            }
        }
    }
}
