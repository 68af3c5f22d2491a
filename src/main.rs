//! Interpose CLI

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use interpose::adapter::Adapter;
use interpose::config::Config;
use interpose::network::Server;
use interpose::replay::Broker;

#[derive(Parser, Debug)]
#[command(name = "interpose", version, about = "HTTP adapter that replays recorded interactions")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a cassette over HTTP
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Cassette file, overrides the config
        #[arg(long)]
        cassette: Option<PathBuf>,
        /// Listen address, overrides the config
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Some(Command::Serve {
            config,
            cassette,
            listen,
        }) => serve(resolve_config(config, cassette, listen)?).await,
        None => {
            Args::command().print_help()?;
            Ok(())
        }
    }
}

fn resolve_config(
    path: Option<PathBuf>,
    cassette: Option<PathBuf>,
    listen: Option<SocketAddr>,
) -> anyhow::Result<Config> {
    let mut config = match (path, cassette.clone()) {
        (Some(path), _) => Config::parse_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(cassette)) => Config::new(cassette),
        (None, None) => bail!("either --config or --cassette is required"),
    };

    // Flags win over the file; validate only the merged result
    if let Some(cassette) = cassette {
        config.cassette = cassette;
    }
    if let Some(listen) = listen {
        config.listen = listen;
    }

    config.validate()?;
    Ok(config)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let broker = Broker::from_file(&config.cassette)
        .with_context(|| format!("loading cassette {}", config.cassette.display()))?;

    let adapter =
        Adapter::new(Arc::new(broker)).with_max_request_size(config.limits.max_request_size);

    let server = Server::bind(config.listen, adapter, config.limits.max_connections)
        .await
        .with_context(|| format!("binding {}", config.listen))?;

    server.run().await?;
    Ok(())
}
