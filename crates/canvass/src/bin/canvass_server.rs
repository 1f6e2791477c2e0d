//! Canvass REST Server
//!
//! Serves feedback submission and question answering over HTTP.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use canvass::config::CanvassConfig;
use canvass::server::startup::start_server;

#[derive(Parser)]
#[command(name = "canvass_server")]
#[command(about = "Canvass REST API Server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
  /// Path to a YAML config file (defaults to $CANVASS_CONFIG or ~/.canvass/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Server bind address, overriding the config file
  #[arg(long)]
  bind: Option<SocketAddr>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("canvass=debug,tower_http=debug,info")
  } else {
    EnvFilter::new("canvass=info,warn")
  };

  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let mut config = CanvassConfig::load(args.config.as_deref())?;
  if let Some(bind) = args.bind {
    config.server.bind = bind;
  }

  bentley::announce!("Canvass REST Server v{}", env!("CARGO_PKG_VERSION"));
  bentley::info!("Data directory: {}", config.data_dir.display());
  bentley::info!("Binding to address: {}", config.server.bind);

  start_server(config).await
}
