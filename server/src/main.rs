use anyhow::Result;
use clap::Parser;
use server::artifacts::DATA_DIR;
use server::bootstrap::bootstrap;
use server::{bind, run, Network};
use std::path::Path;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Full-text search engine over Wikipedia abstract dumps", long_about = None)]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3333)]
    port: u16,
    /// Listener network
    #[arg(long, value_enum, default_value_t = Network::Tcp)]
    network: Network,
    /// Abstract shard to serve
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..28))]
    index: u8,
    /// Delete files in the data directory before starting
    #[arg(long)]
    clean: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let engine = bootstrap(Path::new(DATA_DIR), args.index as usize, args.clean).await?;
    let listener = bind(args.network, &args.host, args.port).await?;
    tracing::info!(
        network = %args.network,
        host = %args.host,
        port = args.port,
        "search engine listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    run(listener, engine, shutdown_rx).await
}
