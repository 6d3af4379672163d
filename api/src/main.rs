use anyhow::Result;
use api::{build_app, ENGINE_HOST, ENGINE_PORT};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "HTTP gateway for the search engine", long_about = None)]
struct Args {
    /// Port to bind
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let app = build_app(ENGINE_HOST, ENGINE_PORT);
    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "api gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
