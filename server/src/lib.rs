//! TCP front end of the search engine: a concurrent accept loop serving the
//! binary query protocol against a frozen [`SearchEngine`].

pub mod artifacts;
pub mod bootstrap;
pub mod protocol;

use anyhow::{bail, Result};
use clap::ValueEnum;
use engine::SearchEngine;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Address family restriction, mirroring the listener networks the service
/// accepts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
}

impl Network {
    fn matches(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Tcp => write!(f, "tcp"),
            Network::Tcp4 => write!(f, "tcp4"),
            Network::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// Resolves `host:port` and binds the first address matching `network`.
pub async fn bind(network: Network, host: &str, port: u16) -> Result<TcpListener> {
    let mut addrs = tokio::net::lookup_host((host, port)).await?;
    let Some(addr) = addrs.find(|a| network.matches(a)) else {
        bail!("no {network} address found for {host}:{port}");
    };
    Ok(TcpListener::bind(addr).await?)
}

/// Accepts connections until the shutdown flag flips, dispatching each onto
/// its own task. Accept errors are logged and the loop continues.
pub async fn run(
    listener: TcpListener,
    engine: Arc<SearchEngine>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(%local, "accepting connections");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let engine = engine.clone();
                    tokio::spawn(handle_connection(stream, peer, engine));
                }
                Err(e) => tracing::warn!(error = %e, "error accepting connection"),
            },
            _ = shutdown.changed() => break,
        }
    }

    tracing::info!(%local, "server closed");
    Ok(())
}

/// Serves one request: a single bounded read, decode, search, one JSON line
/// back. Failures never outlive the connection.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, engine: Arc<SearchEngine>) {
    let mut buffer = [0u8; protocol::READ_BUFFER_SIZE];
    let read = match stream.read(&mut buffer).await {
        Ok(read) => read,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "error reading the connection");
            return;
        }
    };

    let response = match protocol::parse_request(&buffer[..read]) {
        Ok(request) => {
            tracing::info!(
                %peer,
                command = request.command,
                page = request.page,
                phrase = %request.phrase,
                "query request"
            );
            let results = engine.search(request.phrase.trim(), request.page);
            match serde_json::to_string(&results) {
                Ok(body) => body,
                Err(e) => format!("Error: {e}"),
            }
        }
        Err(e) => format!("Error: {e}"),
    };

    if let Err(e) = write_response(&mut stream, &response).await {
        tracing::warn!(%peer, error = %e, "error writing to the connection");
    }
}

async fn write_response(stream: &mut TcpStream, response: &str) -> std::io::Result<()> {
    stream.write_all(response.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await
}
