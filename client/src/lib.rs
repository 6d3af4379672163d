//! TCP client for the search engine's binary query protocol.
//!
//! A request is a single frame: one command byte, a big-endian page number,
//! and the query phrase as UTF-8 running to the end of the frame. The
//! response is one JSON document terminated by a newline, after which the
//! server closes the connection.

use anyhow::{Context, Result};
use engine::SearchResults;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Command byte selecting a query request.
pub const CMD_QUERY: u8 = 0x00;

#[derive(Debug, Clone)]
pub struct TcpClient {
    host: String,
    port: u16,
}

impl TcpClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Frames a query request: `cmd(1) || page(4, big-endian) || phrase`.
    pub fn prepare_query(phrase: &str, page: u32) -> Vec<u8> {
        let mut request = Vec::with_capacity(5 + phrase.len());
        request.push(CMD_QUERY);
        request.extend_from_slice(&page.to_be_bytes());
        request.extend_from_slice(phrase.as_bytes());
        request
    }

    /// Sends one query and decodes the JSON response.
    pub async fn query(&self, phrase: &str, page: u32) -> Result<SearchResults> {
        let address = self.address();
        let mut stream = TcpStream::connect(&address)
            .await
            .with_context(|| format!("connecting to {address}"))?;

        stream.write_all(&Self::prepare_query(phrase, page)).await?;
        stream.shutdown().await?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        serde_json::from_slice(&response)
            .with_context(|| format!("decoding response from {address}"))
    }
}
