//! HTTP/JSON façade in front of the TCP search engine.
//!
//! `POST /api/query` forwards the phrase and page to the engine over its
//! binary protocol and returns the engine's JSON unchanged. Responses are
//! gzip-encoded when the caller's `Accept-Encoding` allows it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use client::TcpClient;
use engine::SearchResults;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

/// Engine endpoint the gateway forwards to.
pub const ENGINE_HOST: &str = "localhost";
pub const ENGINE_PORT: u16 = 3333;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub query: String,
    #[serde(default)]
    pub page: u32,
}

pub fn build_app(engine_host: impl Into<String>, engine_port: u16) -> Router {
    let client = Arc::new(TcpClient::new(engine_host, engine_port));
    Router::new()
        .route("/api/query", post(handle_query))
        .with_state(client)
        .layer(CompressionLayer::new())
}

async fn handle_query(
    State(client): State<Arc<TcpClient>>,
    Json(params): Json<QueryParams>,
) -> Result<Json<SearchResults>, (StatusCode, String)> {
    match client.query(&params.query, params.page).await {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            tracing::warn!(error = %e, "query forwarding failed");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}
