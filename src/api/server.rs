//! API server for the delivery service

use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::routes::{self, AppState};

/// Configuration for the API server.
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// HTTP server exposing the delivery and health endpoints.
pub struct ApiServer {
    config: ApiServerConfig,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until the process stops.
    pub async fn start(self, state: Arc<AppState>) -> Result<()> {
        let app = Router::new()
            .route("/v1/delivery", get(routes::get_campaigns))
            .route("/health", get(routes::health))
            .with_state(state)
            .layer(CorsLayer::permissive());

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("starting delivery API on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
