//! Local control API.
//!
//! Provides HTTP endpoints for:
//! - Session status (GET /status)
//! - Stopping the session (POST /stop)
//! - Version info (GET /version)

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::session::SessionStatusHandle;

pub use routes::session::ControlState;

pub struct ApiServer {
    port: u16,
    state: ControlState,
}

impl ApiServer {
    pub fn new(port: u16, status: SessionStatusHandle, stop: CancellationToken) -> Self {
        Self {
            port,
            state: ControlState { status, stop },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/version", get(version))
            .merge(routes::session::router(self.state.clone()))
    }

    pub async fn start(self) -> Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /status        - Get session status");
        info!("  POST /stop          - Ask the session to stop");
        info!("  GET  /version       - Get version info");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meeting-bot"
    }))
}
