//! Bot manager callbacks.
//!
//! The bot manager that launched this process learns about the session
//! through two JSON POSTs: `<url>/started` once the bot is admitted and
//! `<url>/exited` when it terminates.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::{ErrorDetail, SessionConfig, SessionOutcome};

/// Fire-and-forget notification that the session went live.
#[async_trait]
pub trait StartupNotifier: Send + Sync {
    async fn notify_startup(&self, config: &SessionConfig) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct StartedPayload<'a> {
    connection_id: Option<&'a str>,
    session_id: Uuid,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ExitedPayload<'a> {
    connection_id: Option<&'a str>,
    session_id: Uuid,
    exit_code: i32,
    reason: &'a str,
    error_details: Option<&'a ErrorDetail>,
}

#[derive(Clone)]
pub struct CallbackClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl CallbackClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build callback HTTP client")?;

        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Self { client, base_url })
    }

    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    pub async fn report_exit(&self, config: &SessionConfig, outcome: &SessionOutcome) -> Result<()> {
        let payload = ExitedPayload {
            connection_id: config.connection_id.as_deref(),
            session_id: config.session_id,
            exit_code: outcome.exit_code(),
            reason: outcome.reason.as_str(),
            error_details: outcome.error.as_ref(),
        };
        self.post("exited", &payload).await
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<()> {
        let Some(base_url) = &self.base_url else {
            debug!("No callback URL configured, skipping /{} callback", path);
            return Ok(());
        };

        let url = format!("{}/{}", base_url, path);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach bot manager at {}", url))?;

        response
            .error_for_status()
            .with_context(|| format!("Bot manager rejected /{} callback", path))?;

        info!("Sent /{} callback to bot manager", path);
        Ok(())
    }
}

#[async_trait]
impl StartupNotifier for CallbackClient {
    async fn notify_startup(&self, config: &SessionConfig) -> Result<()> {
        let payload = StartedPayload {
            connection_id: config.connection_id.as_deref(),
            session_id: config.session_id,
            status: "active",
        };
        self.post("started", &payload).await
    }
}
