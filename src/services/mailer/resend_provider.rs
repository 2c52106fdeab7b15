//! Resend HTTP API provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::provider::{EmailMessage, Mailer};
use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

/// Sends mail through `POST {api_url}/emails`.
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("campus-bazaar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration {
                key: "email".to_string(),
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "text": message.text,
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::anyhow!("Failed to reach mail provider: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Mail provider rejected message");
            return Err(AppError::Internal {
                source: anyhow::anyhow!("Failed to send verification email: {status} {body}"),
            });
        }

        debug!(
            to = %message.to,
            duration_ms = start.elapsed().as_millis() as u64,
            "Email accepted by provider"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}
