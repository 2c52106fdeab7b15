use async_trait::async_trait;
use tracing::info;

use super::provider::{EmailMessage, Mailer};
use crate::error::AppResult;

/// Writes messages to the log instead of delivering them. Development only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            text = %message.text,
            "Email delivery disabled; logging message"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
