//! Outbound email with pluggable providers.

mod log_provider;
mod provider;
mod resend_provider;

use std::sync::Arc;

use tracing::info;

use crate::config::{EmailConfig, EmailProvider};
use crate::error::AppResult;

pub use log_provider::LogMailer;
pub use provider::{EmailMessage, Mailer};
pub use resend_provider::ResendMailer;

/// Picks the provider named in `[email]`.
pub fn build_mailer(config: &EmailConfig) -> AppResult<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.provider {
        EmailProvider::Resend => Arc::new(ResendMailer::new(config)?),
        EmailProvider::Log => Arc::new(LogMailer),
    };
    info!(provider = mailer.name(), "Mail provider configured");
    Ok(mailer)
}
