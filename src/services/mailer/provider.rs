//! Mail delivery abstraction.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;

/// A plain-text message to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl EmailMessage {
    /// The one-time code email sent at signup, login and resend.
    pub fn verification_code(to: &str, code: &str, ttl_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: "Campus Bazaar Email Verification".to_string(),
            text: format!(
                "Your verification code is {code}. It expires in {ttl_minutes} minutes."
            ),
        }
    }
}

/// Delivers email. Implementations must be cheap to share across requests.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends `message`; any delivery failure is an error.
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_text() {
        let message = EmailMessage::verification_code("sam@illinois.edu", "482913", 15);
        assert_eq!(message.to, "sam@illinois.edu");
        assert_eq!(message.subject, "Campus Bazaar Email Verification");
        assert_eq!(
            message.text,
            "Your verification code is 482913. It expires in 15 minutes."
        );
    }
}
