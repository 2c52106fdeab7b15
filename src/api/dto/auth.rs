//! Signup, verification and login payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::services::SignupInput;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignupRequest {
    /// Must end with one of the allowed campus domains
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "sam@illinois.edu", format = "email")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(format = "password", min_length = 8)]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "Name must not be blank"))]
    #[schema(example = "Sam Seller")]
    pub name: Option<String>,
}

impl From<SignupRequest> for SignupInput {
    fn from(request: SignupRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            name: request.name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(format = "email")]
    pub email: String,
    #[validate(length(equal = 6, message = "Verification code must be 6 digits"))]
    #[schema(example = "123456", min_length = 6, max_length = 6)]
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(format = "email")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "sam@illinois.edu", format = "email")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(format = "password")]
    pub password: String,
}

/// Signup accepted, but the account must confirm its email first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPendingResponse {
    pub requires_verification: bool,
    pub email: String,
    pub message: String,
}

impl VerificationPendingResponse {
    pub fn sent(email: String) -> Self {
        Self {
            requires_verification: true,
            email,
            message: "Verification code sent to your email".to_string(),
        }
    }

    pub fn resent(email: String) -> Self {
        Self {
            requires_verification: true,
            email,
            message: "Verification code resent".to_string(),
        }
    }
}
