//! Accounts, credentials, the optional email verification gate and sessions.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use tracing::{error, info, warn};

use crate::config::{IdentityConfig, SessionConfig};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, PendingVerification, User};
use crate::repositories::UserStore;
use crate::services::mailer::{EmailMessage, Mailer};
use crate::utils::jwt::{decode_session_token, issue_session_token};
use crate::utils::password::{hash_secret, verify_secret};
use crate::utils::verification_code::{generate_code, looks_like_code};

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// What a successful signup produced.
#[derive(Debug, Clone)]
pub enum SignupOutcome {
    /// Account is active; the caller should issue a session.
    Authenticated(User),
    /// A code was emailed; no session until it is verified.
    VerificationRequired { email: String },
}

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    identity: Arc<IdentityConfig>,
    session: Arc<SessionConfig>,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        identity: IdentityConfig,
        session: SessionConfig,
    ) -> Self {
        Self {
            users,
            mailer,
            identity: Arc::new(identity),
            session: Arc::new(session),
        }
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    fn ensure_verification_enabled(&self) -> AppResult<()> {
        if self.identity.disable_email_verification {
            return Err(AppError::bad_request("Email verification is disabled"));
        }
        Ok(())
    }

    fn normalize_email(&self, email: &str) -> AppResult<String> {
        let email = email.trim().to_lowercase();
        if !self.identity.is_allowed_email(&email) {
            return Err(AppError::Validation {
                field: "email".to_string(),
                reason: format!(
                    "email must end with {}",
                    self.identity.allowed_email_domains.join(" or ")
                ),
            });
        }
        Ok(email)
    }

    /// Generates, stores and emails a fresh code, replacing any earlier one.
    ///
    /// The code is persisted before sending, so a failed send can be retried
    /// through `resend_verification`.
    async fn issue_code(&self, user: &User) -> AppResult<()> {
        let code = generate_code();
        let pending = PendingVerification {
            code_hash: hash_secret(&code)?,
            expires_at: Timestamp::now() + SignedDuration::from_mins(self.identity.code_ttl_minutes),
        };
        self.users.set_pending_verification(user.id, &pending).await?;

        let message =
            EmailMessage::verification_code(&user.email, &code, self.identity.code_ttl_minutes);
        self.mailer.send(&message).await.inspect_err(|e| {
            error!(user_id = user.id, provider = self.mailer.name(), error = %e, "Failed to send verification email");
        })?;

        info!(user_id = user.id, "Verification code issued");
        Ok(())
    }

    pub async fn signup(&self, input: SignupInput) -> AppResult<SignupOutcome> {
        let email = self.normalize_email(&input.email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Duplicate {
                entity: "user".to_string(),
                field: "email".to_string(),
                value: email,
            });
        }

        let needs_verification = self.identity.requires_verification(&email);
        let user = self
            .users
            .create(NewUser {
                email,
                password_hash: hash_secret(&input.password)?,
                name: input
                    .name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
                email_verified: !needs_verification,
            })
            .await?;

        info!(user_id = user.id, needs_verification, "Account created");

        if needs_verification {
            self.issue_code(&user).await?;
            return Ok(SignupOutcome::VerificationRequired { email: user.email });
        }
        Ok(SignupOutcome::Authenticated(user))
    }

    /// Checks a code and activates the account.
    ///
    /// An already verified account simply authenticates again.
    pub async fn verify_email(&self, email: &str, code: &str) -> AppResult<User> {
        self.ensure_verification_enabled()?;

        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("user", "email", &email))?;

        if user.email_verified {
            return Ok(user);
        }

        let pending = user.pending_verification.as_ref().ok_or_else(|| {
            AppError::bad_request("No verification code found. Please request a new code.")
        })?;
        if pending.is_expired_at(Timestamp::now()) {
            return Err(AppError::bad_request(
                "Verification code expired. Please request a new code.",
            ));
        }
        if !looks_like_code(code) || !verify_secret(code, &pending.code_hash)? {
            warn!(user_id = user.id, "Verification code mismatch");
            return Err(AppError::bad_request("Invalid verification code"));
        }

        let user = self.users.mark_verified(user.id).await?;
        info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Reissues a code; returns the address it was sent to.
    pub async fn resend_verification(&self, email: &str) -> AppResult<String> {
        self.ensure_verification_enabled()?;

        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("user", "email", &email))?;
        if user.email_verified {
            return Err(AppError::conflict("Email already verified"));
        }

        self.issue_code(&user).await?;
        Ok(user.email)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if verify_secret(password, &user.password_hash)? => user,
            _ => return Err(AppError::unauthorized("Invalid credentials")),
        };

        if !user.email_verified && self.identity.requires_verification(&user.email) {
            self.issue_code(&user).await?;
            return Err(AppError::VerificationRequired { email: user.email });
        }

        info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    /// Signs a session token for `user_id`.
    pub fn issue_session(&self, user_id: i32) -> AppResult<String> {
        issue_session_token(user_id, &self.session.secret, self.session.ttl_hours)
    }

    /// Resolves a session token to the user id it was issued for.
    pub fn authenticate(&self, token: &str) -> AppResult<i32> {
        decode_session_token(token, &self.session.secret)?.user_id()
    }
}
