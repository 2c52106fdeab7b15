use diesel::prelude::*;
use jiff::Timestamp;

/// Raw `users` row.
///
/// The verification hash and expiry are two nullable columns in storage; the
/// rest of the crate only ever sees them through [`User::pending_verification`].
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub location: String,
    pub email_verified: bool,
    pub verification_code_hash: Option<String>,
    pub verification_expires_at: Option<jiff_diesel::Timestamp>,
    pub items_sold_count: i32,
    pub created_at: jiff_diesel::Timestamp,
}

/// An outstanding one-time code: both halves exist or neither does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub code_hash: String,
    pub expires_at: Timestamp,
}

impl PendingVerification {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// A marketplace account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    /// Always stored lower-cased
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub location: String,
    pub email_verified: bool,
    pub pending_verification: Option<PendingVerification>,
    pub items_sold_count: i32,
    pub created_at: Timestamp,
}

impl User {
    /// Name shown on listings: the account name, else the local part of the email.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let pending_verification = match (record.verification_code_hash, record.verification_expires_at) {
            (Some(code_hash), Some(expires_at)) => Some(PendingVerification {
                code_hash,
                expires_at: expires_at.to_jiff(),
            }),
            _ => None,
        };

        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            name: record.name,
            location: record.location,
            email_verified: record.email_verified,
            pending_verification,
            items_sold_count: record.items_sold_count,
            created_at: record.created_at.to_jiff(),
        }
    }
}

/// Insert payload for signup. Password must already be hashed.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

/// Self-service profile edits; `None` leaves a column untouched.
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUserProfile {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl UpdateUserProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: 1,
            email: "sam@illinois.edu".to_string(),
            password_hash: "hash".to_string(),
            name: None,
            location: String::new(),
            email_verified: false,
            verification_code_hash: None,
            verification_expires_at: None,
            items_sold_count: 0,
            created_at: jiff_diesel::Timestamp::from(Timestamp::UNIX_EPOCH),
        }
    }

    #[test]
    fn test_verification_pair_collapses_to_option() {
        let user = User::from(record());
        assert!(user.pending_verification.is_none());

        let mut half = record();
        half.verification_code_hash = Some("h".to_string());
        assert!(User::from(half).pending_verification.is_none());

        let mut both = record();
        both.verification_code_hash = Some("h".to_string());
        both.verification_expires_at = Some(jiff_diesel::Timestamp::from(Timestamp::UNIX_EPOCH));
        let pending = User::from(both).pending_verification.expect("pending code");
        assert_eq!(pending.code_hash, "h");
        assert!(pending.is_expired_at(Timestamp::now()));
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let mut user = User::from(record());
        assert_eq!(user.display_name(), "sam");

        user.name = Some("  ".to_string());
        assert_eq!(user.display_name(), "sam");

        user.name = Some("Sam Lee".to_string());
        assert_eq!(user.display_name(), "Sam Lee");
    }
}
