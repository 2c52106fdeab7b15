//! User directory: search and self-service profile edits.

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{UpdateUserProfile, User};
use crate::repositories::UserStore;
use crate::services::reputation_service::{ReputationService, UserProfile};

/// Maximum number of users returned by a search.
pub const USER_SEARCH_LIMIT: i64 = 20;

/// Profile fields a user may change; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub location: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    reputation: ReputationService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, reputation: ReputationService) -> Self {
        Self { users, reputation }
    }

    /// Email or name substring search that never returns the caller.
    pub async fn search(&self, caller_id: i32, term: &str) -> AppResult<Vec<User>> {
        if term.is_empty() {
            return Err(AppError::Validation {
                field: "q".to_string(),
                reason: "q must be at least 1 character".to_string(),
            });
        }
        self.users.search(term, caller_id, USER_SEARCH_LIMIT).await
    }

    pub async fn update_profile(
        &self,
        caller_id: i32,
        user_id: i32,
        changes: ProfileChanges,
    ) -> AppResult<UserProfile> {
        if caller_id != user_id {
            return Err(AppError::forbidden("You can only update your own profile"));
        }

        let name = match changes.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation {
                        field: "name".to_string(),
                        reason: "name must be at least 1 character".to_string(),
                    });
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        let update = UpdateUserProfile {
            name,
            location: changes.location,
        };
        if !update.is_empty() {
            self.users.update_profile(user_id, update).await?;
            info!(user_id, "Profile updated");
        }

        self.reputation.profile(user_id).await
    }
}
