//! Seller reputation: rating aggregates and the direct rating path.

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{NewRating, RatingSummary, User};
use crate::repositories::{ListingStore, RatingStore, UserStore};

/// A user together with the figures derived from their ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub summary: RatingSummary,
}

impl UserProfile {
    /// Read from the user's counter, not recounted from purchases.
    pub fn items_sold_count(&self) -> i32 {
        self.user.items_sold_count
    }
}

/// Input for `POST /users/{id}/ratings`.
#[derive(Debug, Clone)]
pub struct DirectRating {
    pub ratee_id: i32,
    pub rater_id: i32,
    pub listing_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

pub(crate) fn check_rating_range(rating: i32) -> AppResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation {
            field: "rating".to_string(),
            reason: "Rating is required and must be between 1 and 5".to_string(),
        })
    }
}

#[derive(Clone)]
pub struct ReputationService {
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
    ratings: Arc<dyn RatingStore>,
}

impl ReputationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        ratings: Arc<dyn RatingStore>,
    ) -> Self {
        Self {
            users,
            listings,
            ratings,
        }
    }

    /// Profile with the rating average computed at read time.
    pub async fn profile(&self, user_id: i32) -> AppResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", user_id))?;
        let summary = self.ratings.summary_for(user_id).await?;

        Ok(UserProfile { user, summary })
    }

    /// Rates a seller on one of their listings outside the purchase flow.
    ///
    /// Re-rating the same listing overwrites the earlier score.
    pub async fn rate_seller(&self, input: DirectRating) -> AppResult<UserProfile> {
        if input.ratee_id == input.rater_id {
            return Err(AppError::bad_request("You cannot rate yourself"));
        }
        check_rating_range(input.rating)?;

        if self.users.find_by_id(input.ratee_id).await?.is_none() {
            return Err(AppError::not_found("user", "id", input.ratee_id));
        }
        let listing = self
            .listings
            .find_by_id(input.listing_id)
            .await?
            .ok_or_else(|| AppError::not_found("listing", "id", input.listing_id))?;
        if !listing.is_owned_by(input.ratee_id) {
            return Err(AppError::bad_request("Listing does not belong to this user"));
        }

        self.ratings
            .upsert(NewRating {
                user_id: input.ratee_id,
                rater_id: input.rater_id,
                listing_id: input.listing_id,
                rating: input.rating,
                comment: input.comment,
            })
            .await?;

        info!(
            user_id = input.ratee_id,
            rater_id = input.rater_id,
            listing_id = input.listing_id,
            "Seller rated"
        );

        self.profile(input.ratee_id).await
    }
}
