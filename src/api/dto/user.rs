//! Profile, directory and rating DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::dto::auth::not_blank;
use crate::models::User;
use crate::services::{ProfileChanges, UserProfile};

/// A user as shown on their profile page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub id: i32,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub location: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
    pub items_sold_count: i32,
    /// Mean rating rounded to one decimal; 0 when unrated
    pub average_rating: f64,
    pub rating_count: i64,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let items_sold_count = profile.items_sold_count();
        let UserProfile { user, summary } = profile;
        Self {
            id: user.id,
            email: user.email,
            email_verified: user.email_verified,
            name: user.name,
            location: user.location,
            created_at: user.created_at,
            items_sold_count,
            average_rating: summary.average_rating,
            rating_count: summary.rating_count,
        }
    }
}

/// Directory search hit.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    /// Substring of email or name
    #[validate(length(min = 1, message = "q must be at least 1 character"))]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct UserListingsQuery {
    /// Only sold (`true`) or only available (`false`) listings
    pub sold: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank", message = "Name must not be blank"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            name: request.name,
            location: request.location,
        }
    }
}

/// Body of `POST /users/{id}/ratings`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RateSellerRequest {
    #[validate(
        required(message = "Rating is required and must be between 1 and 5"),
        range(min = 1, max = 5, message = "Rating is required and must be between 1 and 5")
    )]
    #[schema(minimum = 1, maximum = 5)]
    pub rating: Option<i32>,
    #[serde(alias = "listingId")]
    pub listing_id: i32,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

/// Seller figures after a rating was recorded.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingStatsResponse {
    pub user_id: i32,
    pub average_rating: f64,
    pub rating_count: i64,
    pub items_sold_count: i32,
}

impl From<UserProfile> for RatingStatsResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user.id,
            average_rating: profile.summary.average_rating,
            rating_count: profile.summary.rating_count,
            items_sold_count: profile.items_sold_count(),
        }
    }
}
