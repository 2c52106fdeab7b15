//! User directory, profiles and direct seller ratings.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    ErrorResponse, ListingResponse, RateSellerRequest, RatingStatsResponse, UpdateProfileRequest,
    UserListingsQuery, UserProfileResponse, UserSearchQuery, UserSummary,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::services::DirectRating;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Routes:
/// - `GET /search?q=`
/// - `GET /{id}`, `PUT /{id}`
/// - `GET /{id}/listings?sold=`
/// - `POST /{id}/ratings`
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(search_users))
        .routes(routes!(get_profile, update_profile))
        .routes(routes!(user_listings))
        .routes(routes!(rate_seller))
}

/// GET /api/users/search - Find other users by email or name
#[utoipa::path(
    get,
    path = "/search",
    tag = USER_TAG,
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Up to 20 matching users, never the caller", body = Vec<UserSummary>),
        (status = 400, description = "Empty search term", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn search_users(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<UserSearchQuery>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let users = state.services.users.search(user.user_id, &query.q).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// GET /api/users/{id} - Public profile with rating figures
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile", body = UserProfileResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserProfileResponse>> {
    let profile = state.services.reputation.profile(id).await?;
    Ok(Json(profile.into()))
}

/// PUT /api/users/{id} - Edit one's own name or location
#[utoipa::path(
    put,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfileResponse),
        (status = 403, description = "Not the caller's profile", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserProfileResponse>> {
    let profile = state
        .services
        .users
        .update_profile(user.user_id, id, payload.into())
        .await?;
    Ok(Json(profile.into()))
}

/// GET /api/users/{id}/listings - A user's listings, newest first
#[utoipa::path(
    get,
    path = "/{id}/listings",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User id"), UserListingsQuery),
    responses((status = 200, description = "Listings owned by the user", body = Vec<ListingResponse>))
)]
async fn user_listings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedQuery(query): ValidatedQuery<UserListingsQuery>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let listings = state.services.listings.list_by_owner(id, query.sold).await?;
    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

/// POST /api/users/{id}/ratings - Rate a seller on one of their listings
#[utoipa::path(
    post,
    path = "/{id}/ratings",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "Seller's user id")),
    request_body = RateSellerRequest,
    responses(
        (status = 201, description = "Rating recorded", body = RatingStatsResponse),
        (status = 400, description = "Self rating, bad score or listing not owned by the seller", body = ErrorResponse),
        (status = 404, description = "No such user or listing", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn rate_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<RateSellerRequest>,
) -> AppResult<(StatusCode, Json<RatingStatsResponse>)> {
    let profile = state
        .services
        .reputation
        .rate_seller(DirectRating {
            ratee_id: id,
            rater_id: user.user_id,
            listing_id: payload.listing_id,
            rating: payload.rating.unwrap_or_default(),
            comment: payload.comment,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}
