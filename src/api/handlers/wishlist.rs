use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::WISHLIST_TAG;
use crate::api::dto::ErrorResponse;
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;

pub fn wishlist_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_wishlist))
        .routes(routes!(add_to_wishlist, remove_from_wishlist))
}

/// GET /api/wishlist - Ids of the caller's saved listings
#[utoipa::path(
    get,
    path = "/",
    tag = WISHLIST_TAG,
    responses(
        (status = 200, description = "Saved listing ids", body = Vec<i32>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn list_wishlist(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<i32>>> {
    let ids = state.services.wishlist.listing_ids(user.user_id).await?;
    Ok(Json(ids))
}

/// POST /api/wishlist/{listing_id} - Save a listing
#[utoipa::path(
    post,
    path = "/{listing_id}",
    tag = WISHLIST_TAG,
    params(("listing_id" = i32, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Saved (idempotent)"),
        (status = 404, description = "No such listing", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.wishlist.add(user.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/wishlist/{listing_id} - Forget a listing
#[utoipa::path(
    delete,
    path = "/{listing_id}",
    tag = WISHLIST_TAG,
    params(("listing_id" = i32, Path, description = "Listing id")),
    responses((status = 204, description = "Removed (idempotent)")),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.wishlist.remove(user.user_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
