//! Listing browse, lifecycle and sale endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::LISTING_TAG;
use crate::api::dto::{
    ContactResponse, CreateListingRequest, ErrorResponse, ListingQuery, ListingResponse,
    MarkSoldRequest, MarkSoldResponse, UpdateListingRequest,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

pub fn listing_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(search_listings, create_listing))
        .routes(routes!(get_listing, update_listing, delete_listing))
        .routes(routes!(mark_sold))
        .routes(routes!(contact_seller))
}

/// GET /api/listings - Search listings
///
/// Unsold listings only unless `includeSold=true`. Rows with a pending
/// purchase carry `purchaseStatus` and `purchaseBuyerId`.
#[utoipa::path(
    get,
    path = "/",
    tag = LISTING_TAG,
    params(ListingQuery),
    responses(
        (status = 200, description = "Matching listings", body = Vec<ListingResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
async fn search_listings(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListingQuery>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let filter = query.into_filter()?;
    let hits = state.services.listings.search(&filter).await?;
    Ok(Json(hits.into_iter().map(ListingResponse::from).collect()))
}

/// POST /api/listings - Offer an item for sale
#[utoipa::path(
    post,
    path = "/",
    tag = LISTING_TAG,
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Invalid listing", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn create_listing(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateListingRequest>,
) -> AppResult<(StatusCode, Json<ListingResponse>)> {
    let input = payload.into_create_listing()?;
    let listing = state.services.listings.create(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(listing.into())))
}

/// GET /api/listings/{id} - Listing detail
#[utoipa::path(
    get,
    path = "/{id}",
    tag = LISTING_TAG,
    params(("id" = i32, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = ListingResponse),
        (status = 404, description = "No such listing", body = ErrorResponse)
    )
)]
async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ListingResponse>> {
    let listing = state.services.listings.get(id).await?;
    Ok(Json(listing.into()))
}

/// PUT /api/listings/{id} - Edit one's own listing
#[utoipa::path(
    put,
    path = "/{id}",
    tag = LISTING_TAG,
    params(("id" = i32, Path, description = "Listing id")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated listing", body = ListingResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such listing", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn update_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateListingRequest>,
) -> AppResult<Json<ListingResponse>> {
    let changes = payload.into_update_listing()?;
    let listing = state
        .services
        .listings
        .update(user.user_id, id, changes)
        .await?;
    Ok(Json(listing.into()))
}

/// DELETE /api/listings/{id} - Remove one's own listing
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = LISTING_TAG,
    params(("id" = i32, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 404, description = "No such listing owned by the caller", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn delete_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.listings.delete(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/listings/{id}/mark-sold - Name the buyer
///
/// Opens a pending purchase; the listing is sold once the buyer confirms.
#[utoipa::path(
    post,
    path = "/{id}/mark-sold",
    tag = LISTING_TAG,
    params(("id" = i32, Path, description = "Listing id")),
    request_body = MarkSoldRequest,
    responses(
        (status = 200, description = "Purchase pending buyer confirmation", body = MarkSoldResponse),
        (status = 400, description = "Already sold, pending for another buyer, or self as buyer", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such listing or buyer", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn mark_sold(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<MarkSoldRequest>,
) -> AppResult<Json<MarkSoldResponse>> {
    let (listing, purchase) = state
        .services
        .purchases
        .mark_sold(user.user_id, id, payload.buyer_id)
        .await?;
    Ok(Json(MarkSoldResponse::new(listing, purchase)))
}

/// POST /api/listings/{id}/contact - Seller's email and a mailto link
#[utoipa::path(
    post,
    path = "/{id}/contact",
    tag = LISTING_TAG,
    params(("id" = i32, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Seller contact", body = ContactResponse),
        (status = 400, description = "Listing has no owner", body = ErrorResponse),
        (status = 404, description = "No such listing", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn contact_seller(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ContactResponse>> {
    let contact = state.services.listings.contact(id).await?;
    Ok(Json(contact.into()))
}
