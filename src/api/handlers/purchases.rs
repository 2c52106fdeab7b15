//! Buyer side of the purchase state machine.

use axum::{
    Json,
    extract::{Path, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PURCHASE_TAG;
use crate::api::dto::{ConfirmPurchaseRequest, ErrorResponse, MessageResponse, PurchaseResponse};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

pub fn purchase_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_purchases))
        .routes(routes!(confirm_purchase))
        .routes(routes!(cancel_purchase))
}

/// GET /api/purchases - The caller's purchases, newest first
#[utoipa::path(
    get,
    path = "/",
    tag = PURCHASE_TAG,
    responses(
        (status = 200, description = "Purchases with listing and seller details", body = Vec<PurchaseResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn list_purchases(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<PurchaseResponse>>> {
    let purchases = state.services.purchases.list_for_buyer(user.user_id).await?;
    Ok(Json(purchases.into_iter().map(PurchaseResponse::from).collect()))
}

/// POST /api/purchases/{id}/confirm - Accept a pending purchase and rate the seller
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = PURCHASE_TAG,
    params(("id" = i32, Path, description = "Purchase id")),
    request_body = ConfirmPurchaseRequest,
    responses(
        (status = 200, description = "Purchase confirmed", body = MessageResponse),
        (status = 400, description = "Invalid rating or purchase not pending", body = ErrorResponse),
        (status = 404, description = "No such purchase for this buyer", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn confirm_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<ConfirmPurchaseRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .purchases
        .confirm(user.user_id, id, payload.rating.unwrap_or_default())
        .await?;
    Ok(Json(MessageResponse::new("Purchase confirmed successfully")))
}

/// POST /api/purchases/{id}/cancel - Decline a pending purchase
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = PURCHASE_TAG,
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase cancelled; listing available again", body = MessageResponse),
        (status = 400, description = "Purchase not pending", body = ErrorResponse),
        (status = 404, description = "No such purchase for this buyer", body = ErrorResponse)
    ),
    security(("cookieAuth" = []), ("bearerAuth" = []))
)]
async fn cancel_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.purchases.cancel(user.user_id, id).await?;
    Ok(Json(MessageResponse::new(
        "Purchase cancelled successfully. The item is available again for the seller.",
    )))
}
