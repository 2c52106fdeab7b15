//! Buyer-side purchase DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::dto::listing::price_to_f64;
use crate::models::{PurchaseDetails, PurchaseStatus};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: i32,
    pub listing_id: i32,
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: PurchaseStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub confirmed_at: Option<jiff::Timestamp>,
    pub listing_title: String,
    pub listing_price: f64,
    pub listing_image: String,
    pub seller_name: Option<String>,
    pub seller_email: String,
}

impl From<PurchaseDetails> for PurchaseResponse {
    fn from(details: PurchaseDetails) -> Self {
        let purchase = details.purchase;
        Self {
            id: purchase.id,
            listing_id: purchase.listing_id,
            buyer_id: purchase.buyer_id,
            seller_id: purchase.seller_id,
            status: purchase.status,
            created_at: purchase.created_at.to_jiff(),
            confirmed_at: purchase.confirmed_at.map(|t| t.to_jiff()),
            listing_price: price_to_f64(&details.listing_price),
            listing_title: details.listing_title,
            listing_image: details.listing_image_url,
            seller_name: details.seller_name,
            seller_email: details.seller_email,
        }
    }
}

/// Body of `POST /purchases/{id}/confirm`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ConfirmPurchaseRequest {
    #[validate(
        required(message = "Rating is required and must be between 1 and 5"),
        range(min = 1, max = 5, message = "Rating is required and must be between 1 and 5")
    )]
    #[schema(minimum = 1, maximum = 5, example = 5)]
    pub rating: Option<i32>,
}
