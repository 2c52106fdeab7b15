//! Listing request and response DTOs.
//!
//! Prices cross the wire as JSON numbers and are held as `NUMERIC(10,2)`
//! internally; conversion rounds to cents.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    Listing, ListingFilter, ListingSort, ListingWithOffer, Purchase, PurchaseStatus, UpdateListing,
};
use crate::services::{CreateListing, SellerContact};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Largest value a `NUMERIC(10,2)` price column holds.
pub const MAX_PRICE: f64 = 99_999_999.99;

pub(crate) fn price_to_decimal(field: &str, price: f64) -> AppResult<BigDecimal> {
    BigDecimal::try_from(price)
        .map(|p| p.round(2))
        .map_err(|_| AppError::Validation {
            field: field.to_string(),
            reason: format!("{field} must be a finite number"),
        })
}

pub(crate) fn price_to_f64(price: &BigDecimal) -> f64 {
    price.to_f64().unwrap_or_default()
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    /// Image URL
    pub image: String,
    /// Seller display name captured when the listing was created
    pub seller: String,
    pub owner_id: Option<i32>,
    pub location: String,
    pub is_sold: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
    /// Status of the pending purchase, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_status: Option<PurchaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_buyer_id: Option<i32>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            price: price_to_f64(&listing.price),
            title: listing.title,
            description: listing.description,
            category: listing.category,
            image: listing.image_url,
            seller: listing.seller_display_name,
            owner_id: listing.owner_id,
            location: listing.location,
            is_sold: listing.is_sold,
            created_at: listing.created_at.to_jiff(),
            purchase_status: None,
            purchase_buyer_id: None,
        }
    }
}

impl From<ListingWithOffer> for ListingResponse {
    fn from(hit: ListingWithOffer) -> Self {
        let mut response = ListingResponse::from(hit.listing);
        if let Some(buyer_id) = hit.pending_buyer_id {
            response.purchase_status = Some(PurchaseStatus::Pending);
            response.purchase_buyer_id = Some(buyer_id);
        }
        response
    }
}

/// Query string of `GET /listings`.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ListingQuery {
    /// Substring of title or description
    pub q: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0, message = "minPrice must be non-negative"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "maxPrice must be non-negative"))]
    pub max_price: Option<f64>,
    pub location: Option<String>,
    #[serde(default)]
    pub include_sold: bool,
    #[serde(default)]
    #[param(inline)]
    pub sort: ListingSort,
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ListingQuery {
    pub fn into_filter(self) -> AppResult<ListingFilter> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| AppError::Validation {
            field: "page".to_string(),
            reason: "page is too large".to_string(),
        })?;

        Ok(ListingFilter {
            query: non_empty(self.q),
            category: non_empty(self.category),
            min_price: self
                .min_price
                .map(|p| price_to_decimal("minPrice", p))
                .transpose()?,
            max_price: self
                .max_price
                .map(|p| price_to_decimal("maxPrice", p))
                .transpose()?,
            location: non_empty(self.location),
            include_sold: self.include_sold,
            sort: self.sort,
            offset,
            limit,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    #[schema(example = "Calculus textbook")]
    pub title: String,
    #[validate(length(min = 2, message = "Description must be at least 2 characters"))]
    pub description: String,
    #[validate(range(min = 0.0, max = MAX_PRICE, message = "Price must be between 0 and 99999999.99"))]
    #[schema(example = 25.5)]
    pub price: f64,
    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    #[schema(example = "Books")]
    pub category: String,
    /// Defaults to a placeholder photo
    #[serde(alias = "imageUrl")]
    pub image: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

impl CreateListingRequest {
    pub fn into_create_listing(self) -> AppResult<CreateListing> {
        Ok(CreateListing {
            price: price_to_decimal("price", self.price)?,
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category.trim().to_string(),
            image_url: self.image,
            location: self.location,
        })
    }
}

/// Partial listing edit; absent fields keep their values.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 2, message = "Description must be at least 2 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = MAX_PRICE, message = "Price must be between 0 and 99999999.99"))]
    pub price: Option<f64>,
    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    pub category: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

impl UpdateListingRequest {
    pub fn into_update_listing(self) -> AppResult<UpdateListing> {
        Ok(UpdateListing {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            price: self.price.map(|p| price_to_decimal("price", p)).transpose()?,
            category: self.category.map(|c| c.trim().to_string()),
            image_url: non_empty(self.image),
            location: self.location,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MarkSoldRequest {
    #[serde(alias = "buyerId")]
    #[validate(range(min = 1, message = "buyer_id must be a valid user id"))]
    pub buyer_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingPurchaseResponse {
    pub id: i32,
    pub listing_id: i32,
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: PurchaseStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: jiff::Timestamp,
}

impl From<Purchase> for PendingPurchaseResponse {
    fn from(purchase: Purchase) -> Self {
        Self {
            id: purchase.id,
            listing_id: purchase.listing_id,
            buyer_id: purchase.buyer_id,
            seller_id: purchase.seller_id,
            status: purchase.status,
            created_at: purchase.created_at.to_jiff(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkSoldResponse {
    pub listing: ListingResponse,
    pub purchase: PendingPurchaseResponse,
    pub message: String,
}

impl MarkSoldResponse {
    pub fn new(listing: Listing, purchase: Purchase) -> Self {
        Self {
            listing: listing.into(),
            purchase: purchase.into(),
            message: "Purchase pending buyer confirmation".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub listing_id: i32,
    pub seller_id: i32,
    pub seller_email: String,
    /// Pre-filled `mailto:` link
    pub mailto: String,
}

impl From<SellerContact> for ContactResponse {
    fn from(contact: SellerContact) -> Self {
        Self {
            listing_id: contact.listing_id,
            seller_id: contact.seller_id,
            seller_email: contact.seller_email,
            mailto: contact.mailto,
        }
    }
}
