use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a purchase.
///
/// `Cancelled` exists in the database type but is never written: cancelling
/// deletes the purchase row so the listing can be offered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum, ToSchema)]
#[db_enum(existing_type_path = "crate::schema::sql_types::PurchaseStatus")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl PurchaseStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, PurchaseStatus::Pending)
    }

    /// Only a pending purchase can move, and only forward.
    pub fn can_transition_to(self, next: PurchaseStatus) -> bool {
        matches!(
            (self, next),
            (PurchaseStatus::Pending, PurchaseStatus::Confirmed)
                | (PurchaseStatus::Pending, PurchaseStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::Confirmed => write!(f, "confirmed"),
            PurchaseStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Purchase {
    pub id: i32,
    pub listing_id: i32,
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: PurchaseStatus,
    pub created_at: jiff_diesel::Timestamp,
    pub confirmed_at: Option<jiff_diesel::Timestamp>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::purchases)]
pub struct NewPurchase {
    pub listing_id: i32,
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: PurchaseStatus,
}

/// A buyer's purchase joined with what the buyer needs to recognise it.
#[derive(Debug, Clone)]
pub struct PurchaseDetails {
    pub purchase: Purchase,
    pub listing_title: String,
    pub listing_price: BigDecimal,
    pub listing_image_url: String,
    pub seller_name: Option<String>,
    pub seller_email: String,
}
