use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// Image used when a listing is created without one.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1545239351-1141bd82e8a6?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080";

/// A for-sale item.
///
/// `seller_display_name` is a snapshot taken at creation and does not follow
/// later renames. `owner_id` may be absent on legacy rows.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Listing {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: String,
    pub seller_display_name: String,
    pub owner_id: Option<i32>,
    pub location: String,
    pub is_sold: bool,
    pub created_at: jiff_diesel::Timestamp,
    pub purchase_id: Option<i32>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == Some(user_id)
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::listings)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: String,
    pub seller_display_name: String,
    pub owner_id: Option<i32>,
    pub location: String,
}

/// Partial update: unspecified fields keep their prior values.
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::listings)]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

impl UpdateListing {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.location.is_none()
    }

    /// Merges the changes into `listing` in place.
    pub fn apply_to(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(category) = self.category {
            listing.category = category;
        }
        if let Some(image_url) = self.image_url {
            listing.image_url = image_url;
        }
        if let Some(location) = self.location {
            listing.location = location;
        }
    }
}

/// Sort order for listing search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

/// Parameterized listing search.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Case-insensitive substring of title or description
    pub query: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    /// Case-insensitive substring of location
    pub location: Option<String>,
    pub include_sold: bool,
    pub sort: ListingSort,
    pub offset: i64,
    pub limit: i64,
}

/// A search hit together with the buyer of its pending purchase, if any.
#[derive(Debug, Clone)]
pub struct ListingWithOffer {
    pub listing: Listing,
    pub pending_buyer_id: Option<i32>,
}
