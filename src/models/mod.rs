mod listing;
mod purchase;
mod rating;
mod user;
mod wishlist;

pub use listing::{
    Listing, ListingFilter, ListingSort, ListingWithOffer, NewListing, PLACEHOLDER_IMAGE_URL,
    UpdateListing,
};
pub use purchase::{NewPurchase, Purchase, PurchaseDetails, PurchaseStatus};
pub use rating::{NewRating, Rating, RatingSummary};
pub use user::{NewUser, PendingVerification, UpdateUserProfile, User, UserRecord};
pub use wishlist::NewWishlistEntry;

/// Current time in the representation Diesel stores.
pub fn now() -> jiff_diesel::Timestamp {
    jiff_diesel::Timestamp::from(jiff::Timestamp::now())
}
