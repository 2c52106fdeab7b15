//! Store seams for every entity.
//!
//! Services only ever talk to these traits. The Postgres backend is used in
//! production; [`super::memory::MemoryStore`] backs the service tests.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    Listing, ListingFilter, ListingWithOffer, NewListing, NewRating, NewUser, NewWishlistEntry,
    PendingVerification, Purchase, PurchaseDetails, Rating, RatingSummary, UpdateListing,
    UpdateUserProfile, User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the email is taken.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>>;

    /// `email` must already be lower-cased.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Replaces any outstanding code.
    async fn set_pending_verification(
        &self,
        user_id: i32,
        pending: &PendingVerification,
    ) -> AppResult<()>;

    /// Flags the account verified and clears the code pair.
    async fn mark_verified(&self, user_id: i32) -> AppResult<User>;

    async fn update_profile(&self, user_id: i32, changes: UpdateUserProfile) -> AppResult<User>;

    /// Email or name substring match, excluding `exclude_id`.
    async fn search(&self, term: &str, exclude_id: i32, limit: i64) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create(&self, new_listing: NewListing) -> AppResult<Listing>;

    async fn find_by_id(&self, listing_id: i32) -> AppResult<Option<Listing>>;

    /// `changes` must not be empty.
    async fn update(&self, listing_id: i32, changes: UpdateListing) -> AppResult<Listing>;

    /// Deletes only when both id and owner match. Returns affected rows.
    async fn delete_owned(&self, listing_id: i32, owner_id: i32) -> AppResult<usize>;

    async fn search(&self, filter: &ListingFilter) -> AppResult<Vec<ListingWithOffer>>;

    /// Newest first; `sold` narrows by sold flag when given.
    async fn list_by_owner(&self, owner_id: i32, sold: Option<bool>) -> AppResult<Vec<Listing>>;
}

/// Purchase transitions. Each method is one atomic unit.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// available -> pending.
    ///
    /// Upserts the (listing, buyer) purchase as pending and links it from the
    /// listing. Fails with `Conflict` if the listing was sold meanwhile or
    /// another buyer already holds a pending purchase on it.
    async fn open_pending(
        &self,
        listing_id: i32,
        buyer_id: i32,
        seller_id: i32,
    ) -> AppResult<(Listing, Purchase)>;

    async fn find_by_id(&self, purchase_id: i32) -> AppResult<Option<Purchase>>;

    /// pending -> confirmed.
    ///
    /// Marks the listing sold, bumps the seller's sold counter and upserts the
    /// buyer's rating. Fails with `Conflict` unless the purchase is still
    /// pending and owned by `buyer_id`; nothing is written in that case.
    async fn confirm(&self, purchase_id: i32, buyer_id: i32, rating: i32) -> AppResult<Purchase>;

    /// pending -> available.
    ///
    /// Unlinks the listing, forces it unsold and deletes the purchase.
    async fn cancel(&self, purchase_id: i32, buyer_id: i32) -> AppResult<()>;

    /// Newest first.
    async fn list_for_buyer(&self, buyer_id: i32) -> AppResult<Vec<PurchaseDetails>>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Inserts or overwrites the rating keyed by (listing, rater).
    async fn upsert(&self, new_rating: NewRating) -> AppResult<Rating>;

    async fn summary_for(&self, user_id: i32) -> AppResult<RatingSummary>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Adding twice is a no-op. Fails with `NotFound` for an unknown listing.
    async fn add(&self, entry: NewWishlistEntry) -> AppResult<()>;

    async fn remove(&self, user_id: i32, listing_id: i32) -> AppResult<()>;

    async fn listing_ids(&self, user_id: i32) -> AppResult<Vec<i32>>;
}
