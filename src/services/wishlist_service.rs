use std::sync::Arc;

use tracing::debug;

use crate::error::AppResult;
use crate::models::NewWishlistEntry;
use crate::repositories::WishlistStore;

/// Per-user saved listings.
#[derive(Clone)]
pub struct WishlistService {
    wishlist: Arc<dyn WishlistStore>,
}

impl WishlistService {
    pub fn new(wishlist: Arc<dyn WishlistStore>) -> Self {
        Self { wishlist }
    }

    /// Idempotent.
    pub async fn add(&self, user_id: i32, listing_id: i32) -> AppResult<()> {
        self.wishlist
            .add(NewWishlistEntry {
                user_id,
                listing_id,
            })
            .await?;
        debug!(user_id, listing_id, "Wishlist entry added");
        Ok(())
    }

    /// Removing an absent entry succeeds.
    pub async fn remove(&self, user_id: i32, listing_id: i32) -> AppResult<()> {
        self.wishlist.remove(user_id, listing_id).await
    }

    pub async fn listing_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        self.wishlist.listing_ids(user_id).await
    }
}
