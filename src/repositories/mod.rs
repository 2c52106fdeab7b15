//! Repository layer for data access operations.
//!
//! Each entity has a store trait (see [`traits`]) with two backends: the
//! Postgres repositories used in production and [`MemoryStore`] for tests.

mod listing_repo;
mod memory;
mod purchase_repo;
mod rating_repo;
mod traits;
mod user_repo;
mod wishlist_repo;

use std::sync::Arc;

pub use listing_repo::ListingRepository;
pub use memory::MemoryStore;
pub use purchase_repo::PurchaseRepository;
pub use rating_repo::RatingRepository;
pub use traits::{ListingStore, PurchaseStore, RatingStore, UserStore, WishlistStore};
pub use user_repo::UserRepository;
pub use wishlist_repo::WishlistRepository;

use crate::db::AsyncDbPool;

/// Aggregates all stores behind their traits.
///
/// Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub listings: Arc<dyn ListingStore>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub wishlist: Arc<dyn WishlistStore>,
}

impl Repositories {
    /// Postgres-backed stores sharing one pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            listings: Arc::new(ListingRepository::new(pool.clone())),
            purchases: Arc::new(PurchaseRepository::new(pool.clone())),
            ratings: Arc::new(RatingRepository::new(pool.clone())),
            wishlist: Arc::new(WishlistRepository::new(pool)),
        }
    }

    /// All stores backed by one shared [`MemoryStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            listings: store.clone(),
            purchases: store.clone(),
            ratings: store.clone(),
            wishlist: store,
        }
    }
}

/// Wraps `term` for a substring `ILIKE`, escaping the wildcard characters.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
