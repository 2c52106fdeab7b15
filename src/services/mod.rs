//! Service layer for business logic operations.
//!
//! Services hold the marketplace rules and talk to storage only through the
//! store traits, so they run unchanged against Postgres or the in-memory
//! backend.

mod identity_service;
mod listing_service;
pub mod mailer;
mod purchase_service;
mod reputation_service;
mod user_service;
mod wishlist_service;

use std::sync::Arc;

pub use identity_service::{IdentityService, SignupInput, SignupOutcome};
pub use listing_service::{CreateListing, ListingService, SellerContact};
pub use purchase_service::PurchaseService;
pub use reputation_service::{DirectRating, ReputationService, UserProfile};
pub use user_service::{ProfileChanges, USER_SEARCH_LIMIT, UserService};
pub use wishlist_service::WishlistService;

use crate::config::{IdentityConfig, SessionConfig};
use crate::repositories::Repositories;
use crate::services::mailer::Mailer;

/// Aggregates all services for convenient access.
///
/// Used as part of the Axum application state; cloning only bumps
/// reference counts.
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityService,
    pub listings: ListingService,
    pub purchases: PurchaseService,
    pub reputation: ReputationService,
    pub users: UserService,
    pub wishlist: WishlistService,
}

impl Services {
    pub fn new(
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        identity: IdentityConfig,
        session: SessionConfig,
    ) -> Self {
        let reputation = ReputationService::new(
            repos.users.clone(),
            repos.listings.clone(),
            repos.ratings.clone(),
        );

        Self {
            identity: IdentityService::new(repos.users.clone(), mailer, identity, session),
            listings: ListingService::new(repos.users.clone(), repos.listings.clone()),
            purchases: PurchaseService::new(
                repos.users.clone(),
                repos.listings.clone(),
                repos.purchases.clone(),
            ),
            users: UserService::new(repos.users.clone(), reputation.clone()),
            reputation,
            wishlist: WishlistService::new(repos.wishlist),
        }
    }
}
