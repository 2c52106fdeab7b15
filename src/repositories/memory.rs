//! In-process store backend.
//!
//! Mirrors the Postgres schema guards (unique keys, cascades, the single
//! pending purchase per listing) so services behave the same against it.
//! Every operation takes the one state lock for its whole duration, which
//! makes each store call atomic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{AppError, AppResult};
use crate::models::{
    Listing, ListingFilter, ListingSort, ListingWithOffer, NewListing, NewPurchase, NewRating,
    NewUser, NewWishlistEntry, PendingVerification, Purchase, PurchaseDetails, PurchaseStatus,
    Rating, RatingSummary, UpdateListing, UpdateUserProfile, User, now,
};
use crate::repositories::{ListingStore, PurchaseStore, RatingStore, UserStore, WishlistStore};

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: BTreeMap<i32, User>,
    listings: BTreeMap<i32, Listing>,
    purchases: BTreeMap<i32, Purchase>,
    ratings: BTreeMap<i32, Rating>,
    /// (user_id, listing_id) with insertion order
    wishlist: BTreeMap<(i32, i32), i64>,
    wishlist_seq: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn listing_mut(&mut self, listing_id: i32) -> AppResult<&mut Listing> {
        self.listings
            .get_mut(&listing_id)
            .ok_or_else(|| AppError::not_found("listing", "id", listing_id))
    }

    fn upsert_rating(&mut self, new_rating: NewRating) -> Rating {
        let existing = self
            .ratings
            .values()
            .find(|r| r.listing_id == new_rating.listing_id && r.rater_id == new_rating.rater_id)
            .map(|r| r.id);
        let id = match existing {
            Some(id) => id,
            None => self.next_id(),
        };

        let rating = Rating {
            id,
            user_id: new_rating.user_id,
            rater_id: new_rating.rater_id,
            listing_id: new_rating.listing_id,
            rating: new_rating.rating,
            comment: new_rating.comment,
            created_at: now(),
        };
        self.ratings.insert(id, rating.clone());
        rating
    }
}

/// Shared-state store implementing every store trait.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Duplicate {
                entity: "user".to_string(),
                field: "email".to_string(),
                value: new_user.email,
            });
        }

        let id = state.next_id();
        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            location: String::new(),
            email_verified: new_user.email_verified,
            pending_verification: None,
            items_sold_count: 0,
            created_at: Timestamp::now(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn set_pending_verification(
        &self,
        user_id: i32,
        pending: &PendingVerification,
    ) -> AppResult<()> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))?;
        user.pending_verification = Some(pending.clone());
        Ok(())
    }

    async fn mark_verified(&self, user_id: i32) -> AppResult<User> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))?;
        user.email_verified = true;
        user.pending_verification = None;
        Ok(user.clone())
    }

    async fn update_profile(&self, user_id: i32, changes: UpdateUserProfile) -> AppResult<User> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))?;
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        if let Some(location) = changes.location {
            user.location = location;
        }
        Ok(user.clone())
    }

    async fn search(&self, term: &str, exclude_id: i32, limit: i64) -> AppResult<Vec<User>> {
        let state = self.lock()?;
        let mut hits: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != exclude_id)
            .filter(|u| {
                contains_ci(&u.email, term)
                    || u.name.as_deref().is_some_and(|n| contains_ci(n, term))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| match (&a.name, &b.name) {
            (Some(x), Some(y)) => x.cmp(y).then_with(|| a.email.cmp(&b.email)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.email.cmp(&b.email),
        });
        hits.truncate(limit.max(0) as usize);
        Ok(hits)
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn create(&self, new_listing: NewListing) -> AppResult<Listing> {
        let mut state = self.lock()?;
        if let Some(owner) = new_listing.owner_id.filter(|id| !state.users.contains_key(id)) {
            return Err(AppError::not_found("user", "id", owner));
        }

        let id = state.next_id();
        let listing = Listing {
            id,
            title: new_listing.title,
            description: new_listing.description,
            price: new_listing.price,
            category: new_listing.category,
            image_url: new_listing.image_url,
            seller_display_name: new_listing.seller_display_name,
            owner_id: new_listing.owner_id,
            location: new_listing.location,
            is_sold: false,
            created_at: now(),
            purchase_id: None,
        };
        state.listings.insert(id, listing.clone());
        Ok(listing)
    }

    async fn find_by_id(&self, listing_id: i32) -> AppResult<Option<Listing>> {
        Ok(self.lock()?.listings.get(&listing_id).cloned())
    }

    async fn update(&self, listing_id: i32, changes: UpdateListing) -> AppResult<Listing> {
        let mut state = self.lock()?;
        let listing = state.listing_mut(listing_id)?;
        changes.apply_to(listing);
        Ok(listing.clone())
    }

    async fn delete_owned(&self, listing_id: i32, owner_id: i32) -> AppResult<usize> {
        let mut state = self.lock()?;
        let owned = state
            .listings
            .get(&listing_id)
            .is_some_and(|l| l.is_owned_by(owner_id));
        if !owned {
            return Ok(0);
        }

        state.listings.remove(&listing_id);
        state.purchases.retain(|_, p| p.listing_id != listing_id);
        state.ratings.retain(|_, r| r.listing_id != listing_id);
        state.wishlist.retain(|(_, listing), _| *listing != listing_id);
        Ok(1)
    }

    async fn search(&self, filter: &ListingFilter) -> AppResult<Vec<ListingWithOffer>> {
        let state = self.lock()?;
        let mut hits: Vec<&Listing> = state
            .listings
            .values()
            .filter(|l| {
                filter
                    .query
                    .as_deref()
                    .is_none_or(|q| contains_ci(&l.title, q) || contains_ci(&l.description, q))
            })
            .filter(|l| filter.category.as_ref().is_none_or(|c| &l.category == c))
            .filter(|l| filter.min_price.as_ref().is_none_or(|min| &l.price >= min))
            .filter(|l| filter.max_price.as_ref().is_none_or(|max| &l.price <= max))
            .filter(|l| {
                filter
                    .location
                    .as_deref()
                    .is_none_or(|loc| contains_ci(&l.location, loc))
            })
            .filter(|l| filter.include_sold || !l.is_sold)
            .collect();

        // Ids are assigned in creation order, so they stand in for created_at.
        match filter.sort {
            ListingSort::Newest => hits.sort_by(|a, b| b.id.cmp(&a.id)),
            ListingSort::Oldest => hits.sort_by(|a, b| a.id.cmp(&b.id)),
            ListingSort::PriceAsc => hits.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            ListingSort::PriceDesc => {
                hits.sort_by(|a, b| b.price.cmp(&a.price).then(b.id.cmp(&a.id)))
            }
        }

        Ok(hits
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|listing| ListingWithOffer {
                listing: listing.clone(),
                pending_buyer_id: state
                    .purchases
                    .values()
                    .find(|p| p.listing_id == listing.id && p.status.is_pending())
                    .map(|p| p.buyer_id),
            })
            .collect())
    }

    async fn list_by_owner(&self, owner_id: i32, sold: Option<bool>) -> AppResult<Vec<Listing>> {
        let state = self.lock()?;
        let mut owned: Vec<Listing> = state
            .listings
            .values()
            .filter(|l| l.is_owned_by(owner_id))
            .filter(|l| sold.is_none_or(|s| l.is_sold == s))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(owned)
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn open_pending(
        &self,
        listing_id: i32,
        buyer_id: i32,
        seller_id: i32,
    ) -> AppResult<(Listing, Purchase)> {
        let mut state = self.lock()?;
        if state.listing_mut(listing_id)?.is_sold {
            return Err(AppError::conflict("Listing already sold"));
        }
        if buyer_id == seller_id {
            return Err(AppError::Validation {
                field: "buyer_id".to_string(),
                reason: "Seller cannot be the buyer".to_string(),
            });
        }

        let competing = state
            .purchases
            .values()
            .any(|p| p.listing_id == listing_id && p.status.is_pending() && p.buyer_id != buyer_id);
        if competing {
            return Err(AppError::conflict(
                "Listing already has a pending purchase for another buyer",
            ));
        }

        let existing = state
            .purchases
            .values()
            .find(|p| p.listing_id == listing_id && p.buyer_id == buyer_id)
            .map(|p| p.id);
        let id = match existing {
            Some(id) => id,
            None => state.next_id(),
        };

        let new_purchase = NewPurchase {
            listing_id,
            buyer_id,
            seller_id,
            status: PurchaseStatus::Pending,
        };
        let purchase = Purchase {
            id,
            listing_id: new_purchase.listing_id,
            buyer_id: new_purchase.buyer_id,
            seller_id: new_purchase.seller_id,
            status: new_purchase.status,
            created_at: now(),
            confirmed_at: None,
        };
        state.purchases.insert(id, purchase.clone());

        let listing = state.listing_mut(listing_id)?;
        listing.purchase_id = Some(id);
        Ok((listing.clone(), purchase))
    }

    async fn find_by_id(&self, purchase_id: i32) -> AppResult<Option<Purchase>> {
        Ok(self.lock()?.purchases.get(&purchase_id).cloned())
    }

    async fn confirm(&self, purchase_id: i32, buyer_id: i32, rating: i32) -> AppResult<Purchase> {
        let mut state = self.lock()?;
        let purchase = state
            .purchases
            .get(&purchase_id)
            .filter(|p| {
                p.buyer_id == buyer_id && p.status.can_transition_to(PurchaseStatus::Confirmed)
            })
            .cloned()
            .ok_or_else(|| AppError::conflict("Purchase already confirmed or cancelled"))?;

        // Validate every write before applying any of them.
        if !state.listings.contains_key(&purchase.listing_id) {
            return Err(AppError::not_found("listing", "id", purchase.listing_id));
        }
        if !state.users.contains_key(&purchase.seller_id) {
            return Err(AppError::not_found("user", "id", purchase.seller_id));
        }

        let confirmed = Purchase {
            status: PurchaseStatus::Confirmed,
            confirmed_at: Some(now()),
            ..purchase
        };
        state.purchases.insert(purchase_id, confirmed.clone());

        let listing = state.listing_mut(confirmed.listing_id)?;
        listing.is_sold = true;
        listing.purchase_id = Some(purchase_id);

        if let Some(seller) = state.users.get_mut(&confirmed.seller_id) {
            seller.items_sold_count += 1;
        }

        state.upsert_rating(NewRating {
            user_id: confirmed.seller_id,
            rater_id: buyer_id,
            listing_id: confirmed.listing_id,
            rating,
            comment: None,
        });

        Ok(confirmed)
    }

    async fn cancel(&self, purchase_id: i32, buyer_id: i32) -> AppResult<()> {
        let mut state = self.lock()?;
        let purchase = state
            .purchases
            .get(&purchase_id)
            .filter(|p| p.buyer_id == buyer_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("purchase", "id", purchase_id))?;
        if !purchase.status.can_transition_to(PurchaseStatus::Cancelled) {
            return Err(AppError::conflict("Purchase already confirmed or cancelled"));
        }

        if let Ok(listing) = state.listing_mut(purchase.listing_id) {
            listing.purchase_id = None;
            listing.is_sold = false;
        }
        state.purchases.remove(&purchase_id);
        Ok(())
    }

    async fn list_for_buyer(&self, buyer_id: i32) -> AppResult<Vec<PurchaseDetails>> {
        let state = self.lock()?;
        let mut details: Vec<PurchaseDetails> = state
            .purchases
            .values()
            .filter(|p| p.buyer_id == buyer_id)
            .filter_map(|p| {
                let listing = state.listings.get(&p.listing_id)?;
                let seller = state.users.get(&p.seller_id)?;
                Some(PurchaseDetails {
                    purchase: p.clone(),
                    listing_title: listing.title.clone(),
                    listing_price: listing.price.clone(),
                    listing_image_url: listing.image_url.clone(),
                    seller_name: seller.name.clone(),
                    seller_email: seller.email.clone(),
                })
            })
            .collect();
        details.sort_by(|a, b| b.purchase.id.cmp(&a.purchase.id));
        Ok(details)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn upsert(&self, new_rating: NewRating) -> AppResult<Rating> {
        let mut state = self.lock()?;
        if new_rating.user_id == new_rating.rater_id {
            return Err(AppError::Validation {
                field: "user_id".to_string(),
                reason: "You cannot rate yourself".to_string(),
            });
        }
        if !(1..=5).contains(&new_rating.rating) {
            return Err(AppError::Validation {
                field: "rating".to_string(),
                reason: "rating must be between 1 and 5".to_string(),
            });
        }
        if !state.listings.contains_key(&new_rating.listing_id) {
            return Err(AppError::not_found("listing", "id", new_rating.listing_id));
        }
        Ok(state.upsert_rating(new_rating))
    }

    async fn summary_for(&self, user_id: i32) -> AppResult<RatingSummary> {
        let state = self.lock()?;
        Ok(RatingSummary::from_scores(
            state
                .ratings
                .values()
                .filter(|r| r.user_id == user_id)
                .map(|r| r.rating),
        ))
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn add(&self, entry: NewWishlistEntry) -> AppResult<()> {
        let mut state = self.lock()?;
        if !state.listings.contains_key(&entry.listing_id) {
            return Err(AppError::not_found("listing", "id", entry.listing_id));
        }
        let key = (entry.user_id, entry.listing_id);
        if !state.wishlist.contains_key(&key) {
            state.wishlist_seq += 1;
            let seq = state.wishlist_seq;
            state.wishlist.insert(key, seq);
        }
        Ok(())
    }

    async fn remove(&self, user_id: i32, listing_id: i32) -> AppResult<()> {
        self.lock()?.wishlist.remove(&(user_id, listing_id));
        Ok(())
    }

    async fn listing_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        let state = self.lock()?;
        let mut entries: Vec<(i64, i32)> = state
            .wishlist
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|((_, listing), seq)| (*seq, *listing))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, listing)| listing).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    async fn seed(store: &MemoryStore) -> (User, User, Listing) {
        let seller = UserStore::create(
            store,
            NewUser {
                email: "seller@illinois.edu".to_string(),
                password_hash: "x".to_string(),
                name: Some("Seller".to_string()),
                email_verified: true,
            },
        )
        .await
        .unwrap();
        let buyer = UserStore::create(
            store,
            NewUser {
                email: "buyer@illinois.edu".to_string(),
                password_hash: "x".to_string(),
                name: None,
                email_verified: true,
            },
        )
        .await
        .unwrap();
        let listing = ListingStore::create(
            store,
            NewListing {
                title: "Desk lamp".to_string(),
                description: "Warm light".to_string(),
                price: BigDecimal::from(12),
                category: "Home".to_string(),
                image_url: String::new(),
                seller_display_name: "Seller".to_string(),
                owner_id: Some(seller.id),
                location: "Urbana".to_string(),
            },
        )
        .await
        .unwrap();
        (seller, buyer, listing)
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        seed(&store).await;

        let err = UserStore::create(
            &store,
            NewUser {
                email: "seller@illinois.edu".to_string(),
                password_hash: "y".to_string(),
                name: None,
                email_verified: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_wishlist_and_purchases() {
        let store = MemoryStore::new();
        let (seller, buyer, listing) = seed(&store).await;

        WishlistStore::add(&store, NewWishlistEntry { user_id: buyer.id, listing_id: listing.id })
            .await
            .unwrap();
        store.open_pending(listing.id, buyer.id, seller.id).await.unwrap();

        assert_eq!(store.delete_owned(listing.id, buyer.id).await.unwrap(), 0);
        assert_eq!(store.delete_owned(listing.id, seller.id).await.unwrap(), 1);
        assert!(store.listing_ids(buyer.id).await.unwrap().is_empty());
        assert!(store.list_for_buyer(buyer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_add_is_idempotent() {
        let store = MemoryStore::new();
        let (_, buyer, listing) = seed(&store).await;
        let entry = NewWishlistEntry { user_id: buyer.id, listing_id: listing.id };

        WishlistStore::add(&store, entry).await.unwrap();
        WishlistStore::add(&store, entry).await.unwrap();
        assert_eq!(store.listing_ids(buyer.id).await.unwrap(), vec![listing.id]);

        let missing = NewWishlistEntry { user_id: buyer.id, listing_id: 9999 };
        assert!(matches!(
            WishlistStore::add(&store, missing).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_marks_pending_buyer() {
        let store = MemoryStore::new();
        let (seller, buyer, listing) = seed(&store).await;
        store.open_pending(listing.id, buyer.id, seller.id).await.unwrap();

        let filter = ListingFilter {
            query: Some("LAMP".to_string()),
            limit: 20,
            ..Default::default()
        };
        let hits = ListingStore::search(&store, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pending_buyer_id, Some(buyer.id));
    }
}
