//! The purchase state machine.
//!
//! ```text
//! available --mark_sold--> pending --confirm--> confirmed
//!                             |
//!                             +-----cancel----> available (purchase deleted)
//! ```
//!
//! Preconditions are checked here so callers get precise errors; every
//! transition is then a single atomic store call that re-checks the state it
//! depends on, so a lost race surfaces as `Conflict`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Listing, Purchase, PurchaseDetails, PurchaseStatus};
use crate::repositories::{ListingStore, PurchaseStore, UserStore};
use crate::services::reputation_service::check_rating_range;

#[derive(Clone)]
pub struct PurchaseService {
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
    purchases: Arc<dyn PurchaseStore>,
}

impl PurchaseService {
    pub fn new(
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        purchases: Arc<dyn PurchaseStore>,
    ) -> Self {
        Self {
            users,
            listings,
            purchases,
        }
    }

    /// available -> pending: the seller designates `buyer_id`.
    ///
    /// The listing stays unsold until the buyer confirms. Marking the same
    /// buyer again refreshes the pending purchase.
    pub async fn mark_sold(
        &self,
        seller_id: i32,
        listing_id: i32,
        buyer_id: i32,
    ) -> AppResult<(Listing, Purchase)> {
        let listing = self
            .listings
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found("listing", "id", listing_id))?;
        if !listing.is_owned_by(seller_id) {
            return Err(AppError::forbidden("Forbidden"));
        }
        if listing.is_sold {
            return Err(AppError::conflict("Listing already sold"));
        }
        if self.users.find_by_id(buyer_id).await?.is_none() {
            return Err(AppError::not_found("user", "id", buyer_id));
        }
        if buyer_id == seller_id {
            return Err(AppError::bad_request("You cannot sell a listing to yourself"));
        }

        let (listing, purchase) = self
            .purchases
            .open_pending(listing_id, buyer_id, seller_id)
            .await?;

        info!(
            listing_id,
            purchase_id = purchase.id,
            seller_id,
            buyer_id,
            "Purchase pending buyer confirmation"
        );
        Ok((listing, purchase))
    }

    /// Loads a purchase visible to `buyer_id` and requires that it may move to `next`.
    async fn movable_for_buyer(
        &self,
        purchase_id: i32,
        buyer_id: i32,
        next: PurchaseStatus,
    ) -> AppResult<Purchase> {
        let purchase = self
            .purchases
            .find_by_id(purchase_id)
            .await?
            .filter(|p| p.buyer_id == buyer_id)
            .ok_or_else(|| AppError::not_found("purchase", "id", purchase_id))?;

        if !purchase.status.can_transition_to(next) {
            return Err(AppError::conflict("Purchase already confirmed or cancelled"));
        }
        Ok(purchase)
    }

    /// pending -> confirmed, recording the buyer's mandatory rating.
    pub async fn confirm(&self, buyer_id: i32, purchase_id: i32, rating: i32) -> AppResult<Purchase> {
        check_rating_range(rating)?;
        self.movable_for_buyer(purchase_id, buyer_id, PurchaseStatus::Confirmed)
            .await?;

        let purchase = self
            .purchases
            .confirm(purchase_id, buyer_id, rating)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict { .. }) {
                    warn!(purchase_id, buyer_id, "Lost race confirming purchase");
                }
            })?;

        info!(
            purchase_id,
            listing_id = purchase.listing_id,
            seller_id = purchase.seller_id,
            buyer_id,
            rating,
            "Purchase confirmed"
        );
        Ok(purchase)
    }

    /// pending -> available; the purchase record is deleted.
    pub async fn cancel(&self, buyer_id: i32, purchase_id: i32) -> AppResult<()> {
        let purchase = self
            .movable_for_buyer(purchase_id, buyer_id, PurchaseStatus::Cancelled)
            .await?;
        self.purchases.cancel(purchase_id, buyer_id).await?;

        info!(
            purchase_id,
            listing_id = purchase.listing_id,
            buyer_id,
            "Purchase cancelled, listing available again"
        );
        Ok(())
    }

    pub async fn list_for_buyer(&self, buyer_id: i32) -> AppResult<Vec<PurchaseDetails>> {
        self.purchases.list_for_buyer(buyer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::fixture;

    #[tokio::test]
    async fn test_cancel_then_resell_to_another_buyer() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (listing, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        assert!(!listing.is_sold);
        assert_eq!(listing.purchase_id, Some(pending.id));
        assert_eq!(pending.status, PurchaseStatus::Pending);

        purchases.cancel(f.buyer.id, pending.id).await.unwrap();
        let listing = f.services.listings.get(f.listing.id).await.unwrap();
        assert!(!listing.is_sold);
        assert_eq!(listing.purchase_id, None);
        assert!(f.repos.purchases.find_by_id(pending.id).await.unwrap().is_none());

        let (_, second) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.other.id)
            .await
            .unwrap();
        assert_eq!(second.buyer_id, f.other.id);
        assert_eq!(second.status, PurchaseStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_once_then_conflict() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        let confirmed = purchases.confirm(f.buyer.id, pending.id, 5).await.unwrap();
        assert_eq!(confirmed.status, PurchaseStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());

        assert!(matches!(
            purchases.confirm(f.buyer.id, pending.id, 5).await,
            Err(AppError::Conflict { .. })
        ));

        let listing = f.services.listings.get(f.listing.id).await.unwrap();
        assert!(listing.is_sold);

        let profile = f.services.reputation.profile(f.seller.id).await.unwrap();
        assert_eq!(profile.items_sold_count(), 1);
        assert_eq!(profile.summary.rating_count, 1);
        assert_eq!(profile.summary.average_rating, 5.0);
    }

    #[tokio::test]
    async fn test_sold_listing_cannot_be_marked_again() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        purchases.confirm(f.buyer.id, pending.id, 4).await.unwrap();

        match purchases.mark_sold(f.seller.id, f.listing.id, f.other.id).await {
            Err(AppError::Conflict { message }) => assert_eq!(message, "Listing already sold"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_buyer_while_pending_is_conflict() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        assert!(matches!(
            purchases.mark_sold(f.seller.id, f.listing.id, f.other.id).await,
            Err(AppError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_remarking_same_buyer_refreshes_purchase() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, first) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        let (_, again) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(purchases.list_for_buyer(f.buyer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_sold_preconditions() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        assert!(matches!(
            purchases.mark_sold(f.seller.id, 9999, f.buyer.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            purchases.mark_sold(f.buyer.id, f.listing.id, f.other.id).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            purchases.mark_sold(f.seller.id, f.listing.id, 9999).await,
            Err(AppError::NotFound { ref entity, .. }) if entity == "user"
        ));
        assert!(matches!(
            purchases.mark_sold(f.seller.id, f.listing.id, f.seller.id).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_buyer_cannot_see_purchase() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        assert!(matches!(
            purchases.confirm(f.other.id, pending.id, 5).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            purchases.cancel(f.other.id, pending.id).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_requires_rating_in_range() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        assert!(matches!(
            purchases.confirm(f.buyer.id, pending.id, 0).await,
            Err(AppError::Validation { .. })
        ));

        // Nothing was applied.
        let listing = f.services.listings.get(f.listing.id).await.unwrap();
        assert!(!listing.is_sold);
        let seller = f.services.reputation.profile(f.seller.id).await.unwrap();
        assert_eq!(seller.items_sold_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_confirm_is_conflict() {
        let f = fixture().await;
        let purchases = &f.services.purchases;

        let (_, pending) = purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();
        purchases.confirm(f.buyer.id, pending.id, 3).await.unwrap();
        assert!(matches!(
            purchases.cancel(f.buyer.id, pending.id).await,
            Err(AppError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_purchase_list_carries_listing_and_seller() {
        let f = fixture().await;
        f.services
            .purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();

        let list = f.services.purchases.list_for_buyer(f.buyer.id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].listing_title, f.listing.title);
        assert_eq!(list[0].seller_email, f.seller.email);
        assert!(f.services.purchases.list_for_buyer(f.other.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirms_apply_once() {
        let f = fixture().await;
        let (_, pending) = f
            .services
            .purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();

        let (a, b) = (f.services.purchases.clone(), f.services.purchases.clone());
        let buyer_id = f.buyer.id;
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.confirm(buyer_id, pending.id, 5).await }),
            tokio::spawn(async move { b.confirm(buyer_id, pending.id, 4).await }),
        );
        let results = [first.unwrap(), second.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict { .. })))
                .count(),
            1
        );

        let profile = f.services.reputation.profile(f.seller.id).await.unwrap();
        assert_eq!(profile.items_sold_count(), 1);
        assert_eq!(profile.summary.rating_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mark_sold_keeps_one_pending_buyer() {
        let f = fixture().await;
        let (a, b) = (f.services.purchases.clone(), f.services.purchases.clone());
        let (seller_id, listing_id) = (f.seller.id, f.listing.id);
        let (buyer_id, other_id) = (f.buyer.id, f.other.id);

        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.mark_sold(seller_id, listing_id, buyer_id).await }),
            tokio::spawn(async move { b.mark_sold(seller_id, listing_id, other_id).await }),
        );
        let results = [first.unwrap(), second.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict { .. })))
                .count(),
            1
        );

        let purchases = &f.services.purchases;
        let pending: Vec<_> = [
            purchases.list_for_buyer(f.buyer.id).await.unwrap(),
            purchases.list_for_buyer(f.other.id).await.unwrap(),
        ]
        .into_iter()
        .flatten()
        .filter(|d| d.purchase.status == PurchaseStatus::Pending)
        .collect();
        assert_eq!(pending.len(), 1);

        let listing = f.services.listings.get(f.listing.id).await.unwrap();
        assert_eq!(listing.purchase_id, Some(pending[0].purchase.id));
        assert!(!listing.is_sold);
    }
}
