//! Listing lifecycle: create, edit, delete and browse.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    Listing, ListingFilter, ListingWithOffer, NewListing, PLACEHOLDER_IMAGE_URL, UpdateListing,
};
use crate::repositories::{ListingStore, UserStore};

/// Fields accepted when creating a listing. Already validated at the boundary.
#[derive(Debug, Clone)]
pub struct CreateListing {
    pub title: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

/// How to reach a listing's seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerContact {
    pub listing_id: i32,
    pub seller_id: i32,
    pub seller_email: String,
    pub mailto: String,
}

#[derive(Clone)]
pub struct ListingService {
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
}

impl ListingService {
    pub fn new(users: Arc<dyn UserStore>, listings: Arc<dyn ListingStore>) -> Self {
        Self { users, listings }
    }

    pub async fn search(&self, filter: &ListingFilter) -> AppResult<Vec<ListingWithOffer>> {
        self.listings.search(filter).await
    }

    pub async fn get(&self, listing_id: i32) -> AppResult<Listing> {
        self.listings
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| AppError::not_found("listing", "id", listing_id))
    }

    /// Creates a listing owned by `owner_id`.
    ///
    /// The owner's display name is copied onto the listing and does not follow
    /// later renames.
    pub async fn create(&self, owner_id: i32, input: CreateListing) -> AppResult<Listing> {
        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", owner_id))?;

        let image_url = input
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string());

        let listing = self
            .listings
            .create(NewListing {
                title: input.title,
                description: input.description,
                price: input.price,
                category: input.category,
                image_url,
                seller_display_name: owner.display_name(),
                owner_id: Some(owner.id),
                location: input.location.unwrap_or_default(),
            })
            .await?;

        info!(listing_id = listing.id, owner_id, "Listing created");
        Ok(listing)
    }

    /// Merges `changes` into the owner's listing.
    pub async fn update(
        &self,
        owner_id: i32,
        listing_id: i32,
        changes: UpdateListing,
    ) -> AppResult<Listing> {
        let existing = self.get(listing_id).await?;
        if !existing.is_owned_by(owner_id) {
            return Err(AppError::forbidden("Forbidden"));
        }
        if changes.is_empty() {
            return Ok(existing);
        }

        let listing = self.listings.update(listing_id, changes).await?;
        info!(listing_id, owner_id, "Listing updated");
        Ok(listing)
    }

    /// Deletes the listing if `owner_id` owns it.
    ///
    /// Missing and not-owned are reported identically.
    pub async fn delete(&self, owner_id: i32, listing_id: i32) -> AppResult<()> {
        let deleted = self.listings.delete_owned(listing_id, owner_id).await?;
        if deleted == 0 {
            return Err(AppError::not_found("listing", "id", listing_id));
        }

        info!(listing_id, owner_id, "Listing deleted");
        Ok(())
    }

    pub async fn contact(&self, listing_id: i32) -> AppResult<SellerContact> {
        let listing = self.get(listing_id).await?;
        let owner_id = listing.owner_id.ok_or_else(|| {
            AppError::bad_request("Seller has no contact email for this listing yet")
        })?;
        let seller = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", owner_id))?;

        let subject = format!("Inquiry about {}", listing.title);
        Ok(SellerContact {
            listing_id,
            seller_id: seller.id,
            mailto: format!(
                "mailto:{}?subject={}",
                seller.email,
                urlencoding::encode(&subject)
            ),
            seller_email: seller.email,
        })
    }

    /// Listings owned by `owner_id`, optionally narrowed by sold flag.
    pub async fn list_by_owner(&self, owner_id: i32, sold: Option<bool>) -> AppResult<Vec<Listing>> {
        self.listings.list_by_owner(owner_id, sold).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingSort;
    use crate::services::testing::{fixture, sample_listing};

    #[tokio::test]
    async fn test_create_snapshots_display_name_and_defaults_image() {
        let f = fixture().await;
        let mut input = sample_listing("Lamp");
        input.image_url = Some("   ".to_string());

        let listing = f.services.listings.create(f.buyer.id, input).await.unwrap();
        assert_eq!(listing.image_url, PLACEHOLDER_IMAGE_URL);
        assert_eq!(listing.seller_display_name, f.buyer.display_name());
        assert_eq!(listing.owner_id, Some(f.buyer.id));
        assert!(!listing.is_sold);
        assert_eq!(listing.location, "");
    }

    #[tokio::test]
    async fn test_display_name_does_not_follow_rename() {
        let f = fixture().await;
        let before = f.listing.seller_display_name.clone();
        f.services
            .users
            .update_profile(
                f.seller.id,
                f.seller.id,
                crate::services::ProfileChanges {
                    name: Some("Renamed".to_string()),
                    location: None,
                },
            )
            .await
            .unwrap();

        let listing = f.services.listings.get(f.listing.id).await.unwrap();
        assert_eq!(listing.seller_display_name, before);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let f = fixture().await;
        let changes = UpdateListing {
            price: Some(BigDecimal::from(7)),
            ..UpdateListing::default()
        };
        let updated = f
            .services
            .listings
            .update(f.seller.id, f.listing.id, changes)
            .await
            .unwrap();
        assert_eq!(updated.price, BigDecimal::from(7));
        assert_eq!(updated.title, f.listing.title);
        assert_eq!(updated.description, f.listing.description);
    }

    #[tokio::test]
    async fn test_empty_update_returns_listing_unchanged() {
        let f = fixture().await;
        let same = f
            .services
            .listings
            .update(f.seller.id, f.listing.id, UpdateListing::default())
            .await
            .unwrap();
        assert_eq!(same.title, f.listing.title);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let f = fixture().await;
        let changes = UpdateListing {
            title: Some("Mine now".to_string()),
            ..UpdateListing::default()
        };
        assert!(matches!(
            f.services.listings.update(f.buyer.id, f.listing.id, changes.clone()).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            f.services.listings.update(f.seller.id, 9999, changes).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_hides_existence_from_non_owner() {
        let f = fixture().await;
        assert!(matches!(
            f.services.listings.delete(f.buyer.id, f.listing.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            f.services.listings.delete(f.buyer.id, 9999).await,
            Err(AppError::NotFound { .. })
        ));

        f.services.listings.delete(f.seller.id, f.listing.id).await.unwrap();
        assert!(matches!(
            f.services.listings.get(f.listing.id).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_contact_builds_mailto() {
        let f = fixture().await;
        let contact = f.services.listings.contact(f.listing.id).await.unwrap();
        assert_eq!(contact.seller_id, f.seller.id);
        assert_eq!(contact.seller_email, f.seller.email);
        assert_eq!(
            contact.mailto,
            format!(
                "mailto:{}?subject=Inquiry%20about%20{}",
                f.seller.email,
                urlencoding::encode(&f.listing.title)
            )
        );
    }

    #[tokio::test]
    async fn test_contact_subject_escapes_reserved_characters() {
        let f = fixture().await;
        let listing = f
            .services
            .listings
            .create(f.seller.id, sample_listing("Desk (oak) & chair! café"))
            .await
            .unwrap();

        let contact = f.services.listings.contact(listing.id).await.unwrap();
        assert_eq!(
            contact.mailto,
            format!(
                "mailto:{}?subject=Inquiry%20about%20Desk%20%28oak%29%20%26%20chair%21%20caf%C3%A9",
                f.seller.email
            )
        );
    }

    #[tokio::test]
    async fn test_contact_without_owner() {
        let f = fixture().await;
        let orphan = f
            .repos
            .listings
            .create(NewListing {
                title: "Seed chair".to_string(),
                description: "From the demo data".to_string(),
                price: BigDecimal::from(5),
                category: "Furniture".to_string(),
                image_url: PLACEHOLDER_IMAGE_URL.to_string(),
                seller_display_name: "Campus Bazaar".to_string(),
                owner_id: None,
                location: String::new(),
            })
            .await
            .unwrap();

        match f.services.listings.contact(orphan.id).await {
            Err(AppError::BadRequest { message }) => {
                assert_eq!(message, "Seller has no contact email for this listing yet")
            }
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_hides_sold_by_default_and_sorts() {
        let f = fixture().await;
        let cheap = f
            .services
            .listings
            .create(f.seller.id, CreateListing {
                price: BigDecimal::from(1),
                ..sample_listing("Pencil")
            })
            .await
            .unwrap();

        let (_, pending) = f
            .services
            .purchases
            .mark_sold(f.seller.id, f.listing.id, f.buyer.id)
            .await
            .unwrap();

        let filter = ListingFilter {
            sort: ListingSort::PriceAsc,
            limit: 20,
            ..ListingFilter::default()
        };
        let hits = f.services.listings.search(&filter).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].listing.id, cheap.id);
        assert_eq!(hits[1].pending_buyer_id, Some(f.buyer.id));

        f.services.purchases.confirm(f.buyer.id, pending.id, 5).await.unwrap();
        let hits = f.services.listings.search(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);

        let with_sold = ListingFilter {
            include_sold: true,
            ..filter
        };
        assert_eq!(f.services.listings.search(&with_sold).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_owner_sold_filter() {
        let f = fixture().await;
        let all = f.services.listings.list_by_owner(f.seller.id, None).await.unwrap();
        assert_eq!(all.len(), 1);
        let sold = f.services.listings.list_by_owner(f.seller.id, Some(true)).await.unwrap();
        assert!(sold.is_empty());
    }
}
