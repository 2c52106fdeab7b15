//! Postgres-backed listing store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    Listing, ListingFilter, ListingSort, ListingWithOffer, NewListing, PurchaseStatus,
    UpdateListing,
};
use crate::repositories::{ListingStore, like_pattern};
use crate::schema::{listings, purchases};

#[derive(Clone)]
pub struct ListingRepository {
    pool: AsyncDbPool,
}

impl ListingRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for ListingRepository {
    async fn create(&self, new_listing: NewListing) -> AppResult<Listing> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(listings::table)
            .values(&new_listing)
            .returning(Listing::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, listing_id: i32) -> AppResult<Option<Listing>> {
        let mut conn = self.pool.get().await?;

        listings::table
            .find(listing_id)
            .select(Listing::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn update(&self, listing_id: i32, changes: UpdateListing) -> AppResult<Listing> {
        let mut conn = self.pool.get().await?;

        diesel::update(listings::table.find(listing_id))
            .set(&changes)
            .returning(Listing::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| AppError::not_found("listing", "id", listing_id))
    }

    async fn delete_owned(&self, listing_id: i32, owner: i32) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::delete(
            listings::table
                .filter(listings::id.eq(listing_id))
                .filter(listings::owner_id.eq(owner)),
        )
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
    }

    async fn search(&self, filter: &ListingFilter) -> AppResult<Vec<ListingWithOffer>> {
        let mut conn = self.pool.get().await?;

        let mut query = listings::table
            .left_join(
                purchases::table.on(purchases::listing_id
                    .eq(listings::id)
                    .and(purchases::status.eq(PurchaseStatus::Pending))),
            )
            .select((Listing::as_select(), purchases::buyer_id.nullable()))
            .into_boxed();

        if let Some(term) = filter.query.as_deref() {
            let pattern = like_pattern(term);
            query = query.filter(
                listings::title
                    .ilike(pattern.clone())
                    .or(listings::description.ilike(pattern)),
            );
        }
        if let Some(category) = filter.category.clone() {
            query = query.filter(listings::category.eq(category));
        }
        if let Some(min) = filter.min_price.clone() {
            query = query.filter(listings::price.ge(min));
        }
        if let Some(max) = filter.max_price.clone() {
            query = query.filter(listings::price.le(max));
        }
        if let Some(location) = filter.location.as_deref() {
            query = query.filter(listings::location.ilike(like_pattern(location)));
        }
        if !filter.include_sold {
            query = query.filter(listings::is_sold.eq(false));
        }

        query = match filter.sort {
            ListingSort::Newest => query.order((listings::created_at.desc(), listings::id.desc())),
            ListingSort::Oldest => query.order((listings::created_at.asc(), listings::id.asc())),
            ListingSort::PriceAsc => query.order((listings::price.asc(), listings::id.asc())),
            ListingSort::PriceDesc => query.order((listings::price.desc(), listings::id.desc())),
        };

        let rows: Vec<(Listing, Option<i32>)> = query
            .offset(filter.offset)
            .limit(filter.limit)
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(listing, pending_buyer_id)| ListingWithOffer {
                listing,
                pending_buyer_id,
            })
            .collect())
    }

    async fn list_by_owner(&self, owner: i32, sold: Option<bool>) -> AppResult<Vec<Listing>> {
        let mut conn = self.pool.get().await?;

        let mut query = listings::table
            .filter(listings::owner_id.eq(owner))
            .select(Listing::as_select())
            .into_boxed();

        if let Some(sold) = sold {
            query = query.filter(listings::is_sold.eq(sold));
        }

        query
            .order((listings::created_at.desc(), listings::id.desc()))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
