//! Postgres-backed purchase state machine.
//!
//! Every transition runs in one transaction. The listing row is locked
//! `FOR UPDATE` first so concurrent transitions on the same listing serialize,
//! and the partial unique index on pending purchases catches anything that
//! slips past the in-transaction checks.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, info};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    Listing, NewPurchase, Purchase, PurchaseDetails, PurchaseStatus, now,
};
use crate::repositories::PurchaseStore;
use crate::schema::{listings, purchases, user_ratings, users};

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: AsyncDbPool,
}

impl PurchaseRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

async fn lock_listing(conn: &mut AsyncPgConnection, listing_id: i32) -> AppResult<Listing> {
    listings::table
        .find(listing_id)
        .select(Listing::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("listing", "id", listing_id))
}

#[async_trait]
impl PurchaseStore for PurchaseRepository {
    async fn open_pending(
        &self,
        listing_id: i32,
        buyer_id: i32,
        seller_id: i32,
    ) -> AppResult<(Listing, Purchase)> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let listing = lock_listing(conn, listing_id).await?;
                if listing.is_sold {
                    return Err(AppError::conflict("Listing already sold"));
                }

                let competing: Option<i32> = purchases::table
                    .filter(purchases::listing_id.eq(listing_id))
                    .filter(purchases::status.eq(PurchaseStatus::Pending))
                    .filter(purchases::buyer_id.ne(buyer_id))
                    .select(purchases::id)
                    .first(conn)
                    .await
                    .optional()?;
                if competing.is_some() {
                    return Err(AppError::conflict(
                        "Listing already has a pending purchase for another buyer",
                    ));
                }

                let purchase = diesel::insert_into(purchases::table)
                    .values(&NewPurchase {
                        listing_id,
                        buyer_id,
                        seller_id,
                        status: PurchaseStatus::Pending,
                    })
                    .on_conflict((purchases::listing_id, purchases::buyer_id))
                    .do_update()
                    .set((
                        purchases::status.eq(PurchaseStatus::Pending),
                        purchases::created_at.eq(now()),
                        purchases::confirmed_at.eq(None::<jiff_diesel::Timestamp>),
                    ))
                    .returning(Purchase::as_returning())
                    .get_result(conn)
                    .await?;

                let listing = diesel::update(listings::table.find(listing_id))
                    .set(listings::purchase_id.eq(Some(purchase.id)))
                    .returning(Listing::as_returning())
                    .get_result(conn)
                    .await?;

                Ok((listing, purchase))
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(&self, purchase_id: i32) -> AppResult<Option<Purchase>> {
        let mut conn = self.pool.get().await?;

        purchases::table
            .find(purchase_id)
            .select(Purchase::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn confirm(&self, purchase_id: i32, buyer_id: i32, rating: i32) -> AppResult<Purchase> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                // Compare-and-set: only one confirm of a pending purchase can win.
                let purchase = diesel::update(
                    purchases::table
                        .filter(purchases::id.eq(purchase_id))
                        .filter(purchases::buyer_id.eq(buyer_id))
                        .filter(purchases::status.eq(PurchaseStatus::Pending)),
                )
                .set((
                    purchases::status.eq(PurchaseStatus::Confirmed),
                    purchases::confirmed_at.eq(Some(now())),
                ))
                .returning(Purchase::as_returning())
                .get_result(conn)
                .await
                .optional()?
                .ok_or_else(|| AppError::conflict("Purchase already confirmed or cancelled"))?;

                diesel::update(listings::table.find(purchase.listing_id))
                    .set((
                        listings::is_sold.eq(true),
                        listings::purchase_id.eq(Some(purchase.id)),
                    ))
                    .execute(conn)
                    .await?;

                diesel::update(users::table.find(purchase.seller_id))
                    .set(users::items_sold_count.eq(users::items_sold_count + 1))
                    .execute(conn)
                    .await?;

                diesel::insert_into(user_ratings::table)
                    .values((
                        user_ratings::user_id.eq(purchase.seller_id),
                        user_ratings::rater_id.eq(buyer_id),
                        user_ratings::listing_id.eq(purchase.listing_id),
                        user_ratings::rating.eq(rating),
                    ))
                    .on_conflict((user_ratings::listing_id, user_ratings::rater_id))
                    .do_update()
                    .set((
                        user_ratings::rating.eq(rating),
                        user_ratings::comment.eq(None::<String>),
                        user_ratings::created_at.eq(now()),
                    ))
                    .execute(conn)
                    .await?;

                debug!(purchase_id, listing_id = purchase.listing_id, "Purchase confirmed in store");
                Ok(purchase)
            }
            .scope_boxed()
        })
        .await
    }

    async fn cancel(&self, purchase_id: i32, buyer_id: i32) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let purchase: Purchase = purchases::table
                    .filter(purchases::id.eq(purchase_id))
                    .filter(purchases::buyer_id.eq(buyer_id))
                    .select(Purchase::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| AppError::not_found("purchase", "id", purchase_id))?;

                if !purchase.status.can_transition_to(PurchaseStatus::Cancelled) {
                    return Err(AppError::conflict("Purchase already confirmed or cancelled"));
                }

                diesel::update(listings::table.find(purchase.listing_id))
                    .set((
                        listings::purchase_id.eq(None::<i32>),
                        listings::is_sold.eq(false),
                    ))
                    .execute(conn)
                    .await?;

                diesel::delete(purchases::table.find(purchase_id))
                    .execute(conn)
                    .await?;

                info!(purchase_id, listing_id = purchase.listing_id, "Purchase row removed");
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn list_for_buyer(&self, buyer_id: i32) -> AppResult<Vec<PurchaseDetails>> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(Purchase, (String, bigdecimal::BigDecimal, String), (Option<String>, String))> =
            purchases::table
                .inner_join(listings::table.on(listings::id.eq(purchases::listing_id)))
                .inner_join(users::table.on(users::id.eq(purchases::seller_id)))
                .filter(purchases::buyer_id.eq(buyer_id))
                .order((purchases::created_at.desc(), purchases::id.desc()))
                .select((
                    Purchase::as_select(),
                    (listings::title, listings::price, listings::image_url),
                    (users::name, users::email),
                ))
                .load(&mut conn)
                .await?;

        Ok(rows
            .into_iter()
            .map(
                |(purchase, (listing_title, listing_price, listing_image_url), (seller_name, seller_email))| {
                    PurchaseDetails {
                        purchase,
                        listing_title,
                        listing_price,
                        listing_image_url,
                        seller_name,
                        seller_email,
                    }
                },
            )
            .collect())
    }
}
