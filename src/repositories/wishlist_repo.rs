//! Postgres-backed wishlist store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::NewWishlistEntry;
use crate::repositories::WishlistStore;
use crate::schema::wishlist;

#[derive(Clone)]
pub struct WishlistRepository {
    pool: AsyncDbPool,
}

impl WishlistRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WishlistStore for WishlistRepository {
    async fn add(&self, entry: NewWishlistEntry) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(wishlist::table)
            .values(&entry)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn remove(&self, user: i32, listing: i32) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::delete(
            wishlist::table
                .filter(wishlist::user_id.eq(user))
                .filter(wishlist::listing_id.eq(listing)),
        )
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    async fn listing_ids(&self, user: i32) -> AppResult<Vec<i32>> {
        let mut conn = self.pool.get().await?;

        wishlist::table
            .filter(wishlist::user_id.eq(user))
            .order(wishlist::created_at.desc())
            .select(wishlist::listing_id)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
