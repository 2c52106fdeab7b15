//! Postgres-backed rating store.

use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use diesel::dsl::{avg, count_star};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewRating, Rating, RatingSummary, now};
use crate::repositories::RatingStore;
use crate::schema::user_ratings;

#[derive(Clone)]
pub struct RatingRepository {
    pool: AsyncDbPool,
}

impl RatingRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingStore for RatingRepository {
    async fn upsert(&self, new_rating: NewRating) -> AppResult<Rating> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(user_ratings::table)
            .values(&new_rating)
            .on_conflict((user_ratings::listing_id, user_ratings::rater_id))
            .do_update()
            .set((
                user_ratings::user_id.eq(new_rating.user_id),
                user_ratings::rating.eq(new_rating.rating),
                user_ratings::comment.eq(new_rating.comment.clone()),
                user_ratings::created_at.eq(now()),
            ))
            .returning(Rating::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn summary_for(&self, ratee: i32) -> AppResult<RatingSummary> {
        let mut conn = self.pool.get().await?;

        let (average, count): (Option<BigDecimal>, i64) = user_ratings::table
            .filter(user_ratings::user_id.eq(ratee))
            .select((avg(user_ratings::rating), count_star()))
            .first(&mut conn)
            .await?;

        Ok(RatingSummary {
            average_rating: average.and_then(|value| value.to_f64()).unwrap_or(0.0),
            rating_count: count,
        })
    }
}
