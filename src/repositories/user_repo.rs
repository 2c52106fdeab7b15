//! Postgres-backed user store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, PendingVerification, UpdateUserProfile, User, UserRecord};
use crate::repositories::{UserStore, like_pattern};

/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users)
            .values(&new_user)
            .returning(UserRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(User::from)
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        let record = users
            .filter(id.eq(user_id))
            .select(UserRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(User::from))
    }

    async fn find_by_email(&self, user_email: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        let record = users
            .filter(email.eq(user_email))
            .select(UserRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record.map(User::from))
    }

    async fn set_pending_verification(
        &self,
        user_id: i32,
        pending: &PendingVerification,
    ) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        let affected = diesel::update(users.filter(id.eq(user_id)))
            .set((
                verification_code_hash.eq(Some(pending.code_hash.clone())),
                verification_expires_at.eq(Some(jiff_diesel::Timestamp::from(pending.expires_at))),
            ))
            .execute(&mut conn)
            .await?;

        if affected == 0 {
            return Err(AppError::not_found("user", "id", user_id));
        }
        Ok(())
    }

    async fn mark_verified(&self, user_id: i32) -> AppResult<User> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set((
                email_verified.eq(true),
                verification_code_hash.eq(None::<String>),
                verification_expires_at.eq(None::<jiff_diesel::Timestamp>),
            ))
            .returning(UserRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .map(User::from)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))
    }

    async fn update_profile(&self, user_id: i32, changes: UpdateUserProfile) -> AppResult<User> {
        use crate::schema::users::dsl::*;

        if changes.is_empty() {
            return self
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::not_found("user", "id", user_id));
        }

        let mut conn = self.pool.get().await?;
        diesel::update(users.filter(id.eq(user_id)))
            .set(&changes)
            .returning(UserRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .map(User::from)
            .ok_or_else(|| AppError::not_found("user", "id", user_id))
    }

    async fn search(&self, term: &str, exclude_id: i32, max: i64) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;
        let pattern = like_pattern(term);

        let records = users
            .filter(email.ilike(pattern.clone()).or(name.ilike(pattern)))
            .filter(id.ne(exclude_id))
            .order((name.asc().nulls_last(), email.asc()))
            .limit(max)
            .select(UserRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records.into_iter().map(User::from).collect())
    }
}
