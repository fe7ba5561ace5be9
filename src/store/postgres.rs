//! Postgres-backed store.
//!
//! Counter arithmetic happens inside the database, in the same
//! transaction as the relation row it mirrors, so concurrent toggles
//! against one target never lose updates. The hot "my profile" lookup
//! goes through a read-through Redis cache that every mutating path
//! invalidates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewProfile, NewUser, ProfileChanges, Store, StoreError, StoreResult, UserChanges};
use crate::domain::profiles::{LikeOutcome, Profile, ProfileStatus};
use crate::domain::users::User;
use crate::services::cache::{keys as cache_keys, ttl as cache_ttl, RedisCache};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, created_at";
const PROFILE_COLUMNS: &str =
    "id, user_id, image, status, number, like_count, is_paid, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    image: Option<String>,
    status: String,
    number: Option<String>,
    like_count: i64,
    is_paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            image: row.image,
            status: ProfileStatus::from_db(&row.status),
            number: row.number,
            like_count: row.like_count,
            is_paid: row.is_paid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

pub struct PostgresStore {
    pool: PgPool,
    cache: RedisCache,
}

impl PostgresStore {
    pub fn new(pool: PgPool, cache: RedisCache) -> Self {
        Self { pool, cache }
    }

    async fn cache_profile(&self, profile: &Profile) {
        let key = cache_keys::profile(profile.user_id);
        let _ = self
            .cache
            .set_with_ttl(&key, profile, cache_ttl::PROFILE)
            .await;
    }

    async fn invalidate_profile(&self, user_id: Uuid) {
        let _ = self.cache.delete(&cache_keys::profile(user_id)).await;
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, name, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 email = COALESCE($2, email), \
                 name = COALESCE($3, name), \
                 password_hash = COALESCE($4, password_hash) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.name)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?
        .ok_or(StoreError::NotFound)?;

        Ok(row.into())
    }

    async fn create_profile(&self, user_id: Uuid, new: NewProfile) -> StoreResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (user_id, status, number, image) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new.status.as_str())
        .bind(&new.number)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateProfile
            } else if is_foreign_key_violation(&e) {
                StoreError::NotFound
            } else {
                StoreError::Database(e)
            }
        })?;

        let profile: Profile = row.into();
        self.cache_profile(&profile).await;

        Ok(profile)
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let cache_key = cache_keys::profile(user_id);
        if let Some(cached) = self.cache.get::<Profile>(&cache_key).await {
            return Ok(Some(cached));
        }

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let profile: Option<Profile> = row.map(Into::into);
        if let Some(ref p) = profile {
            self.cache_profile(p).await;
        }

        Ok(profile)
    }

    async fn find_profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> StoreResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE profiles SET \
                 status = COALESCE($2, status), \
                 number = COALESCE($3, number), \
                 image = COALESCE($4, image), \
                 updated_at = now() \
             WHERE user_id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(&changes.number)
        .bind(&changes.image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let profile: Profile = row.into();
        self.cache_profile(&profile).await;

        Ok(profile)
    }

    async fn delete_profile(&self, user_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let profile_id: Uuid = sqlx::query_scalar(
            "SELECT id FROM profiles WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        // Give back the likes this profile handed out before the relation
        // rows cascade away, keeping count == reverse cardinality.
        let liked_owners: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE profiles SET like_count = GREATEST(like_count - 1, 0) \
             WHERE id IN (SELECT target_id FROM profile_likes WHERE liker_id = $1) \
             RETURNING user_id",
        )
        .bind(profile_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.invalidate_profile(user_id).await;
        for owner in liked_owners {
            self.invalidate_profile(owner).await;
        }

        Ok(())
    }

    async fn set_paid(&self, user_id: Uuid, is_paid: bool) -> StoreResult<()> {
        let updated = sqlx::query(
            "UPDATE profiles SET is_paid = $2, updated_at = now() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(is_paid)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.invalidate_profile(user_id).await;
        Ok(())
    }

    async fn toggle_like(&self, liker_id: Uuid, target_id: Uuid) -> StoreResult<LikeOutcome> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM profile_likes WHERE liker_id = $1 AND target_id = $2",
        )
        .bind(liker_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let (outcome, target_owner): (LikeOutcome, Uuid) = if removed == 0 {
            sqlx::query("INSERT INTO profile_likes (liker_id, target_id) VALUES ($1, $2)")
                .bind(liker_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        StoreError::NotFound
                    } else {
                        StoreError::Database(e)
                    }
                })?;

            let owner: Uuid = sqlx::query_scalar(
                "UPDATE profiles SET like_count = like_count + 1 \
                 WHERE id = $1 RETURNING user_id",
            )
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

            (LikeOutcome::Liked, owner)
        } else {
            let owner: Uuid = sqlx::query_scalar(
                "UPDATE profiles SET like_count = GREATEST(like_count - 1, 0) \
                 WHERE id = $1 RETURNING user_id",
            )
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

            (LikeOutcome::Unliked, owner)
        };

        tx.commit().await?;

        self.invalidate_profile(target_owner).await;

        Ok(outcome)
    }

    async fn top_liked(&self, liker_id: Uuid, limit: usize) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT p.id, p.user_id, p.image, p.status, p.number, \
                    p.like_count, p.is_paid, p.created_at, p.updated_at \
             FROM profiles p \
             JOIN profile_likes l ON l.target_id = p.id \
             WHERE l.liker_id = $1 \
             ORDER BY p.like_count DESC, p.id ASC \
             LIMIT $2",
        )
        .bind(liker_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
