//! Persistence port for user accounts, profiles and the like relation.
//!
//! Route handlers only ever talk to [`Store`]; the Postgres adapter backs
//! the running service and the in-memory adapter backs the test suite.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::profiles::{LikeOutcome, Profile, ProfileStatus};
use crate::domain::users::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("a user with this email already exists")]
    DuplicateEmail,

    #[error("a profile already exists for this user")]
    DuplicateProfile,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Field set for inserting a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Partial update for a user account; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Field set for inserting a profile.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub status: ProfileStatus,
    pub number: Option<String>,
    pub image: Option<String>,
}

/// Partial update for a profile; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub status: Option<ProfileStatus>,
    pub number: Option<String>,
    pub image: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend connectivity probe for the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User>;

    // Profiles
    async fn create_profile(&self, user_id: Uuid, new: NewProfile) -> StoreResult<Profile>;
    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    async fn find_profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> StoreResult<Profile>;
    /// Removes the profile and its relation memberships, decrementing the
    /// cached counts of the profiles it had liked.
    async fn delete_profile(&self, user_id: Uuid) -> StoreResult<()>;
    /// Seam for the (external) payment flow; no HTTP route reaches this.
    async fn set_paid(&self, user_id: Uuid, is_paid: bool) -> StoreResult<()>;

    // Likes
    /// Toggle `target` in `liker`'s liked set, moving `target`'s cached
    /// count with the relation row in one atomic step. Callers must have
    /// rejected `liker == target` already.
    async fn toggle_like(&self, liker_id: Uuid, target_id: Uuid) -> StoreResult<LikeOutcome>;
    /// The liker's liked set, ordered by descending like count (ties by
    /// ascending id), truncated to `limit`.
    async fn top_liked(&self, liker_id: Uuid, limit: usize) -> StoreResult<Vec<Profile>>;
}
