//! Profile domain types
//!
//! One profile per user, holding social status metadata, the cached
//! like counter and the payment flag that gates field visibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of entries the top-liked listing returns.
pub const TOP_LIKED_LIMIT: usize = 5;

/// Relationship status choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Single,
    Married,
    Complicated,
    Engaged,
}

impl Default for ProfileStatus {
    fn default() -> Self {
        Self::Single
    }
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::Complicated => "complicated",
            Self::Engaged => "engaged",
        }
    }

    /// Map a stored string back to a status. Unknown values fold to the
    /// default rather than failing the row.
    pub fn from_db(s: &str) -> Self {
        match s {
            "married" => Self::Married,
            "complicated" => Self::Complicated,
            "engaged" => Self::Engaged,
            _ => Self::Single,
        }
    }
}

/// Profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image: Option<String>,
    pub status: ProfileStatus,
    pub number: Option<String>,
    pub like_count: i64,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which branch a like toggle took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

impl LikeOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Liked => "Profile liked!",
            Self::Unliked => "Profile unliked!",
        }
    }
}

/// Request DTO for updating a profile
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub status: Option<ProfileStatus>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Request DTO for creating a profile
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub status: Option<ProfileStatus>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Response DTO for profile
///
/// The contact number is only exposed once the profile owner has paid:
/// `None` keeps the key out of the serialized output entirely, while
/// `Some(None)` renders an explicit null for a paid profile with no
/// number on record.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub image: Option<String>,
    pub status: ProfileStatus,
    pub like_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<Option<String>>,
}

impl From<&Profile> for ProfileResponse {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            image: p.image.clone(),
            status: p.status,
            like_count: p.like_count,
            number: if p.is_paid {
                Some(p.number.clone())
            } else {
                None
            },
        }
    }
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self::from(&p)
    }
}
