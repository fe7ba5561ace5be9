//! In-memory store backing the test suite.
//!
//! Same contract as the Postgres adapter; each operation runs inside a
//! single mutex-guarded critical section, so the relation row and the
//! cached counter always move together here too.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{NewProfile, NewUser, ProfileChanges, Store, StoreError, StoreResult, UserChanges};
use crate::domain::profiles::{LikeOutcome, Profile, ProfileStatus};
use crate::domain::users::User;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
    profile_by_user: HashMap<Uuid, Uuid>,
    /// (liker profile id, target profile id)
    likes: HashSet<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock();

        if inner.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .inner
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let mut inner = self.inner.lock();

        if let Some(email) = &changes.email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }

        Ok(user.clone())
    }

    async fn create_profile(&self, user_id: Uuid, new: NewProfile) -> StoreResult<Profile> {
        let mut inner = self.inner.lock();

        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }
        if inner.profile_by_user.contains_key(&user_id) {
            return Err(StoreError::DuplicateProfile);
        }

        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id,
            image: new.image,
            status: new.status,
            number: new.number,
            like_count: 0,
            is_paid: false,
            created_at: now,
            updated_at: now,
        };
        inner.profile_by_user.insert(user_id, profile.id);
        inner.profiles.insert(profile.id, profile.clone());

        Ok(profile)
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let inner = self.inner.lock();
        Ok(inner
            .profile_by_user
            .get(&user_id)
            .and_then(|id| inner.profiles.get(id))
            .cloned())
    }

    async fn find_profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.inner.lock().profiles.get(&id).cloned())
    }

    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> StoreResult<Profile> {
        let mut inner = self.inner.lock();

        let profile_id = *inner
            .profile_by_user
            .get(&user_id)
            .ok_or(StoreError::NotFound)?;
        let profile = inner
            .profiles
            .get_mut(&profile_id)
            .ok_or(StoreError::NotFound)?;

        if let Some(status) = changes.status {
            profile.status = status;
        }
        if let Some(number) = changes.number {
            profile.number = Some(number);
        }
        if let Some(image) = changes.image {
            profile.image = Some(image);
        }
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }

    async fn delete_profile(&self, user_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock();

        let profile_id = inner
            .profile_by_user
            .remove(&user_id)
            .ok_or(StoreError::NotFound)?;
        inner.profiles.remove(&profile_id);

        // Give back the likes this profile handed out, then drop every
        // relation row it appears in.
        let handed_out: Vec<Uuid> = inner
            .likes
            .iter()
            .filter(|(liker, _)| *liker == profile_id)
            .map(|(_, target)| *target)
            .collect();
        for target in handed_out {
            if let Some(p) = inner.profiles.get_mut(&target) {
                p.like_count = (p.like_count - 1).max(0);
            }
        }
        inner
            .likes
            .retain(|(liker, target)| *liker != profile_id && *target != profile_id);

        Ok(())
    }

    async fn set_paid(&self, user_id: Uuid, is_paid: bool) -> StoreResult<()> {
        let mut inner = self.inner.lock();

        let profile_id = *inner
            .profile_by_user
            .get(&user_id)
            .ok_or(StoreError::NotFound)?;
        let profile = inner
            .profiles
            .get_mut(&profile_id)
            .ok_or(StoreError::NotFound)?;
        profile.is_paid = is_paid;
        profile.updated_at = Utc::now();

        Ok(())
    }

    async fn toggle_like(&self, liker_id: Uuid, target_id: Uuid) -> StoreResult<LikeOutcome> {
        let mut inner = self.inner.lock();

        if !inner.profiles.contains_key(&liker_id) || !inner.profiles.contains_key(&target_id) {
            return Err(StoreError::NotFound);
        }

        let outcome = if inner.likes.remove(&(liker_id, target_id)) {
            LikeOutcome::Unliked
        } else {
            inner.likes.insert((liker_id, target_id));
            LikeOutcome::Liked
        };

        let target = inner
            .profiles
            .get_mut(&target_id)
            .ok_or(StoreError::NotFound)?;
        match outcome {
            LikeOutcome::Liked => target.like_count += 1,
            LikeOutcome::Unliked => target.like_count = (target.like_count - 1).max(0),
        }

        Ok(outcome)
    }

    async fn top_liked(&self, liker_id: Uuid, limit: usize) -> StoreResult<Vec<Profile>> {
        let inner = self.inner.lock();

        let mut liked: Vec<Profile> = inner
            .likes
            .iter()
            .filter(|(liker, _)| *liker == liker_id)
            .filter_map(|(_, target)| inner.profiles.get(target))
            .cloned()
            .collect();

        liked.sort_by(|a, b| b.like_count.cmp(&a.like_count).then(a.id.cmp(&b.id)));
        liked.truncate(limit);

        Ok(liked)
    }
}
