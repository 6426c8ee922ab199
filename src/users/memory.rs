use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, UniqueField, User, UserChanges, UserFilter};

/// In-process store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record, including the password hash.
    pub fn snapshot(&self, id: Uuid) -> Option<User> {
        self.users.read().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn collision(users: &[User], email: &str, username: &str, skip: Option<Uuid>) -> Option<UniqueField> {
        let others = || users.iter().filter(|u| Some(u.id) != skip);
        if others().any(|u| u.email == email) {
            return Some(UniqueField::Email);
        }
        if others().any(|u| u.username == username) {
            return Some(UniqueField::Username);
        }
        None
    }
}

fn hits_search(user: &User, needle: &str) -> bool {
    [&user.username, &user.email, &user.first_name, &user.last_name]
        .iter()
        .any(|v| v.to_lowercase().contains(needle))
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap();
        if let Some(field) = Self::collision(&users, &new_user.email, &new_user.username, None) {
            return Err(StoreError::Duplicate(field));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: new_user.role,
            profile_image: new_user.profile_image,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn list(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let users = self.users.read().unwrap();
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let hits: Vec<&User> = users
            .iter()
            .rev()
            .filter(|u| needle.as_deref().map_or(true, |n| hits_search(u, n)))
            .collect();
        let total = hits.len() as i64;
        let page = hits
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().unwrap();
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };

        let mut next = users[idx].clone();
        if let Some(v) = changes.email {
            next.email = v;
        }
        if let Some(v) = changes.username {
            next.username = v;
        }
        if let Some(v) = changes.password_hash {
            next.password_hash = v;
        }
        if let Some(v) = changes.first_name {
            next.first_name = v;
        }
        if let Some(v) = changes.last_name {
            next.last_name = v;
        }
        if let Some(v) = changes.role {
            next.role = v;
        }
        if let Some(v) = changes.profile_image {
            next.profile_image = v;
        }
        if let Some(field) = Self::collision(&users, &next.email, &next.username, Some(id)) {
            return Err(StoreError::Duplicate(field));
        }
        next.updated_at = OffsetDateTime::now_utc().max(next.created_at);
        users[idx] = next.clone();
        Ok(Some(next))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}
