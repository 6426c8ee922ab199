use tracing::{info, warn};
use uuid::Uuid;

use super::dto::Pagination;
use super::repo::UserStore;
use super::repo_types::{NewUser, Role, UniqueField, User, UserChanges, UserFilter};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult, AuthFailure};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Validated input for a new account. `password` is still plaintext here.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub profile_image: String,
}

/// Validated partial update. `None` means "not supplied".
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl ListParams {
    /// Out-of-range values fall back to the defaults; limit is capped.
    pub fn new(page: Option<i64>, limit: Option<i64>, search: Option<String>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            page,
            limit,
            search,
        }
    }

    fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub struct UserPage {
    pub items: Vec<User>,
    pub pagination: Pagination,
}

/// Email is checked before username so the conflict names the first colliding field.
async fn ensure_unique(
    store: &dyn UserStore,
    email: Option<&str>,
    username: Option<&str>,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    if let Some(email) = email {
        if let Some(other) = store.find_by_email(email).await? {
            if Some(other.id) != exclude {
                return Err(AppError::Conflict(UniqueField::Email));
            }
        }
    }
    if let Some(username) = username {
        if let Some(other) = store.find_by_username(username).await? {
            if Some(other.id) != exclude {
                return Err(AppError::Conflict(UniqueField::Username));
            }
        }
    }
    Ok(())
}

pub async fn create_user(store: &dyn UserStore, draft: UserDraft) -> AppResult<User> {
    ensure_unique(store, Some(&draft.email), Some(&draft.username), None).await?;

    let password_hash = hash_password(&draft.password)?;
    let user = store
        .insert(NewUser {
            email: draft.email,
            username: draft.username,
            password_hash,
            first_name: draft.first_name,
            last_name: draft.last_name,
            role: draft.role,
            profile_image: draft.profile_image,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user)
}

pub async fn get_user(store: &dyn UserStore, id: Uuid) -> AppResult<User> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(AppError::user_not_found)
}

pub async fn list_users(store: &dyn UserStore, params: &ListParams) -> AppResult<UserPage> {
    let filter = UserFilter {
        search: params.search.clone(),
    };
    let (items, total) = store.list(&filter, params.offset(), params.limit).await?;
    Ok(UserPage {
        items,
        pagination: Pagination::new(params.page, params.limit, total),
    })
}

pub async fn update_user(store: &dyn UserStore, id: Uuid, patch: UserPatch) -> AppResult<User> {
    let current = get_user(store, id).await?;

    let email = patch.email.filter(|e| *e != current.email);
    let username = patch.username.filter(|u| *u != current.username);
    ensure_unique(store, email.as_deref(), username.as_deref(), Some(id)).await?;

    let password_hash = match patch.password {
        Some(plain) => Some(hash_password(&plain)?),
        None => None,
    };

    let changes = UserChanges {
        email,
        username,
        password_hash,
        first_name: patch.first_name,
        last_name: patch.last_name,
        role: patch.role,
        profile_image: patch.profile_image,
    };
    let user = store
        .update(id, changes)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn delete_user(store: &dyn UserStore, id: Uuid) -> AppResult<()> {
    if !store.delete(id).await? {
        return Err(AppError::user_not_found());
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}

/// Unknown email and wrong password produce the same error.
pub async fn authenticate(store: &dyn UserStore, email: &str, password: &str) -> AppResult<User> {
    let Some(user) = store.find_by_email(email).await? else {
        warn!("login unknown email");
        return Err(AppError::Authentication(AuthFailure::InvalidCredentials));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Authentication(AuthFailure::InvalidCredentials));
    }
    Ok(user)
}
