use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, UniqueField, User, UserChanges, UserFilter, UserRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(UniqueField),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence seam for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Newest first. Returns the page and the total number of matches.
    async fn list(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<User>, i64), StoreError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
    /// `false` when no record had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, role, \
                            profile_image, created_at, updated_at";

const SEARCH_CLAUSE: &str = r#"($1::text IS NULL
       OR username ILIKE $1 ESCAPE '\'
       OR email ILIKE $1 ESCAPE '\'
       OR first_name ILIKE $1 ESCAPE '\'
       OR last_name ILIKE $1 ESCAPE '\')"#;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find user by {column}"))?;
        row.map(User::try_from).transpose().map_err(StoreError::from)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (email, username, password_hash, first_name, last_name, role, profile_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.role.as_str())
            .bind(&new_user.profile_image)
            .fetch_one(&self.db)
            .await
            .map_err(|e| write_error(e, "insert user"))?;
        Ok(User::try_from(row)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        row.map(User::try_from).transpose().map_err(StoreError::from)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one("username", username).await
    }

    async fn list(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let pattern = filter
            .search
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term)));

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE {SEARCH_CLAUSE}
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(pattern.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await
            .context("list users")?;

        let count_sql = format!("SELECT COUNT(*) FROM users WHERE {SEARCH_CLAUSE}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.db)
            .await
            .context("count users")?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((users, total))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash),
                first_name = COALESCE($5, first_name),
                last_name = COALESCE($6, last_name),
                role = COALESCE($7, role),
                profile_image = COALESCE($8, profile_image),
                updated_at = GREATEST(now(), created_at)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.email.as_deref())
            .bind(changes.username.as_deref())
            .bind(changes.password_hash.as_deref())
            .bind(changes.first_name.as_deref())
            .bind(changes.last_name.as_deref())
            .bind(changes.role.map(|r| r.as_str()))
            .bind(changes.profile_image.as_deref())
            .fetch_optional(&self.db)
            .await
            .map_err(|e| write_error(e, "update user"))?;
        row.map(User::try_from).transpose().map_err(StoreError::from)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected() > 0)
    }
}

/// Unique-index violations become `Duplicate`, everything else is a backend failure.
fn write_error(err: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(field_for_constraint) {
                return StoreError::Duplicate(field);
            }
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context(what))
}

fn field_for_constraint(name: &str) -> Option<UniqueField> {
    match name {
        "users_email_key" => Some(UniqueField::Email),
        "users_username_key" => Some(UniqueField::Username),
        _ => None,
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(field_for_constraint("users_email_key"), Some(UniqueField::Email));
        assert_eq!(field_for_constraint("users_username_key"), Some(UniqueField::Username));
        assert_eq!(field_for_constraint("users_pkey"), None);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("ann"), "ann");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
