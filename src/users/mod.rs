pub mod dto;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod service;
pub mod validate;

pub use dto::{Pagination, PublicUser};
pub use repo::{PgUserStore, StoreError, UserStore};
pub use repo_types::{Role, UniqueField, User};
