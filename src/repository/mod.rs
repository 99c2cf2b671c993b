use crate::models::{Article, NewArticle, Role, RoleSet, User};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Failures reported by a store. `NotFound` is the only expected condition;
/// every other variant is a genuine fault that callers surface without retry.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted row does not exist (or vanished since it was read).
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// ArticleRepository Trait
///
/// Persistence contract for articles. Implementations do no authorization of
/// their own; ownership and visibility are decided by the `policy` module
/// before any of these methods is called.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn ArticleRepository>`) shareable across Axum's task boundaries.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError>;
    // Newest first.
    async fn list_all(&self) -> Result<Vec<Article>, RepositoryError>;
    // Newest first.
    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Article>, RepositoryError>;
    /// Stores a new article and returns it with its assigned id.
    async fn create(&self, article: NewArticle) -> Result<Article, RepositoryError>;
    /// Writes title, body and window. `RepositoryError::NotFound` when the row is gone.
    async fn update(&self, article: &Article) -> Result<(), RepositoryError>;
    /// Physical delete. `RepositoryError::NotFound` when the row is gone.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// UserRepository Trait
///
/// Identity and role-membership contract. Role add/remove are independent
/// operations; callers that need several of them (see `reconcile`) decide how
/// to react when one fails.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    async fn create_user(&self, user: User) -> Result<User, RepositoryError>;
    /// Writes first and last name. Email is never changed.
    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError>;

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, RepositoryError>;
    /// Stored role names that do not map to a `Role`. They are never part of
    /// `get_roles` and reconciliation leaves them alone.
    async fn get_unrecognised_roles(&self, user_id: Uuid) -> Result<Vec<String>, RepositoryError>;
    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepositoryError>;
    async fn add_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError>;
    async fn remove_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError>;
}

/// Shared handle to the article store held in `AppState`.
pub type ArticleRepositoryState = Arc<dyn ArticleRepository>;

/// Shared handle to the user/role store held in `AppState`.
pub type UserRepositoryState = Arc<dyn UserRepository>;
