use super::{ArticleRepository, RepositoryError, UserRepository};
use crate::models::{Article, NewArticle, Role, RoleSet, User};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const ARTICLE_COLUMNS: &str = "id, title, body, created_at, start_date, end_date, owner_email";

/// PostgresRepository
///
/// The concrete implementation of both store traits, backed by PostgreSQL.
/// Every mutation runs inside its own transaction, which rolls back when it
/// is dropped without a commit (e.g. on an early `?` return).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn role_names(&self, user_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }
}

/// Splits stored role names into known roles and the names this build does
/// not recognise.
fn split_roles(names: Vec<String>) -> (RoleSet, Vec<String>) {
    let mut known = RoleSet::new();
    let mut unknown = Vec::new();
    for name in names {
        match name.parse::<Role>() {
            Ok(role) => {
                known.insert(role);
            }
            Err(_) => unknown.push(name),
        }
    }
    (known, unknown)
}

#[async_trait]
impl ArticleRepository for PostgresRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let article = sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn list_all(&self) -> Result<Vec<Article>, RepositoryError> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC");
        let articles = sqlx::query_as::<_, Article>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Article>, RepositoryError> {
        let query = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE owner_email = $1 ORDER BY created_at DESC"
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(owner_email)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// create
    ///
    /// Inserts the article with a freshly generated UUID and returns the
    /// stored row.
    async fn create(&self, article: NewArticle) -> Result<Article, RepositoryError> {
        let query = format!(
            "INSERT INTO articles (id, title, body, created_at, start_date, end_date, owner_email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ARTICLE_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Article>(&query)
            .bind(Uuid::new_v4())
            .bind(&article.title)
            .bind(&article.body)
            .bind(article.created_at)
            .bind(article.start_date)
            .bind(article.end_date)
            .bind(&article.owner_email)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    /// update
    ///
    /// Only the editable columns are written; `owner_email` and `created_at`
    /// are not part of the statement.
    async fn update(&self, article: &Article) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE articles SET title = $2, body = $3, start_date = $4, end_date = $5 WHERE id = $1",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.start_date)
        .bind(article.end_date)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, first_name, last_name) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, first_name, last_name",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE users SET first_name = $2, last_name = $3 WHERE id = $1")
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, RepositoryError> {
        let (known, unknown) = split_roles(self.role_names(user_id).await?);
        if !unknown.is_empty() {
            tracing::warn!(%user_id, ?unknown, "ignoring unrecognised stored roles");
        }
        Ok(known)
    }

    async fn get_unrecognised_roles(&self, user_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let (_, unknown) = split_roles(self.role_names(user_id).await?);
        Ok(unknown)
    }

    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepositoryError> {
        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(held)
    }

    /// add_role
    ///
    /// Idempotent: granting a role the user already holds is a no-op.
    async fn add_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// remove_role
    ///
    /// Idempotent: revoking a role the user does not hold is a no-op.
    async fn remove_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
