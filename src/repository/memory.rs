use super::{ArticleRepository, RepositoryError, UserRepository};
use crate::{
    models::{Article, NewArticle, Role, RoleSet, User},
    reconcile::RoleChange,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, RoleSet>,
    unrecognised_roles: HashMap<Uuid, Vec<String>>,
    articles: HashMap<Uuid, Article>,
}

/// MemoryRepository
///
/// An in-process implementation of both store traits, used by the test
/// suites and for running handlers without a database.
///
/// Every attempted role add/remove is recorded (see `role_ops`), and a single
/// role change can be configured to fail so partial reconciliation can be
/// exercised. `offline()` makes every call fail like an unreachable database.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    role_ops: Mutex<Vec<RoleChange>>,
    failing_change: Option<RoleChange>,
    offline: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given role change fail with `RepositoryError::Unavailable`.
    pub fn failing_on(mut self, change: RoleChange) -> Self {
        self.failing_change = Some(change);
        self
    }

    /// Makes every operation fail with `RepositoryError::Unavailable`.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Inserts (or replaces) a user together with its role memberships.
    pub async fn insert_user(&self, user: User, roles: impl IntoIterator<Item = Role>) -> User {
        let mut tables = self.tables.write().await;
        tables.roles.insert(user.id, roles.into_iter().collect());
        tables.users.insert(user.id, user.clone());
        user
    }

    /// Attaches a role name outside `Role`, as a legacy row would.
    pub async fn insert_unrecognised_role(&self, user_id: Uuid, name: &str) {
        self.tables
            .write()
            .await
            .unrecognised_roles
            .entry(user_id)
            .or_default()
            .push(name.to_string());
    }

    /// Inserts (or replaces) an article exactly as given, id included.
    pub async fn insert_article(&self, article: Article) -> Article {
        let mut tables = self.tables.write().await;
        tables.articles.insert(article.id, article.clone());
        article
    }

    /// Every role add/remove attempted so far, in call order, failed ones included.
    pub async fn role_ops(&self) -> Vec<RoleChange> {
        self.role_ops.lock().await.clone()
    }

    fn ensure_online(&self) -> Result<(), RepositoryError> {
        if self.offline {
            return Err(RepositoryError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    async fn record_role_op(&self, change: RoleChange) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        self.role_ops.lock().await.push(change);
        if self.failing_change == Some(change) {
            return Err(RepositoryError::Unavailable(format!(
                "simulated failure to {}",
                change
            )));
        }
        Ok(())
    }
}

fn newest_first(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    articles
}

#[async_trait]
impl ArticleRepository for MemoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>, RepositoryError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.articles.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Article>, RepositoryError> {
        self.ensure_online()?;
        let articles = self.tables.read().await.articles.values().cloned().collect();
        Ok(newest_first(articles))
    }

    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Article>, RepositoryError> {
        self.ensure_online()?;
        let articles = self
            .tables
            .read()
            .await
            .articles
            .values()
            .filter(|a| a.owner_email == owner_email)
            .cloned()
            .collect();
        Ok(newest_first(articles))
    }

    async fn create(&self, article: NewArticle) -> Result<Article, RepositoryError> {
        self.ensure_online()?;
        let stored = Article {
            id: Uuid::new_v4(),
            title: article.title,
            body: article.body,
            created_at: article.created_at,
            start_date: article.start_date,
            end_date: article.end_date,
            owner_email: article.owner_email,
        };
        self.tables
            .write()
            .await
            .articles
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, article: &Article) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .articles
            .get_mut(&article.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.title = article.title.clone();
        stored.body = article.body.clone();
        stored.start_date = article.start_date;
        stored.end_date = article.end_date;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        self.tables
            .write()
            .await
            .articles
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.ensure_online()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.ensure_online()?;
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        tables.roles.entry(user.id).or_default();
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        Ok(())
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<RoleSet, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .await
            .roles
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_unrecognised_roles(&self, user_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .tables
            .read()
            .await
            .unrecognised_roles
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepositoryError> {
        Ok(self.get_roles(user_id).await?.contains(&role))
    }

    async fn add_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError> {
        self.record_role_op(RoleChange::Add(role)).await?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.roles.entry(user_id).or_default().insert(role);
        Ok(())
    }

    async fn remove_role(&self, user_id: Uuid, role: Role) -> Result<(), RepositoryError> {
        self.record_role_op(RoleChange::Remove(role)).await?;
        let mut tables = self.tables.write().await;
        if let Some(roles) = tables.roles.get_mut(&user_id) {
            roles.remove(&role);
        }
        Ok(())
    }
}
