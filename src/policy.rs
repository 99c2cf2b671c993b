//! Visibility and ownership rules for articles.
//!
//! Everything here is a pure function of the requester, the article and an
//! explicit `now`, except `list_for_requester`, which only chooses which store
//! query to run. Handlers capture `now` once per request and pass it in.

use chrono::{DateTime, NaiveTime, Utc};

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Article, ArticleForm, NewArticle, Role},
    repository::{ArticleRepository, RepositoryError},
};

/// can_view_public
///
/// True iff `window_start <= now <= window_end`, where each bound is the
/// article's date at 00:00 UTC. An article therefore stops being public at
/// the first instant after midnight on its `end_date`.
pub fn can_view_public(article: &Article, now: DateTime<Utc>) -> bool {
    window_start(article) <= now && now <= window_end(article)
}

/// The instant an article becomes public.
pub fn window_start(article: &Article) -> DateTime<Utc> {
    article.start_date.and_time(NaiveTime::MIN).and_utc()
}

/// The last instant an article is public.
pub fn window_end(article: &Article) -> DateTime<Utc> {
    article.end_date.and_time(NaiveTime::MIN).and_utc()
}

/// Keeps only the articles visible to anonymous readers at `now`, preserving order.
pub fn visible_at(articles: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|article| can_view_public(article, now))
        .collect()
}

/// Which articles an authenticated listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(String),
}

/// Admins see everything; everyone else sees only what they own.
pub fn list_scope(requester: &AuthUser) -> ListScope {
    if requester.is_admin() {
        ListScope::All
    } else {
        ListScope::OwnedBy(requester.email.clone())
    }
}

/// list_for_requester
///
/// The management listing. No date-window filtering applies here, unlike the
/// public listing.
pub async fn list_for_requester(
    store: &dyn ArticleRepository,
    requester: &AuthUser,
) -> Result<Vec<Article>, RepositoryError> {
    match list_scope(requester) {
        ListScope::All => store.list_all().await,
        ListScope::OwnedBy(email) => store.list_by_owner(&email).await,
    }
}

/// can_manage
///
/// View-for-edit, edit and delete are allowed for Admins and for the owner.
pub fn can_manage(requester: &AuthUser, article: &Article) -> bool {
    requester.is_admin() || requester.email == article.owner_email
}

/// authorize_manage
///
/// Resolves the outcome of a management operation on a looked-up article:
/// a missing article is `NotFound` before any ownership check, an article the
/// requester may not manage is `Forbidden`.
pub fn authorize_manage(requester: &AuthUser, article: Option<Article>) -> Result<Article, AppError> {
    let article = article.ok_or(AppError::NotFound)?;
    if !can_manage(requester, &article) {
        tracing::info!(
            requester = %requester.email,
            article_id = %article.id,
            "article management denied"
        );
        return Err(AppError::Forbidden);
    }
    Ok(article)
}

/// assign_owner_on_create
///
/// Builds the article to store from a validated form. The owner is always the
/// requester and the creation time is always `now`.
pub fn assign_owner_on_create(requester: &AuthUser, form: ArticleForm, now: DateTime<Utc>) -> NewArticle {
    NewArticle {
        title: form.title,
        body: form.body,
        created_at: now,
        start_date: form.start_date,
        end_date: form.end_date,
        owner_email: requester.email.clone(),
    }
}

/// The article management surface is open to Admins and Contributors.
pub fn ensure_author(requester: &AuthUser) -> Result<(), AppError> {
    if requester.is_admin() || requester.has_role(Role::Contributor) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// The user management surface is open to Admins only.
pub fn ensure_admin(requester: &AuthUser) -> Result<(), AppError> {
    if requester.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
