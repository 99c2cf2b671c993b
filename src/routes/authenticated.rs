use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Article management for Admins and Contributors.
///
/// Access Control Strategy:
/// The `auth_middleware` layer above this router rejects unauthenticated
/// requests with 401. Handlers then require the Admin or Contributor role and
/// apply the ownership rules from `policy` per article.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /articles  -> Admin: all articles; Contributor: own articles.
        // POST /articles -> create, owned by the requester.
        .route(
            "/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        // GET/PUT/DELETE /articles/{id}
        // Owner or Admin only; anyone else gets the same 404 as a missing id.
        .route(
            "/articles/{id}",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
}
