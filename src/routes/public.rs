use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints.
///
/// Every article returned here has passed `policy::can_view_public` for the
/// current request's clock reading; an article outside its window is reported
/// as not found.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /public/articles
        // The home listing: visible articles, newest first.
        .route("/public/articles", get(handlers::list_public_articles))
        // GET /public/articles/{id}
        // A single visible article.
        .route("/public/articles/{id}", get(handlers::get_public_article))
}
