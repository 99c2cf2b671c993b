use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// User management: profile edits and role reconciliation.
///
/// Access Control:
/// Each handler resolves `AuthUser` (401 when unauthenticated) and then
/// requires the Admin role (403 otherwise).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Every user with their roles.
        .route("/users", get(handlers::list_users))
        // GET/PUT /admin/users/{id}
        // Edit view; update names and reconcile roles to the submitted set.
        .route(
            "/users/{id}",
            get(handlers::get_user_for_edit).put(handlers::update_user),
        )
        // GET /admin/roles
        .route("/roles", get(handlers::list_roles))
}
