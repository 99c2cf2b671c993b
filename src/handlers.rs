use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorResponse},
    models::{Article, ArticleForm, EditUserRequest, EditUserView, Role, UserSummary},
    policy, reconcile,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

// --- Public Handlers ---

/// list_public_articles
///
/// [Public Route] Lists the articles whose visibility window contains the
/// current instant, newest first.
#[utoipa::path(
    get,
    path = "/public/articles",
    responses((status = 200, description = "Currently visible articles", body = [Article]))
)]
pub async fn list_public_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, AppError> {
    let now = Utc::now();
    let articles = state.articles.list_all().await?;
    Ok(Json(policy::visible_at(articles, now)))
}

/// get_public_article
///
/// [Public Route] A single article, only while its window is open. Outside the
/// window the answer is the same 404 as for an unknown id.
#[utoipa::path(
    get,
    path = "/public/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_public_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Article>, AppError> {
    let now = Utc::now();
    match state.articles.find_by_id(id).await? {
        Some(article) if policy::can_view_public(&article, now) => Ok(Json(article)),
        _ => Err(AppError::NotFound),
    }
}

// --- Article Management Handlers ---

/// list_articles
///
/// [Authenticated Route] Admins get every article, Contributors only their
/// own. No date-window filtering.
#[utoipa::path(
    get,
    path = "/articles",
    responses(
        (status = 200, description = "Manageable articles", body = [Article]),
        (status = 403, description = "Not an Admin or Contributor", body = ErrorResponse)
    )
)]
pub async fn list_articles(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, AppError> {
    policy::ensure_author(&user)?;
    let articles = policy::list_for_requester(state.articles.as_ref(), &user).await?;
    Ok(Json(articles))
}

/// get_article
///
/// [Authenticated Route] Details of one article for its owner or an Admin.
///
/// *Concealment*: an article owned by someone else answers 404, exactly like
/// a missing one.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Article>, AppError> {
    policy::ensure_author(&user)?;
    let found = state.articles.find_by_id(id).await?;
    let article = policy::authorize_manage(&user, found).map_err(AppError::concealed)?;
    Ok(Json(article))
}

/// create_article
///
/// [Authenticated Route] Creates an article owned by the requester. The owner
/// and creation time come from the session and the clock, never the payload.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = ArticleForm,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ArticleForm>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    policy::ensure_author(&user)?;
    payload.validate()?;

    let now = Utc::now();
    let new_article = policy::assign_owner_on_create(&user, payload, now);
    let article = state.articles.create(new_article).await?;
    tracing::info!(article_id = %article.id, owner = %article.owner_email, "article created");

    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Authenticated Route] Edits title, body and window. Owner and creation
/// time are carried over from the stored article.
///
/// If the article disappears between the read and the write, the answer is
/// 404; the update is not retried.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = ArticleForm,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticleForm>,
) -> Result<Json<Article>, AppError> {
    policy::ensure_author(&user)?;
    let found = state.articles.find_by_id(id).await?;
    let mut article = policy::authorize_manage(&user, found).map_err(AppError::concealed)?;
    payload.validate()?;

    payload.apply_to(&mut article);
    state.articles.update(&article).await?;
    tracing::info!(article_id = %article.id, editor = %user.email, "article updated");

    Ok(Json(article))
}

/// delete_article
///
/// [Authenticated Route] Physically deletes an article (owner or Admin).
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    policy::ensure_author(&user)?;
    let found = state.articles.find_by_id(id).await?;
    let article = policy::authorize_manage(&user, found).map_err(AppError::concealed)?;

    state.articles.delete(article.id).await?;
    tracing::info!(article_id = %article.id, deleted_by = %user.email, "article deleted");

    Ok(StatusCode::NO_CONTENT)
}

// --- User Management Handlers ---

/// list_users
///
/// [Admin Route] Every user with their current roles.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Users", body = [UserSummary]),
        (status = 403, description = "Not an Admin", body = ErrorResponse)
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    policy::ensure_admin(&user)?;

    let mut summaries = Vec::new();
    for listed in state.users.list_users().await? {
        let roles = state.users.get_roles(listed.id).await?;
        summaries.push(UserSummary::new(listed, &roles));
    }
    Ok(Json(summaries))
}

/// get_user_for_edit
///
/// [Admin Route] A user's profile, held roles and all assignable roles.
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Edit view", body = EditUserView),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_user_for_edit(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditUserView>, AppError> {
    policy::ensure_admin(&user)?;

    let target = state.users.find_user(id).await?.ok_or(AppError::NotFound)?;
    let roles = state.users.get_roles(id).await?;
    let other_roles = state.users.get_unrecognised_roles(id).await?;

    Ok(Json(EditUserView {
        id: target.id,
        email: target.email,
        first_name: target.first_name,
        last_name: target.last_name,
        user_roles: roles.into_iter().collect(),
        all_roles: Role::ALL.to_vec(),
        other_roles,
    }))
}

/// update_user
///
/// [Admin Route] Updates first/last name, then reconciles the user's roles to
/// `selected_roles`.
///
/// A failing role change halts reconciliation and answers `PARTIAL_FAILURE`
/// listing what was applied and what failed; applied changes stay in place.
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserSummary),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Roles partially reconciled", body = ErrorResponse)
    )
)]
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditUserRequest>,
) -> Result<Json<UserSummary>, AppError> {
    policy::ensure_admin(&user)?;
    payload.validate()?;

    let mut target = state.users.find_user(id).await?.ok_or(AppError::NotFound)?;
    target.first_name = payload.first_name.clone();
    target.last_name = payload.last_name.clone();
    state.users.update_profile(&target).await?;

    let current = state.users.get_roles(id).await?;
    let desired = payload.desired_roles();
    let applied = reconcile::reconcile(state.users.as_ref(), id, &current, &desired).await?;
    tracing::info!(
        user_id = %id,
        admin = %user.email,
        changes = applied.len(),
        "user updated"
    );

    let leftover = state.users.get_unrecognised_roles(id).await?;
    if !leftover.is_empty() {
        tracing::warn!(
            user_id = %id,
            ?leftover,
            "user still holds unrecognised roles after update"
        );
    }

    Ok(Json(UserSummary::new(target, &desired)))
}

/// list_roles
///
/// [Admin Route] Every role that can be assigned.
#[utoipa::path(
    get,
    path = "/admin/roles",
    responses((status = 200, description = "Roles", body = [Role]))
)]
pub async fn list_roles(user: AuthUser) -> Result<Json<Vec<Role>>, AppError> {
    policy::ensure_admin(&user)?;
    Ok(Json(Role::ALL.to_vec()))
}
