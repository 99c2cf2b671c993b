mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use blog_portal::{
    AppConfig, AppState, MemoryRepository, auth::Claims, create_router, models::Article,
    models::Role,
};
use common::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use tower::ServiceExt;
use uuid::Uuid;

// --- Test App ---

struct TestApp {
    router: Router,
    repo: Arc<MemoryRepository>,
    admin_id: Uuid,
    contributor_id: Uuid,
    other_id: Uuid,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let admin_id = repo.insert_user(user(ADMIN_EMAIL), [Role::Admin]).await.id;
    let contributor_id = repo
        .insert_user(user(CONTRIBUTOR_EMAIL), [Role::Contributor])
        .await
        .id;
    let other_id = repo
        .insert_user(user(OTHER_CONTRIBUTOR_EMAIL), [Role::Contributor])
        .await
        .id;

    let router = create_router(test_state(repo.clone()));

    TestApp {
        router,
        repo,
        admin_id,
        contributor_id,
        other_id,
    }
}

fn bearer_for(user_id: Uuid) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: user_id,
        exp: now + 3600,
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(AppConfig::default().jwt_secret.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    user_id: Option<Uuid>,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let app = spawn_app().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_public_listing_hides_scheduled_articles() {
    let app = spawn_app().await;
    let open = app.repo.insert_article(visible_article(CONTRIBUTOR_EMAIL)).await;
    let scheduled = app
        .repo
        .insert_article(scheduled_article(CONTRIBUTOR_EMAIL))
        .await;

    let (status, body) = send(&app.router, Method::GET, "/public/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Article> = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed, vec![open]);

    let uri = format!("/public/articles/{}", scheduled.id);
    let (status, _) = send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_management_requires_authentication() {
    let app = spawn_app().await;

    let (status, _) = send(&app.router, Method::GET, "/articles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, Method::GET, "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_bypass_user_is_unauthorized() {
    let app = spawn_app().await;
    let (status, _) = send(
        &app.router,
        Method::GET,
        "/articles",
        Some(Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let app = spawn_app().await;
    app.repo.insert_article(visible_article(CONTRIBUTOR_EMAIL)).await;

    let request = Request::get("/articles")
        .header(header::AUTHORIZATION, bearer_for(app.contributor_id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let listed: Vec<Article> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = spawn_app().await;

    // Create
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/articles",
        Some(app.contributor_id),
        Some(serde_json::json!({
            "title": "Launch", "body": "We launched", "start_date": "2024-01-01",
            "end_date": "2024-01-31", "owner_email": ADMIN_EMAIL
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Article = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.owner_email, CONTRIBUTOR_EMAIL);
    let uri = format!("/articles/{}", created.id);

    // Another contributor cannot tell it exists: same status and same body
    // as an id that was never stored.
    let (status, foreign_body) =
        send(&app.router, Method::GET, &uri, Some(app.other_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let missing_uri = format!("/articles/{}", Uuid::new_v4());
    let (missing_status, missing_body) =
        send(&app.router, Method::GET, &missing_uri, Some(app.other_id), None).await;
    assert_eq!(missing_status, status);
    assert_eq!(foreign_body, missing_body);

    for method in [Method::PUT, Method::DELETE] {
        let payload = (method == Method::PUT).then(|| {
            serde_json::json!({
                "title": "Hijack", "body": "Body",
                "start_date": "2024-01-01", "end_date": "2024-01-31"
            })
        });
        let (foreign_status, foreign_body) = send(
            &app.router,
            method.clone(),
            &uri,
            Some(app.other_id),
            payload.clone(),
        )
        .await;
        let (missing_status, missing_body) =
            send(&app.router, method, &missing_uri, Some(app.other_id), payload).await;
        assert_eq!(foreign_status, StatusCode::NOT_FOUND);
        assert_eq!(foreign_status, missing_status);
        assert_eq!(foreign_body, missing_body);
    }

    // Update by owner
    let (status, body) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(app.contributor_id),
        Some(serde_json::json!({
            "title": "Launch v2", "body": "We launched again",
            "start_date": "2024-01-01", "end_date": "2024-02-29"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Article = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.title, "Launch v2");
    assert_eq!(updated.created_at, created.created_at);

    // Invalid window
    let (status, body) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(app.contributor_id),
        Some(serde_json::json!({
            "title": "Launch v3", "body": "Body",
            "start_date": "2024-03-01", "end_date": "2024-02-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "VALIDATION_FAILED");

    // Delete by admin
    let (status, _) = send(&app.router, Method::DELETE, &uri, Some(app.admin_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, Method::GET, &uri, Some(app.admin_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_contributor() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        Method::GET,
        "/admin/users",
        Some(app.contributor_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_edits_user_roles() {
    let app = spawn_app().await;
    let uri = format!("/admin/users/{}", app.other_id);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &uri,
        Some(app.admin_id),
        Some(serde_json::json!({
            "first_name": "Dana", "last_name": "Doe", "selected_roles": ["Admin"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, Method::GET, &uri, Some(app.admin_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(view["first_name"], "Dana");
    assert_eq!(view["user_roles"], serde_json::json!(["Admin"]));
    assert_eq!(view["all_roles"], serde_json::json!(["Admin", "Contributor"]));
}

#[tokio::test]
async fn test_bypass_disabled_in_production() {
    let repo = Arc::new(MemoryRepository::new());
    let admin_id = repo.insert_user(user(ADMIN_EMAIL), [Role::Admin]).await.id;
    let config = AppConfig {
        env: blog_portal::config::Env::Production,
        ..AppConfig::default()
    };
    let router = create_router(AppState::with_store(repo, config));

    let (status, _) = send(&router, Method::GET, "/articles", Some(admin_id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api-docs/openapi.json",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/articles/{id}"].is_object());
}
