mod common;

use blog_portal::{
    MemoryRepository,
    models::Role,
    repository::{ArticleRepository, UserRepository},
    seed,
};
use common::*;

#[tokio::test]
async fn test_seed_creates_users_roles_and_sample_article() {
    let repo = MemoryRepository::new();
    let now = at(2024, 1, 15);

    seed::initialize(&repo, &repo, now).await.unwrap();

    let admin = repo
        .find_user_by_email(seed::ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    let contributor = repo
        .find_user_by_email(seed::CONTRIBUTOR_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(repo.has_role(admin.id, Role::Admin).await.unwrap());
    assert!(!repo.has_role(admin.id, Role::Contributor).await.unwrap());
    assert!(repo.has_role(contributor.id, Role::Contributor).await.unwrap());

    let articles = repo.list_all().await.unwrap();
    assert_eq!(articles.len(), 1);
    let sample = &articles[0];
    assert_eq!(sample.owner_email, seed::CONTRIBUTOR_EMAIL);
    assert_eq!(sample.start_date, date(2024, 1, 15));
    assert_eq!(sample.end_date, date(2024, 2, 15));
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let repo = MemoryRepository::new();

    seed::initialize(&repo, &repo, at(2024, 1, 15)).await.unwrap();
    seed::initialize(&repo, &repo, at(2024, 3, 1)).await.unwrap();

    assert_eq!(repo.list_users().await.unwrap().len(), 2);
    assert_eq!(repo.list_all().await.unwrap().len(), 1);
    // One role grant per seeded user, none on the second run.
    assert_eq!(repo.role_ops().await.len(), 2);
}

#[tokio::test]
async fn test_seed_restores_missing_role_on_existing_user() {
    let repo = MemoryRepository::new();
    let existing = repo.insert_user(user(ADMIN_EMAIL), []).await;

    seed::initialize(&repo, &repo, at(2024, 1, 15)).await.unwrap();

    assert!(repo.has_role(existing.id, Role::Admin).await.unwrap());
    assert_eq!(repo.list_users().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_seed_skips_sample_when_articles_exist() {
    let repo = MemoryRepository::new();
    let own = repo.insert_article(visible_article(OTHER_CONTRIBUTOR_EMAIL)).await;

    seed::initialize(&repo, &repo, at(2024, 1, 15)).await.unwrap();

    let articles = repo.list_all().await.unwrap();
    assert_eq!(articles, vec![own]);
}

#[tokio::test]
async fn test_seed_reports_store_failure() {
    let repo = MemoryRepository::new().offline();
    assert!(seed::initialize(&repo, &repo, at(2024, 1, 15)).await.is_err());
}
