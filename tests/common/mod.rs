#![allow(dead_code)]

use blog_portal::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    models::{Article, Role, User},
    repository::MemoryRepository,
};
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "a@a.a";
pub const CONTRIBUTOR_EMAIL: &str = "c@c.c";
pub const OTHER_CONTRIBUTOR_EMAIL: &str = "d@d.d";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Noon UTC on the given day.
pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

pub fn requester(email: &str, roles: &[Role]) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: email.to_string(),
        roles: roles.iter().copied().collect(),
    }
}

pub fn admin() -> AuthUser {
    requester(ADMIN_EMAIL, &[Role::Admin])
}

pub fn contributor() -> AuthUser {
    requester(CONTRIBUTOR_EMAIL, &[Role::Contributor])
}

pub fn other_contributor() -> AuthUser {
    requester(OTHER_CONTRIBUTOR_EMAIL, &[Role::Contributor])
}

pub fn article(owner: &str, start_date: NaiveDate, end_date: NaiveDate) -> Article {
    Article {
        id: Uuid::new_v4(),
        title: "Title".to_string(),
        body: "Body".to_string(),
        created_at: at(2024, 1, 1),
        start_date,
        end_date,
        owner_email: owner.to_string(),
    }
}

/// An article whose window is open today.
pub fn visible_article(owner: &str) -> Article {
    let today = Utc::now().date_naive();
    article(owner, today - TimeDelta::days(1), today + TimeDelta::days(1))
}

/// An article whose window opens in the future.
pub fn scheduled_article(owner: &str) -> Article {
    let today = Utc::now().date_naive();
    article(owner, today + TimeDelta::days(2), today + TimeDelta::days(9))
}

pub fn test_state(repo: Arc<MemoryRepository>) -> AppState {
    AppState::with_store(repo, AppConfig::default())
}
