//! Demo data for local environments.
//!
//! `initialize` is idempotent: users are matched by email, roles are only
//! granted when missing, and the sample article is only written into an empty
//! article table.

use chrono::{DateTime, Months, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    models::{NewArticle, Role, User},
    repository::{ArticleRepository, RepositoryError, UserRepository},
};

pub const ADMIN_EMAIL: &str = "a@a.a";
pub const CONTRIBUTOR_EMAIL: &str = "c@c.c";

const SAMPLE_TITLE: &str = "New fires erupt in southern California";
const SAMPLE_BODY: &str = "Five new fires have erupted in southern California. The blazes - named \
Laguna, Sepulveda, Gibbel, Gilman and Border 2 - flared up on Thursday in the counties of Los \
Angeles, Riverside and San Diego, according to the California Department of Forestry and Fire \
Protection. Some evacuation orders have been issued. Officials said that hot and dry conditions \
across the state are increasing the risk of wildfires. The largest of the five blazes is the \
Border 2 Fire, which has burned more than 1,200 acres since it started on Thursday morning close \
to the US-Mexico border in San Diego County.";

/// Returns the user with `email`, creating it first if needed, and makes sure
/// it holds `role`.
async fn ensure_user(
    users: &dyn UserRepository,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Result<User, RepositoryError> {
    let user = match users.find_user_by_email(email).await? {
        Some(existing) => existing,
        None => {
            let created = users
                .create_user(User {
                    id: Uuid::new_v4(),
                    email: email.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                })
                .await?;
            tracing::info!(user_id = %created.id, %email, "seeded user");
            created
        }
    };

    if !users.has_role(user.id, role).await? {
        users.add_role(user.id, role).await?;
    }
    Ok(user)
}

/// initialize
///
/// Ensures the Admin (`a@a.a`) and Contributor (`c@c.c`) accounts exist with
/// their roles and, when there are no articles yet, adds one sample article
/// owned by the contributor and visible for a month from `now`.
pub async fn initialize(
    users: &dyn UserRepository,
    articles: &dyn ArticleRepository,
    now: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    ensure_user(users, ADMIN_EMAIL, "Admin", "User", Role::Admin).await?;
    let contributor =
        ensure_user(users, CONTRIBUTOR_EMAIL, "Contributor", "User", Role::Contributor).await?;

    if articles.list_all().await?.is_empty() {
        let start_date = now.date_naive();
        let end_date = start_date
            .checked_add_months(Months::new(1))
            .unwrap_or(start_date + TimeDelta::days(30));

        let article = articles
            .create(NewArticle {
                title: SAMPLE_TITLE.to_string(),
                body: SAMPLE_BODY.to_string(),
                created_at: now,
                start_date,
                end_date,
                owner_email: contributor.email,
            })
            .await?;
        tracing::info!(article_id = %article.id, "seeded sample article");
    }

    Ok(())
}
