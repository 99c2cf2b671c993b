use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{collections::BTreeSet, fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationErrors;

// --- Roles ---

/// Role
///
/// The closed set of roles the portal understands. Stored as text in the
/// `user_roles` table using the variant name (`"Admin"`, `"Contributor"`).
///
/// Ordering follows declaration order, which is also the order in which
/// reconciliation applies changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[ts(export)]
pub enum Role {
    Admin,
    Contributor,
}

impl Role {
    /// Every role known to the portal, in display order.
    pub const ALL: [Role; 2] = [Role::Admin, Role::Contributor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Contributor => "Contributor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Contributor" => Ok(Role::Contributor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Returned when a stored role name does not map to a known `Role`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// The set of roles held by (or desired for) a single user.
pub type RoleSet = BTreeSet<Role>;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A portal identity record from the `users` table. Role memberships live in
/// `user_roles` and are loaded separately through the user repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Also the identity recorded as an article's owner.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Article
///
/// A blog article from the `articles` table.
///
/// `created_at` and `owner_email` are fixed at creation time and are never
/// touched by updates. The `[start_date, end_date]` window controls public
/// visibility (both ends inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub owner_email: String,
}

/// NewArticle
///
/// A fully owned article that has not been stored yet. Only produced by
/// `policy::assign_owner_on_create`, so the owner always comes from the
/// authenticated requester.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub owner_email: String,
}

// --- Request Payloads (Input Schemas) ---

/// ArticleForm
///
/// Input payload for creating (POST /articles) and editing (PUT /articles/{id})
/// an article. There is no owner or creation-date field; unknown JSON keys
/// such as `owner_email` are ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleForm {
    pub title: String,
    pub body: String,
    #[ts(type = "string")]
    #[schema(value_type = String, format = Date, example = "2024-01-01")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    #[schema(value_type = String, format = Date, example = "2024-01-31")]
    pub end_date: NaiveDate,
}

impl ArticleForm {
    /// Checks required text fields and the date window ordering.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.body.trim().is_empty() {
            errors.add("body", "Body is required");
        }
        if self.end_date < self.start_date {
            errors.add("end_date", "End date must not be before the start date");
        }
        errors.into_result()
    }

    /// Copies the editable fields onto a stored article. Identity, owner and
    /// creation time are left untouched.
    pub fn apply_to(self, article: &mut Article) {
        article.title = self.title;
        article.body = self.body;
        article.start_date = self.start_date;
        article.end_date = self.end_date;
    }
}

/// EditUserRequest
///
/// Admin payload for PUT /admin/users/{id}. `selected_roles` is the complete
/// desired role set; roles missing from it are revoked.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditUserRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub selected_roles: Vec<Role>,
}

impl EditUserRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.first_name.trim().is_empty() {
            errors.add("first_name", "First name is required");
        }
        if self.last_name.trim().is_empty() {
            errors.add("last_name", "Last name is required");
        }
        errors.into_result()
    }

    pub fn desired_roles(&self) -> RoleSet {
        self.selected_roles.iter().copied().collect()
    }
}

// --- User Management Schemas (Output) ---

/// UserSummary
///
/// One row of the admin user listing (GET /admin/users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
}

impl UserSummary {
    pub fn new(user: User, roles: &RoleSet) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles: roles.iter().copied().collect(),
        }
    }
}

/// EditUserView
///
/// Output schema for GET /admin/users/{id}: the user's profile, the roles they
/// currently hold and every role that may be assigned. `other_roles` lists
/// stored role names the portal does not recognise; they cannot be assigned
/// or revoked from here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditUserView {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_roles: Vec<Role>,
    pub all_roles: Vec<Role>,
    pub other_roles: Vec<String>,
}
