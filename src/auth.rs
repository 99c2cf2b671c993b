use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::{Role, RoleSet},
    repository::UserRepositoryState,
};

/// Claims
///
/// The payload expected inside a bearer JWT. Tokens are issued outside this
/// service and signed with the shared HS256 secret from `AppConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id in the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): tokens past this instant are rejected.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who is asking
/// (`email`, which is also the identity recorded as an article's owner) and
/// the roles they held when the request started.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub roles: RoleSet,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Admin dominates every other role in policy checks.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Loads the user and their roles; `None` when the user no longer exists.
async fn resolve(users: &UserRepositoryState, user_id: Uuid) -> Result<Option<AuthUser>, StatusCode> {
    let user = match users.find_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::error!("auth user lookup failed: {:?}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let roles = users.get_roles(user_id).await.map_err(|e| {
        tracing::error!("auth role lookup failed: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Some(AuthUser {
        id: user.id,
        email: user.email,
        roles,
    }))
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. The process is:
/// 1. Local Bypass: in `Env::Local`, an `x-user-id` header naming an existing user.
/// 2. Token Validation: `Authorization: Bearer <jwt>`, signature and expiry checked.
/// 3. Store Lookup: the user must still exist; roles are loaded fresh.
///
/// Rejection: `401 Unauthorized` on any authentication failure, `500` when the
/// user store itself fails.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    UserRepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let users = UserRepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 1. Local Development Bypass Check
        if config.env == Env::Local {
            let header_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = header_id {
                if let Some(user) = resolve(&users, user_id).await? {
                    return Ok(user);
                }
            }
        }
        // Otherwise fall through to the standard JWT flow.

        // 2. Token Extraction
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                _ => tracing::debug!("rejected invalid token: {}", e),
            }
            StatusCode::UNAUTHORIZED
        })?;

        // 3. Store Lookup
        // A token for a user removed after issuance is no longer accepted.
        resolve(&users, token_data.claims.sub)
            .await?
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
