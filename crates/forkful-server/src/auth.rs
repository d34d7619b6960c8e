//! Caller identity.
//!
//! Sessions live in the hosted identity provider. Each request's bearer
//! token is resolved into an [`AuthContext`] that handlers receive as a
//! plain value; nothing downstream reads ambient login state.

use axum::http::HeaderMap;
use chrono::Utc;
use forkful_shared::{Restaurant, User, UserId};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use crate::api::AppState;
use crate::error::ServerError;

/// The resolved identity of the caller for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl AuthContext {
    /// Fail with 403 unless the caller owns `restaurant`.
    pub fn require_owner(&self, restaurant: &Restaurant) -> Result<(), ServerError> {
        if restaurant.is_owned_by(&self.user_id) {
            Ok(())
        } else {
            Err(ServerError::Forbidden(
                "Only the owner can modify this restaurant".into(),
            ))
        }
    }

    fn to_user(&self) -> User {
        User {
            id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Resolves access tokens into identities.
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is unknown or expired.
    fn resolve<'a>(
        &'a self,
        token: &'a str,
    ) -> BoxFuture<'a, Result<Option<AuthContext>, ServerError>>;
}

/// Identity provider reached over HTTP (`GET {base}/auth/v1/user`).
pub struct HostedIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct HostedUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: HostedMetadata,
}

#[derive(Deserialize, Default)]
struct HostedMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

impl HostedIdentity {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl IdentityProvider for HostedIdentity {
    fn resolve<'a>(
        &'a self,
        token: &'a str,
    ) -> BoxFuture<'a, Result<Option<AuthContext>, ServerError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(format!("{}/auth/v1/user", self.base_url))
                .bearer_auth(token)
                .header("apikey", &self.api_key)
                .send()
                .await
                .map_err(|e| ServerError::Upstream(format!("identity provider: {e}")))?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(ServerError::Upstream(format!(
                    "identity provider returned {status}"
                )));
            }

            let user: HostedUser = response
                .json()
                .await
                .map_err(|e| ServerError::Upstream(format!("identity provider: {e}")))?;

            Ok(Some(AuthContext {
                user_id: UserId(user.id),
                display_name: user.user_metadata.full_name.or(user.user_metadata.name),
                email: user.email,
            }))
        })
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller and mirror their profile into the store.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, ServerError> {
    let token = bearer_token(headers).ok_or(ServerError::Unauthorized)?;
    let ctx = state
        .identity
        .resolve(token)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    state.db.lock().await.upsert_user(&ctx.to_user())?;
    debug!(user = %ctx.user_id, "Authenticated request");

    Ok(ctx)
}
