//! Bearer-token authentication and role checks.
//!
//! Tokens are verified against an identity provider's userinfo endpoint;
//! the provider sits behind [`RoleProvider`] so tests can substitute a
//! static token table.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::error::ApiError;

/// Roles recognized by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Uploader,
    Normal,
}

impl Role {
    fn from_claim(claim: &str) -> Option<Self> {
        match claim {
            "admin" => Some(Role::Admin),
            "uploader" => Some(Role::Uploader),
            "normal" => Some(Role::Normal),
            _ => None,
        }
    }
}

/// Identity attached to a request after token verification.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Checks that the user holds at least one of the listed roles.
    ///
    /// # Errors
    ///
    /// - `ApiError::Forbidden` - None of the roles are held
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token rejected by identity provider")]
    InvalidToken,

    #[error("Identity provider unreachable: {reason}")]
    Unavailable { reason: String },
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        // Auth fails closed: an unreachable provider denies the request.
        ApiError::Unauthorized
    }
}

/// Verifies bearer tokens and resolves the caller's roles.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    /// Resolves a bearer token to an authenticated user.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` - The token is unknown or expired
    /// - `AuthError::Unavailable` - The identity provider cannot be reached
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Extracts the bearer token from an `Authorization` header.
///
/// # Errors
///
/// - `ApiError::Unauthorized` - Header missing or not a bearer scheme
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)
}

/// Fixed token table for tests and single-user deployments.
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that resolves to the given user and roles.
    pub fn with_token(mut self, token: &str, username: &str, roles: &[Role]) -> Self {
        self.tokens.insert(
            token.to_string(),
            AuthenticatedUser {
                username: username.to_string(),
                roles: roles.to_vec(),
            },
        );
        self
    }
}

#[async_trait]
impl RoleProvider for StaticTokenProvider {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

#[derive(Deserialize)]
struct UserinfoResponse {
    preferred_username: String,
    #[serde(default)]
    realm_access: RealmAccess,
}

#[derive(Deserialize, Default)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// Verifies tokens against an OpenID Connect userinfo endpoint.
///
/// Realm roles outside the recognized set are ignored.
pub struct RemoteRoleProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl RemoteRoleProvider {
    pub fn new(userinfo_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            userinfo_url,
        }
    }
}

#[async_trait]
impl RoleProvider for RemoteRoleProvider {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidToken);
        }

        let userinfo: UserinfoResponse =
            response.json().await.map_err(|e| AuthError::Unavailable {
                reason: e.to_string(),
            })?;

        let roles = userinfo
            .realm_access
            .roles
            .iter()
            .filter_map(|claim| Role::from_claim(claim))
            .collect();

        Ok(AuthenticatedUser {
            username: userinfo.preferred_username,
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_wrong_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert!(bearer_token(&headers).is_err());
    }

    #[tokio::test]
    async fn test_static_provider_resolves_roles() {
        let provider = StaticTokenProvider::new().with_token(
            "tok",
            "alice",
            &[Role::Admin, Role::Uploader],
        );
        let user = provider.verify("tok").await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.has_role(Role::Admin));
        assert!(!user.has_role(Role::Normal));
    }

    #[tokio::test]
    async fn test_static_provider_rejects_unknown_token() {
        let provider = StaticTokenProvider::new();
        assert!(matches!(
            provider.verify("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_require_any() {
        let user = AuthenticatedUser {
            username: "bob".to_string(),
            roles: vec![Role::Uploader],
        };
        assert!(user.require_any(&[Role::Admin, Role::Uploader]).is_ok());
        assert!(user.require_any(&[Role::Admin]).is_err());
    }

    #[test]
    fn test_unknown_claims_are_ignored() {
        assert_eq!(Role::from_claim("offline_access"), None);
        assert_eq!(Role::from_claim("admin"), Some(Role::Admin));
    }
}
