//! Authenticator implementation
//!
//! Handles applying the bearer token to requests and managing token refresh.

use super::types::{CachedToken, Credentials, PasswordGrant};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Credentials supplied by the run config
    credentials: Credentials,
    /// Token cached for the rest of the run
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(credentials: Credentials, http_client: Client) -> Self {
        let initial = credentials
            .personal_access_token
            .clone()
            .map(|token| CachedToken::new(token, None));

        Self {
            credentials,
            cached_token: Arc::new(RwLock::new(initial)),
            http_client,
        }
    }

    /// Apply the bearer token to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(req.bearer_auth(token))
    }

    /// Get a valid token, exchanging credentials if none is cached
    pub async fn access_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let grant = self.credentials.password_grant.as_ref().ok_or_else(|| {
            Error::auth("No cached access token and no clientId/code configured for exchange")
        })?;

        let new_token = self.fetch_password_grant(grant).await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Exchange clientId and code for an access token
    async fn fetch_password_grant(&self, grant: &PasswordGrant) -> Result<CachedToken> {
        info!("Requesting access token from {}", grant.token_url);

        let form = [
            ("client_id", "pat"),
            ("grant_type", "password"),
            ("username", grant.client_id.as_str()),
            ("password", grant.code.as_str()),
        ];

        let response = self
            .http_client
            .post(&grant.token_url)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        debug!("[{}] POST {}", status.as_u16(), grant.token_url);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRequest {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }

    /// Discard the cached token so the next request re-authenticates
    pub async fn invalidate(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Whether a token is currently cached
    pub async fn has_cached_token(&self) -> bool {
        self.cached_token.read().await.is_some()
    }

    /// Get the configured credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field(
                "has_personal_access_token",
                &self.credentials.personal_access_token.is_some(),
            )
            .field(
                "has_password_grant",
                &self.credentials.password_grant.is_some(),
            )
            .finish_non_exhaustive()
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
