//! Auth configuration types

use crate::config::TapConfig;
use chrono::{DateTime, Utc};

/// Password-grant exchange parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordGrant {
    /// Token endpoint URL
    pub token_url: String,
    /// Username sent to the token endpoint
    pub client_id: String,
    /// One-time code sent as the password
    pub code: String,
}

/// Credentials available to a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Token used as-is until the API rejects it
    pub personal_access_token: Option<String>,
    /// Exchange used when no token is cached
    pub password_grant: Option<PasswordGrant>,
}

impl Credentials {
    /// Credentials holding only a personal access token
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            personal_access_token: Some(token.into()),
            password_grant: None,
        }
    }

    /// Credentials holding only a password grant
    pub fn password_grant(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            personal_access_token: None,
            password_grant: Some(PasswordGrant {
                token_url: token_url.into(),
                client_id: client_id.into(),
                code: code.into(),
            }),
        }
    }

    /// Collect whatever credentials the config carries
    pub fn from_config(config: &TapConfig) -> Self {
        let personal_access_token = config
            .personal_access_token
            .clone()
            .filter(|t| !t.is_empty());

        let password_grant = match (&config.client_id, &config.code) {
            (Some(client_id), Some(code)) if !client_id.is_empty() && !code.is_empty() => {
                Some(PasswordGrant {
                    token_url: config.auth_url.clone(),
                    client_id: client_id.clone(),
                    code: code.clone(),
                })
            }
            _ => None,
        };

        Self {
            personal_access_token,
            password_grant,
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
