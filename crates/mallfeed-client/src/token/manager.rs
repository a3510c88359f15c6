use std::sync::Arc;

use chrono::{Duration, Utc};
use mallfeed_core::{GrantMode, MAX_TOKEN_REFRESH_MARGIN_SECS};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::ClientError;
use crate::oauth::{IssuedToken, OAuthClient};

use super::{AccessToken, TokenState, TokenStore};

/// Default safety margin: a token expiring within this window is renewed.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Decides when to reuse, renew, or give up on the access token.
///
/// Renewal is single-flight: concurrent callers that all find the token
/// expired queue on one guard, and only the first of them talks to the token
/// endpoint. The rest re-read the store and reuse its result. In
/// authorization-code mode this keeps overlapping refreshes from invalidating
/// each other's rotated refresh token.
pub struct TokenManager {
    oauth: OAuthClient,
    store: Arc<dyn TokenStore>,
    mode: GrantMode,
    refresh_margin: Duration,
    renewal: Mutex<()>,
}

impl TokenManager {
    #[must_use]
    pub fn new(oauth: OAuthClient, store: Arc<dyn TokenStore>, mode: GrantMode) -> Self {
        Self {
            oauth,
            store,
            mode,
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            renewal: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// [`Self::with_refresh_margin`] in whole seconds, clamped to
    /// `0..=MAX_TOKEN_REFRESH_MARGIN_SECS`.
    #[must_use]
    pub fn with_refresh_margin_secs(self, secs: i64) -> Self {
        let secs = secs.clamp(0, MAX_TOKEN_REFRESH_MARGIN_SECS);
        self.with_refresh_margin(Duration::seconds(secs))
    }

    #[must_use]
    pub fn mode(&self) -> GrantMode {
        self.mode
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// See [`OAuthClient::authorization_url`].
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        self.oauth.authorization_url(state)
    }

    /// Whether a request arriving now would be served from the cache.
    #[must_use]
    pub fn has_fresh_token(&self) -> bool {
        self.cached_token().is_some()
    }

    /// Returns a usable access token, renewing it if needed.
    ///
    /// # Errors
    ///
    /// - [`ClientError::AuthRequired`]: authorization-code mode with no
    ///   refresh token held; the operator must visit `/auth`.
    /// - [`ClientError::UpstreamAuth`]: the grant was rejected. The access
    ///   token (and for refresh grants the refresh token) has been cleared.
    /// - [`ClientError::Http`] / [`ClientError::Deserialize`]: transport or
    ///   body failures; the store is left as it was.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn acquire_token(&self) -> Result<SecretString, ClientError> {
        if let Some(token) = self.cached_token() {
            tracing::debug!("using cached access token");
            return Ok(token);
        }

        let _renewal = self.renewal.lock().await;

        // Another request may have renewed while we waited for the guard.
        if let Some(token) = self.cached_token() {
            tracing::debug!("access token renewed by a concurrent request");
            return Ok(token);
        }

        match self.mode {
            GrantMode::ClientCredentials => self.renew_with_client_credentials().await,
            GrantMode::AuthorizationCode => self.renew_with_refresh_token().await,
        }
    }

    /// Exchanges an authorization code from the redirect callback and stores
    /// the resulting token pair.
    ///
    /// A failed exchange leaves the existing state untouched.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`OAuthClient::authorization_code_grant`].
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<(), ClientError> {
        let _renewal = self.renewal.lock().await;

        let issued = self.oauth.authorization_code_grant(code).await?;
        if issued.refresh_token.is_none() {
            tracing::warn!("authorization code exchange returned no refresh token");
        }

        let IssuedToken {
            access_token,
            refresh_token,
            expires_at,
        } = issued;
        self.store.set(TokenState {
            access: Some(AccessToken {
                token: access_token,
                expires_at,
            }),
            refresh_token,
        });
        tracing::info!(%expires_at, "stored tokens from authorization code exchange");
        Ok(())
    }

    fn cached_token(&self) -> Option<SecretString> {
        self.store
            .get()
            .fresh_access_token(Utc::now(), self.refresh_margin)
            .cloned()
    }

    async fn renew_with_client_credentials(&self) -> Result<SecretString, ClientError> {
        match self.oauth.client_credentials_grant().await {
            Ok(issued) => {
                let token = issued.access_token.clone();
                self.store.set(TokenState {
                    access: Some(AccessToken {
                        token: issued.access_token,
                        expires_at: issued.expires_at,
                    }),
                    refresh_token: None,
                });
                Ok(token)
            }
            Err(err) => {
                if matches!(err, ClientError::UpstreamAuth { .. }) {
                    self.store.clear(false);
                }
                Err(err)
            }
        }
    }

    async fn renew_with_refresh_token(&self) -> Result<SecretString, ClientError> {
        let Some(current_refresh) = self.store.get().refresh_token else {
            tracing::warn!("no refresh token held; operator authorization required");
            return Err(ClientError::AuthRequired);
        };

        match self.oauth.refresh_token_grant(&current_refresh).await {
            Ok(issued) => {
                let rotated = issued.refresh_token.is_some();
                let token = issued.access_token.clone();
                self.store.set(TokenState {
                    access: Some(AccessToken {
                        token: issued.access_token,
                        expires_at: issued.expires_at,
                    }),
                    refresh_token: Some(issued.refresh_token.unwrap_or(current_refresh)),
                });
                tracing::info!(rotated, "refreshed access token");
                Ok(token)
            }
            Err(err) => {
                // The refresh token itself may be expired or revoked.
                if matches!(err, ClientError::UpstreamAuth { .. }) {
                    self.store.clear(true);
                }
                Err(err)
            }
        }
    }
}
