//! OAuth2 grant calls against the platform's token endpoint.
//!
//! Three grants share one endpoint (`POST /oauth/token`, form-encoded):
//! `client_credentials`, `refresh_token`, and `authorization_code`. This module
//! only performs the calls; deciding *which* grant to run and caching the
//! result is [`crate::token::TokenManager`]'s job.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::client::endpoint_url;
use crate::error::{body_excerpt, ClientError};
use crate::types::{TokenResponse, DEFAULT_ACCESS_TOKEN_LIFETIME_SECS};

const TOKEN_PATH: &str = "/oauth/token";
const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Application credentials registered with the platform.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Scope requested by `client_credentials` and the authorize redirect.
    pub scope: String,
    /// Must match the redirect URI registered with the platform exactly.
    pub redirect_uri: String,
}

/// A token pair freshly issued by the token endpoint.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let lifetime = response
            .expires_in
            .unwrap_or(DEFAULT_ACCESS_TOKEN_LIFETIME_SECS);
        Self {
            access_token: SecretString::from(response.access_token),
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            expires_at: expiry_after(issued_at, lifetime),
        }
    }
}

/// `issued_at + lifetime_secs`, saturating at the latest representable instant
/// when the upstream reports a lifetime chrono cannot hold.
fn expiry_after(issued_at: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(lifetime_secs)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Client for the platform's OAuth endpoints.
pub struct OAuthClient {
    client: Client,
    token_url: Url,
    authorize_url: Url,
    credentials: OAuthCredentials,
}

impl OAuthClient {
    /// Creates a client for the OAuth endpoints under `api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if `api_base_url` is not a valid
    /// absolute URL.
    pub fn new(
        client: Client,
        api_base_url: &str,
        credentials: OAuthCredentials,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            token_url: endpoint_url(api_base_url, TOKEN_PATH)?,
            authorize_url: endpoint_url(api_base_url, AUTHORIZE_PATH)?,
            credentials,
        })
    }

    /// Builds the URL the operator's browser is sent to for the one-time
    /// authorization-code consent step.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("state", state)
            .append_pair("redirect_uri", &self.credentials.redirect_uri)
            .append_pair("scope", &self.credentials.scope);
        url.to_string()
    }

    /// Runs the `client_credentials` grant.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UpstreamAuth`] on a non-2xx response.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the success body is not a token response.
    #[instrument(skip(self))]
    pub async fn client_credentials_grant(&self) -> Result<IssuedToken, ClientError> {
        self.request_token(
            "client_credentials",
            &[("scope", self.credentials.scope.as_str())],
        )
        .await
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Same as [`Self::client_credentials_grant`].
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token_grant(
        &self,
        refresh_token: &SecretString,
    ) -> Result<IssuedToken, ClientError> {
        self.request_token(
            "refresh_token",
            &[("refresh_token", refresh_token.expose_secret())],
        )
        .await
    }

    /// Exchanges a one-time authorization code for the first token pair.
    ///
    /// # Errors
    ///
    /// Same as [`Self::client_credentials_grant`].
    #[instrument(skip(self, code))]
    pub async fn authorization_code_grant(&self, code: &str) -> Result<IssuedToken, ClientError> {
        self.request_token(
            "authorization_code",
            &[
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ],
        )
        .await
    }

    async fn request_token(
        &self,
        grant: &'static str,
        params: &[(&str, &str)],
    ) -> Result<IssuedToken, ClientError> {
        let issued_at = Utc::now();

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", grant),
            ("client_id", self.credentials.client_id.as_str()),
            (
                "client_secret",
                self.credentials.client_secret.expose_secret(),
            ),
        ];
        form.extend_from_slice(params);

        let response = self
            .client
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(grant, status = status.as_u16(), "token endpoint rejected grant");
            return Err(ClientError::UpstreamAuth {
                grant,
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        let body = response.text().await?;
        let parsed =
            serde_json::from_str::<TokenResponse>(&body).map_err(|e| ClientError::Deserialize {
                context: format!("{grant} token response"),
                source: e,
            })?;

        tracing::info!(
            grant,
            expires_in = ?parsed.expires_in,
            refresh_token_issued = parsed.refresh_token.is_some(),
            "token endpoint issued access token"
        );
        Ok(IssuedToken::from_response(parsed, issued_at))
    }
}
