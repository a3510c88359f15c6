//! Wire types for the platform's OAuth and product listing endpoints.
//!
//! ### Token response
//! `access_token` is always present on success. `refresh_token` is issued by
//! the `authorization_code` grant and may or may not be rotated by the
//! `refresh_token` grant; `client_credentials` never returns one.
//! `expires_in` is a lifetime in seconds. Some platform versions omit it and
//! only send an absolute `expires_at`; we fall back to
//! [`DEFAULT_ACCESS_TOKEN_LIFETIME_SECS`] in that case rather than parse a
//! timezone-less local timestamp.
//!
//! ### Listing response
//! `{"products": [...]}`. An empty array marks the end of the catalog.

use mallfeed_core::ProductRecord;
use serde::Deserialize;

/// Access token lifetime assumed when the token response carries no `expires_in`.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: i64 = 2 * 60 * 60;

/// Successful response from `POST /oauth/token`.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Top-level response from `GET /api/v2/products`.
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ProductRecord>,
}
