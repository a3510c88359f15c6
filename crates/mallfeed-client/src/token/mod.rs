//! Credential store and token lifecycle.
//!
//! [`TokenStore`] is the seam: the server shares one store across requests,
//! tests substitute their own and assert on what was written. Nothing here is
//! persisted; a restart starts from an empty store (optionally seeded with a
//! bootstrap refresh token).

mod manager;

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

pub use manager::TokenManager;

/// A cached access token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns `true` if the token remains valid for longer than `margin`
    /// after `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(margin)
            .is_some_and(|deadline| now < deadline)
    }
}

/// Everything the token manager knows about the current credentials.
#[derive(Debug, Clone, Default)]
pub struct TokenState {
    pub access: Option<AccessToken>,
    pub refresh_token: Option<SecretString>,
}

impl TokenState {
    /// State holding only a refresh token, as after a restart with a
    /// bootstrap refresh token configured.
    #[must_use]
    pub fn with_refresh_token(refresh_token: SecretString) -> Self {
        Self {
            access: None,
            refresh_token: Some(refresh_token),
        }
    }

    /// The cached access token if it is still fresh at `now`.
    #[must_use]
    pub fn fresh_access_token(
        &self,
        now: DateTime<Utc>,
        margin: Duration,
    ) -> Option<&SecretString> {
        self.access
            .as_ref()
            .filter(|access| access.is_fresh_at(now, margin))
            .map(|access| &access.token)
    }
}

/// Storage for the process-wide [`TokenState`].
pub trait TokenStore: Send + Sync {
    /// Returns a snapshot of the current state.
    fn get(&self) -> TokenState;

    /// Replaces the state wholesale.
    fn set(&self, state: TokenState);

    /// Drops the access token, and the refresh token too when
    /// `include_refresh_token` is set.
    fn clear(&self, include_refresh_token: bool);
}

/// In-process [`TokenStore`]; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: RwLock<TokenState>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(state: TokenState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> TokenState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, state: TokenState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn clear(&self, include_refresh_token: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.access = None;
        if include_refresh_token {
            state.refresh_token = None;
        }
    }
}
