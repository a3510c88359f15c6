//! Operator-driven authorization-code bootstrap.
//!
//! `/auth` sends the operator to the platform's consent page; the platform
//! redirects back to `/` with a one-time `code`, which is exchanged for the
//! first access + refresh token pair.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{AppError, AppState, FEED_PATH};

#[derive(Debug, Deserialize)]
pub(super) struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET / - redirect callback, or a plain visit that forwards to the feed.
pub(super) async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::AuthorizationDenied {
            error,
            description: params.error_description.unwrap_or_default(),
        });
    }

    if let Some(code) = params.code.filter(|c| !c.is_empty()) {
        tracing::info!(oauth_state = ?params.state, "received authorization code");
        state.tokens.exchange_code(&code).await?;
    }

    Ok(Redirect::to(FEED_PATH))
}

/// GET /auth - start the authorization-code flow.
pub(super) async fn authorize(State(state): State<AppState>) -> Redirect {
    let oauth_state = Uuid::new_v4().to_string();
    let url = state.tokens.authorization_url(&oauth_state);
    tracing::info!(%oauth_state, "redirecting operator to platform authorization page");
    Redirect::to(&url)
}
