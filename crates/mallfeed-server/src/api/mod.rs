mod error;
mod feed;
mod oauth;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::{DateTime, Utc};
use mallfeed_client::{
    build_http_client, CatalogClient, ClientError, MemoryTokenStore, OAuthClient,
    OAuthCredentials, TokenManager, TokenState, TokenStore,
};
use mallfeed_core::AppConfig;
use mallfeed_feed::FeedSettings;
use secrecy::SecretString;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

pub use error::AppError;

pub(crate) const FEED_PATH: &str = "/ai-feed";

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenManager>,
    pub catalog: Arc<CatalogClient>,
    pub feed: Arc<FeedSettings>,
    pub template_path: Arc<PathBuf>,
}

impl AppState {
    /// Wires the token manager, catalog client, and feed settings from config.
    ///
    /// The token store starts empty unless a bootstrap refresh token is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the HTTP client cannot be built or the API
    /// base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let http = build_http_client(config.request_timeout_secs, &config.user_agent)?;

        let oauth = OAuthClient::new(
            http.clone(),
            &config.api_base_url,
            OAuthCredentials {
                client_id: config.client_id.clone(),
                client_secret: SecretString::from(config.client_secret.clone()),
                scope: config.oauth_scope.clone(),
                redirect_uri: config.redirect_uri.clone(),
            },
        )?;

        let initial = config
            .bootstrap_refresh_token
            .clone()
            .map(|t| TokenState::with_refresh_token(SecretString::from(t)))
            .unwrap_or_default();
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_state(initial));

        let tokens = TokenManager::new(oauth, store, config.grant_mode)
            .with_refresh_margin_secs(config.token_refresh_margin_secs);
        let catalog = CatalogClient::new(
            http,
            &config.api_base_url,
            config.page_size,
            config.max_pages,
        )?;

        Ok(Self {
            tokens: Arc::new(tokens),
            catalog: Arc::new(catalog),
            feed: Arc::new(FeedSettings {
                storefront_url: config.storefront_url.clone(),
                currency: config.currency.clone(),
            }),
            template_path: Arc::new(config.template_path.clone()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    grant_mode: String,
    token_cached: bool,
}

pub fn build_app(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/", get(oauth::callback))
        .route("/auth", get(oauth::authorize))
        .route(FEED_PATH, get(feed::ai_feed))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(public_dir))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            grant_mode: state.tokens.mode().to_string(),
            token_cached: state.tokens.has_fresh_token(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
