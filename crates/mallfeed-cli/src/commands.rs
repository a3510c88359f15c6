//! Subcommand handlers.
//!
//! Each command builds its own token manager from config, so a CLI run never
//! shares token state with a running server.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mallfeed_client::{
    build_http_client, Catalog, CatalogClient, MemoryTokenStore, OAuthClient, OAuthCredentials,
    TokenManager, TokenState, TokenStore,
};
use mallfeed_core::AppConfig;
use mallfeed_feed::FeedSettings;
use secrecy::SecretString;
use uuid::Uuid;

/// Path value that routes output to stdout instead of a file.
pub(crate) const STDOUT_PATH: &str = "-";

struct Clients {
    tokens: TokenManager,
    catalog: CatalogClient,
}

fn build_clients(config: &AppConfig, refresh_token: Option<String>) -> anyhow::Result<Clients> {
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

    let seed = refresh_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| config.bootstrap_refresh_token.clone());
    let initial = seed
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
    Ok(Clients { tokens, catalog })
}

async fn fetch_catalog(clients: &Clients) -> anyhow::Result<Catalog> {
    let token = clients
        .tokens
        .acquire_token()
        .await
        .context("failed to obtain an access token")?;
    let catalog = clients
        .catalog
        .fetch_all_products(&token)
        .await
        .context("failed to fetch the product catalog")?;

    if catalog.truncated {
        tracing::warn!(
            pages = catalog.pages_fetched,
            "catalog was truncated at the page cap"
        );
    }
    Ok(catalog)
}

/// Prints the URL an operator opens to grant the app access.
pub(crate) fn authorize_url(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", fresh_authorization_url(config)?);
    Ok(())
}

/// Authorization URL carrying a newly generated `state`.
pub(crate) fn fresh_authorization_url(config: &AppConfig) -> anyhow::Result<String> {
    let clients = build_clients(config, None)?;
    let oauth_state = Uuid::new_v4().to_string();
    tracing::info!(%oauth_state, "generated authorization URL");
    Ok(clients.tokens.authorization_url(&oauth_state))
}

/// Renders the feed page once and writes it to `output`.
pub(crate) async fn render(
    config: &AppConfig,
    output: &Path,
    refresh_token: Option<String>,
) -> anyhow::Result<()> {
    let template = mallfeed_feed::load_template(&config.template_path).await?;
    let clients = build_clients(config, refresh_token)?;
    let catalog = fetch_catalog(&clients).await?;

    let settings = FeedSettings {
        storefront_url: config.storefront_url.clone(),
        currency: config.currency.clone(),
    };
    let html = mallfeed_feed::render_feed(&catalog.products, &template, &settings)?;

    if output.as_os_str() == STDOUT_PATH {
        std::io::stdout()
            .lock()
            .write_all(html.as_bytes())
            .context("failed to write feed to stdout")?;
    } else {
        tokio::fs::write(output, &html)
            .await
            .with_context(|| format!("failed to write feed to {}", output.display()))?;
        tracing::info!(
            path = %output.display(),
            products = catalog.products.len(),
            "wrote feed"
        );
    }
    Ok(())
}

/// Prints the fetched catalog as pretty JSON.
pub(crate) async fn products(
    config: &AppConfig,
    refresh_token: Option<String>,
) -> anyhow::Result<()> {
    let clients = build_clients(config, refresh_token)?;
    let catalog = fetch_catalog(&clients).await?;
    println!("{}", serde_json::to_string_pretty(&catalog.products)?);
    tracing::info!(
        products = catalog.products.len(),
        pages = catalog.pages_fetched,
        "listed catalog"
    );
    Ok(())
}
