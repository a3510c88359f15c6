use axum::{extract::State, response::Html, Extension};

use crate::middleware::RequestId;

use super::{AppError, AppState};

/// GET /ai-feed - renders the catalog as JSON-LD inside the feed template.
///
/// Every request is a full read-through: token check, every listing page,
/// render. Nothing about the catalog is cached between requests.
pub(super) async fn ai_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Html<String>, AppError> {
    let template = mallfeed_feed::load_template(&state.template_path).await?;
    let token = state.tokens.acquire_token().await?;
    let catalog = state.catalog.fetch_all_products(&token).await?;
    let html = mallfeed_feed::render_feed(&catalog.products, &template, &state.feed)?;

    tracing::info!(
        request_id = %req_id.0,
        products = catalog.products.len(),
        pages = catalog.pages_fetched,
        truncated = catalog.truncated,
        "served ai feed"
    );
    Ok(Html(html))
}
