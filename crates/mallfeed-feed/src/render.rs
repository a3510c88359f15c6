//! Splices the catalog's JSON-LD into the static feed template.
//!
//! The injection point is, in order of preference:
//! 1. the first [`JSON_LD_PLACEHOLDER`], which is replaced;
//! 2. the first `</head>`, which gets the script inserted right before it.
//!
//! Everything else in the template is copied through byte for byte. A template
//! with neither marker is rejected rather than served without structured data.

use std::path::Path;

use mallfeed_core::ProductRecord;

use crate::error::FeedError;
use crate::jsonld::{to_json_ld, FeedSettings, JsonLdProduct};

/// Dedicated marker a template can use to choose where the script goes.
pub const JSON_LD_PLACEHOLDER: &str = "<!-- mallfeed:json-ld -->";

const HEAD_CLOSE: &str = "</head>";

/// Reads the feed template from disk.
///
/// # Errors
///
/// Returns [`FeedError::Template`] if the file cannot be read.
pub async fn load_template(path: &Path) -> Result<String, FeedError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FeedError::Template {
            path: path.to_path_buf(),
            source,
        })
}

/// Renders the full feed page for `products`.
///
/// # Errors
///
/// - [`FeedError::Serialize`] if the JSON-LD cannot be serialized.
/// - [`FeedError::MissingInjectionPoint`] if the template has no marker.
pub fn render_feed(
    products: &[ProductRecord],
    template: &str,
    settings: &FeedSettings,
) -> Result<String, FeedError> {
    let items: Vec<JsonLdProduct> = products
        .iter()
        .map(|product| to_json_ld(product, settings))
        .collect();
    let script = json_ld_script(&items)?;
    let html = inject_script(template, &script)?;
    tracing::debug!(products = items.len(), bytes = html.len(), "rendered feed");
    Ok(html)
}

/// Serializes `items` as one `application/ld+json` script tag.
///
/// `</` is written as `<\/` (an equivalent JSON escape) so product text
/// containing `</script>` cannot terminate the tag early.
///
/// # Errors
///
/// Returns [`FeedError::Serialize`] if serialization fails.
pub fn json_ld_script(items: &[JsonLdProduct]) -> Result<String, FeedError> {
    let json = serde_json::to_string(items)?.replace("</", "<\\/");
    Ok(format!(r#"<script type="application/ld+json">{json}</script>"#))
}

/// Inserts `script` at the template's injection point.
///
/// # Errors
///
/// Returns [`FeedError::MissingInjectionPoint`] if the template contains
/// neither [`JSON_LD_PLACEHOLDER`] nor `</head>`.
pub fn inject_script(template: &str, script: &str) -> Result<String, FeedError> {
    if template.contains(JSON_LD_PLACEHOLDER) {
        return Ok(template.replacen(JSON_LD_PLACEHOLDER, script, 1));
    }

    let at = template
        .find(HEAD_CLOSE)
        .ok_or(FeedError::MissingInjectionPoint)?;
    let mut html = String::with_capacity(template.len() + script.len());
    html.push_str(&template[..at]);
    html.push_str(script);
    html.push_str(&template[at..]);
    Ok(html)
}
