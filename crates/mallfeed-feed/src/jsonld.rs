//! Mapping from platform product records to schema.org `Product` JSON-LD.

use mallfeed_core::ProductRecord;
use rust_decimal::Decimal;
use serde::Serialize;

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Storefront details the mapping needs beyond the product record itself.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Storefront origin, e.g. `https://mymall.cafe24.com`.
    pub storefront_url: String,
    /// ISO 4217 code written to `priceCurrency`.
    pub currency: String,
}

impl FeedSettings {
    /// Canonical product page for a product number.
    #[must_use]
    pub fn product_url(&self, product_no: i64) -> String {
        format!(
            "{}/product/detail.html?product_no={product_no}",
            self.storefront_url.trim_end_matches('/')
        )
    }
}

/// schema.org `ItemAvailability` values used in offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    #[serde(rename = "https://schema.org/InStock")]
    InStock,
    #[serde(rename = "https://schema.org/OutOfStock")]
    OutOfStock,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonLdOffer {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "priceCurrency")]
    pub price_currency: String,
    pub availability: Availability,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonLdProduct {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub url: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub offers: JsonLdOffer,
}

/// Maps one product record to its JSON-LD representation.
#[must_use]
pub fn to_json_ld(product: &ProductRecord, settings: &FeedSettings) -> JsonLdProduct {
    let url = settings.product_url(product.id);
    let availability = if product.in_stock() {
        Availability::InStock
    } else {
        Availability::OutOfStock
    };
    let sku = product
        .product_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map_or_else(|| product.id.to_string(), str::to_owned);

    JsonLdProduct {
        context: SCHEMA_CONTEXT,
        kind: "Product",
        name: product.display_name.trim().to_owned(),
        image: product.best_image_url().map(absolute_image_url),
        url: url.clone(),
        sku,
        description: product
            .summary_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned),
        offers: JsonLdOffer {
            kind: "Offer",
            price: product.price,
            price_currency: settings.currency.clone(),
            availability,
            url,
        },
    }
}

/// Image CDNs commonly hand out protocol-relative URLs (`//cdn/...`), which
/// crawlers reading the JSON outside a page context cannot resolve.
fn absolute_image_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_owned()
    }
}
