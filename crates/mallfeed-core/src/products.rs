//! Product records as returned by the platform's `GET /api/v2/products`.
//!
//! Only the fields that feed the JSON-LD output are modelled. Everything else
//! the platform sends is kept untouched in [`ProductRecord::extra`] so a record
//! can be re-serialized without loss.
//!
//! ### `price`
//! Observed as a decimal string (`"12000.00"`). Some malls return a bare number
//! and unpriced products may carry `null` or `""`. All of these are accepted;
//! the last two become `None`.
//!
//! ### `detail_image` / `list_image`
//! Frequently protocol-relative (`//ecimg.cafe24img.com/...`). Kept verbatim
//! here; the feed renderer decides how to absolutize them.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One product from the upstream listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Platform product number.
    #[serde(rename = "product_no")]
    pub id: i64,

    #[serde(rename = "product_name")]
    pub display_name: String,

    /// Merchant-facing product code, used as the SKU when present.
    #[serde(default)]
    pub product_code: Option<String>,

    /// Thumbnail shown on listing pages.
    #[serde(rename = "list_image", default)]
    pub primary_image_url: Option<String>,

    /// Large image shown on the product detail page.
    #[serde(rename = "detail_image", default)]
    pub detail_image_url: Option<String>,

    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub stock_quantity: Option<i64>,

    #[serde(default)]
    pub summary_description: Option<String>,

    /// Platform-specific fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRecord {
    /// Returns `true` when the record reports stock on hand.
    ///
    /// A missing quantity is treated as zero.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity.unwrap_or(0) > 0
    }

    /// The best image for a detail view: the detail image, falling back to the
    /// listing image. Blank strings count as absent.
    #[must_use]
    pub fn best_image_url(&self) -> Option<&str> {
        non_blank(self.detail_image_url.as_deref())
            .or_else(|| non_blank(self.primary_image_url.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(Value::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a decimal price, got {other}"
        ))),
    }
}
