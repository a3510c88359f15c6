//! Multi-page product fetch loop for `CatalogClient`.

use mallfeed_core::ProductRecord;
use secrecy::SecretString;

use crate::error::ClientError;

use super::CatalogClient;

/// Every product read by one pagination run.
#[derive(Debug, Default)]
pub struct Catalog {
    pub products: Vec<ProductRecord>,
    pub pages_fetched: usize,
    /// `true` when the page cap stopped the loop before the upstream signalled
    /// the end of the catalog.
    pub truncated: bool,
}

impl CatalogClient {
    /// Fetches the whole catalog, page by page, starting at page 1.
    ///
    /// Stops on an empty page or on a page shorter than the configured page
    /// size. If `max_pages` full pages have been read the loop stops early and
    /// the returned [`Catalog`] is marked `truncated`.
    ///
    /// **All-or-nothing semantics**: on any page failure, products from earlier
    /// pages are discarded and the error is returned.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_products_page`].
    pub async fn fetch_all_products(&self, token: &SecretString) -> Result<Catalog, ClientError> {
        let page_size = self.page_size as usize;
        let mut catalog = Catalog::default();
        let mut page: u32 = 1;

        loop {
            if catalog.pages_fetched >= self.max_pages {
                tracing::warn!(
                    max_pages = self.max_pages,
                    products = catalog.products.len(),
                    "pagination cap reached; catalog truncated"
                );
                catalog.truncated = true;
                break;
            }

            let products = self.fetch_products_page(token, page).await?;
            catalog.pages_fetched += 1;
            tracing::debug!(page, count = products.len(), "fetched products page");

            if products.is_empty() {
                break;
            }

            let is_last = products.len() < page_size;
            catalog.products.extend(products);
            if is_last {
                break;
            }

            page += 1;
        }

        Ok(catalog)
    }
}
