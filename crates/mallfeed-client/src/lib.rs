pub mod client;
pub mod error;
pub mod oauth;
pub mod token;
pub mod types;

pub use client::{build_http_client, Catalog, CatalogClient};
pub use error::ClientError;
pub use oauth::{IssuedToken, OAuthClient, OAuthCredentials};
pub use token::{AccessToken, MemoryTokenStore, TokenManager, TokenState, TokenStore};
pub use types::{ProductsResponse, TokenResponse};
