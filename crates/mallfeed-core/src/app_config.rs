use std::net::SocketAddr;
use std::path::PathBuf;

/// Which OAuth grant the deployment uses to obtain product-read tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantMode {
    /// The application authenticates as itself; no refresh token is involved.
    ClientCredentials,
    /// An operator authorizes once via `/auth`; the refresh token keeps the
    /// access token alive afterwards.
    AuthorizationCode,
}

impl std::fmt::Display for GrantMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantMode::ClientCredentials => write!(f, "client_credentials"),
            GrantMode::AuthorizationCode => write!(f, "authorization_code"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub mall_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub oauth_scope: String,
    pub grant_mode: GrantMode,
    /// Public URL this deployment is reachable at.
    pub base_url: String,
    /// Must match the redirect URI registered with the platform exactly.
    pub redirect_uri: String,
    /// Upstream API origin, e.g. `https://mymall.cafe24api.com`.
    pub api_base_url: String,
    /// Storefront origin used for canonical product links.
    pub storefront_url: String,
    pub currency: String,
    pub bootstrap_refresh_token: Option<String>,
    pub template_path: PathBuf,
    pub public_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_size: u32,
    pub max_pages: usize,
    pub token_refresh_margin_secs: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("mall_id", &self.mall_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("oauth_scope", &self.oauth_scope)
            .field("grant_mode", &self.grant_mode)
            .field("base_url", &self.base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("storefront_url", &self.storefront_url)
            .field("currency", &self.currency)
            .field(
                "bootstrap_refresh_token",
                &self.bootstrap_refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("template_path", &self.template_path)
            .field("public_dir", &self.public_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field(
                "token_refresh_margin_secs",
                &self.token_refresh_margin_secs,
            )
            .finish()
    }
}
