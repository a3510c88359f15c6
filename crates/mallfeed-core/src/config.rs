use crate::app_config::{AppConfig, GrantMode};
use crate::ConfigError;

/// Largest page the product listing endpoint will return.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound for `MALLFEED_TOKEN_REFRESH_MARGIN_SECS` (one day).
pub const MAX_TOKEN_REFRESH_MARGIN_SECS: i64 = 24 * 60 * 60;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    app_config_from_lookup(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be driven from a `HashMap` in tests without `set_var`/`remove_var`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn app_config_from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let mall_id = require("MALLFEED_MALL_ID")?;
    let client_id = require("MALLFEED_CLIENT_ID")?;
    let client_secret = require("MALLFEED_CLIENT_SECRET")?;

    let oauth_scope = or_default("MALLFEED_OAUTH_SCOPE", "mall.read_product");
    let grant_mode = parse_grant_mode(&or_default("MALLFEED_GRANT_MODE", "authorization_code"))?;

    // Platforms that inject PORT expect us to listen on every interface.
    let bind_addr = match lookup("PORT") {
        Ok(port) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?;
            SocketAddr::from(([0, 0, 0, 0], port))
        }
        Err(_) => or_default("MALLFEED_BIND_ADDR", "0.0.0.0:3000")
            .parse::<SocketAddr>()
            .map_err(|e| invalid("MALLFEED_BIND_ADDR", e.to_string()))?,
    };
    let log_level = or_default("MALLFEED_LOG_LEVEL", "info");

    let base_url = trim_trailing_slash(&or_default("MALLFEED_BASE_URL", "http://localhost:3000"));
    let redirect_uri = or_default("MALLFEED_REDIRECT_URI", &format!("{base_url}/"));
    let api_base_url = trim_trailing_slash(&or_default(
        "MALLFEED_API_BASE_URL",
        &format!("https://{mall_id}.cafe24api.com"),
    ));
    let storefront_url = trim_trailing_slash(&or_default(
        "MALLFEED_STOREFRONT_URL",
        &format!("https://{mall_id}.cafe24.com"),
    ));
    let currency = or_default("MALLFEED_CURRENCY", "KRW");
    let bootstrap_refresh_token = lookup("MALLFEED_REFRESH_TOKEN")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let template_path = PathBuf::from(or_default(
        "MALLFEED_TEMPLATE_PATH",
        "./templates/ai-feed.html",
    ));
    let public_dir = PathBuf::from(or_default("MALLFEED_PUBLIC_DIR", "./public"));

    let request_timeout_secs = parse_u64("MALLFEED_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("MALLFEED_USER_AGENT", "mallfeed/0.1 (catalog-feed)");

    let page_size = parse_u32("MALLFEED_PAGE_SIZE", "100")?;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(invalid(
            "MALLFEED_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }
    let max_pages = parse_usize("MALLFEED_MAX_PAGES", "200")?;
    if max_pages == 0 {
        return Err(invalid("MALLFEED_MAX_PAGES", "must be at least 1".to_string()));
    }

    let token_refresh_margin_secs = or_default("MALLFEED_TOKEN_REFRESH_MARGIN_SECS", "300")
        .parse::<i64>()
        .ok()
        .filter(|secs| (0..=MAX_TOKEN_REFRESH_MARGIN_SECS).contains(secs))
        .ok_or_else(|| {
            invalid(
                "MALLFEED_TOKEN_REFRESH_MARGIN_SECS",
                format!("expected between 0 and {MAX_TOKEN_REFRESH_MARGIN_SECS} seconds"),
            )
        })?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        mall_id,
        client_id,
        client_secret,
        oauth_scope,
        grant_mode,
        base_url,
        redirect_uri,
        api_base_url,
        storefront_url,
        currency,
        bootstrap_refresh_token,
        template_path,
        public_dir,
        request_timeout_secs,
        user_agent,
        page_size,
        max_pages,
        token_refresh_margin_secs,
    })
}

/// Parse a string into a `GrantMode` variant.
///
/// Hyphens and case are ignored, so `Client-Credentials` is accepted.
fn parse_grant_mode(s: &str) -> Result<GrantMode, ConfigError> {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "client_credentials" => Ok(GrantMode::ClientCredentials),
        "authorization_code" => Ok(GrantMode::AuthorizationCode),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MALLFEED_GRANT_MODE".to_string(),
            reason: format!(
                "expected \"client_credentials\" or \"authorization_code\", got \"{other}\""
            ),
        }),
    }
}

fn trim_trailing_slash(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
