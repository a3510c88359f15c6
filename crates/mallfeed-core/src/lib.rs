pub mod app_config;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, GrantMode};
pub use config::{
    app_config_from_lookup, load_app_config, load_app_config_from_env, MAX_TOKEN_REFRESH_MARGIN_SECS,
};
pub use products::ProductRecord;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
