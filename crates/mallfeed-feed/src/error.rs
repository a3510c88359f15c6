use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize JSON-LD: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("feed template has neither a JSON-LD placeholder nor a </head> tag")]
    MissingInjectionPoint,
}
