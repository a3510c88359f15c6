use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authorization required: no refresh token is held; complete the /auth flow")]
    AuthRequired,

    #[error("token endpoint rejected the {grant} grant with HTTP {status}: {body}")]
    UpstreamAuth {
        grant: &'static str,
        status: u16,
        body: String,
    },

    #[error("product listing request failed with HTTP {status} at {url}: {body}")]
    UpstreamApi {
        status: u16,
        url: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Longest upstream body excerpt carried inside an error.
pub(crate) const BODY_EXCERPT_CHARS: usize = 500;

/// Truncates an upstream error body to [`BODY_EXCERPT_CHARS`] characters,
/// respecting char boundaries.
pub(crate) fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}
