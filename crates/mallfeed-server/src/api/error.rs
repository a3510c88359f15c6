use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mallfeed_client::ClientError;
use mallfeed_feed::FeedError;
use thiserror::Error;

/// Everything a page handler can fail with.
///
/// All variants render the same generic HTML error page with status 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("authorization was not granted: {error} {description}")]
    AuthorizationDenied { error: String, description: String },
}

impl AppError {
    fn needs_operator_authorization(&self) -> bool {
        matches!(
            self,
            AppError::Client(ClientError::AuthRequired) | AppError::AuthorizationDenied { .. }
        )
    }
}

/// Error page shown for any failed page request.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorPage {
    message: String,
    link_to_auth: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let page = ErrorPage {
            message: self.to_string(),
            link_to_auth: self.needs_operator_authorization(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
    }

    #[tokio::test]
    async fn error_page_escapes_upstream_markup() {
        let err = AppError::AuthorizationDenied {
            error: "<script>alert(1)</script>".to_owned(),
            description: "Tom & 'Jerry'".to_owned(),
        };
        let (status, html) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp;"));
    }

    #[tokio::test]
    async fn auth_required_page_links_to_auth() {
        let (status, html) = body_of(AppError::Client(ClientError::AuthRequired)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains(r#"href="/auth""#));
    }

    #[tokio::test]
    async fn feed_errors_do_not_link_to_auth() {
        let err = AppError::Feed(FeedError::MissingInjectionPoint);
        assert!(!err.needs_operator_authorization());
        let (_, html) = body_of(err).await;
        assert!(!html.contains(r#"href="/auth""#));
        assert!(html.contains("&lt;/head&gt;"));
    }
}
