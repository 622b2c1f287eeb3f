//! Root page and catch-all responses.
//!
//! Both are fixed responses that reveal nothing about what sits behind the
//! gateway.

use axum::http::{Method, Uri};
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use crate::error::AppError;

/// Body served on `GET /`.
pub const WELCOME_HTML: &str = "<h1>Welcome</h1><p>This is a secure gateway.</p>";

/// Fixed welcome page for the root path.
pub async fn welcome() -> Html<&'static str> {
    Html(WELCOME_HTML)
}

/// `404 Not Found` for any request no route claimed.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    info!(method = %method, uri = %uri, "Unhandled request");
    AppError::NotFound(uri.path().to_string()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::error::NOT_FOUND_BODY;

    #[tokio::test]
    async fn test_welcome_body() {
        let response = welcome().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), WELCOME_HTML.as_bytes());
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = not_found(Method::DELETE, Uri::from_static("/nonexistent?x=1")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), NOT_FOUND_BODY.as_bytes());
    }
}
