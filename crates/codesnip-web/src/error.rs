use axum::http::StatusCode;
use axum::http::header::InvalidHeaderValue;
use axum::response::{IntoResponse, Response};

/// Failures a page handler cannot render around.
#[derive(Debug)]
pub enum WebError {
    Render(tera::Error),
    Header(InvalidHeaderValue),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Render(e) => tracing::error!(error = %e, "template rendering failed"),
            WebError::Header(e) => tracing::error!(error = %e, "invalid response header"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}

impl From<tera::Error> for WebError {
    fn from(e: tera::Error) -> Self {
        WebError::Render(e)
    }
}

impl From<InvalidHeaderValue> for WebError {
    fn from(e: InvalidHeaderValue) -> Self {
        WebError::Header(e)
    }
}
