//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lexbook_domain::LexbookError;
use serde_json::json;

/// Wrapper so domain errors can be returned straight from handlers.
pub struct ApiError(pub LexbookError);

impl From<LexbookError> for ApiError {
    fn from(err: LexbookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            LexbookError::Validation(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            LexbookError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.clone()),
            LexbookError::Conflict(detail) => (StatusCode::CONFLICT, detail.clone()),
            LexbookError::Policy(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail.clone()),
            // Internals are logged server-side; clients get a generic reason.
            LexbookError::Dependency(_) => {
                (StatusCode::BAD_GATEWAY, "upstream dependency failed".to_string())
            }
            LexbookError::Database(_) | LexbookError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = Json(json!({
            "error": {
                "message": message,
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: LexbookError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(status_of(LexbookError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(LexbookError::NotFound("gone".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(LexbookError::Conflict("taken".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(LexbookError::Policy("too late".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(LexbookError::Dependency("down".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(LexbookError::Database("oops".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
