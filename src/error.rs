use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application-level error taxonomy. Every failure a handler can produce
/// maps onto one of these; the HTTP layer renders them as
/// `{"detail": "..."}` with the matching status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing/invalid token, or insufficient role. Both report 401.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Business-rule violation (self-follow, duplicate edge, not the author).
    #[error("{0}")]
    Forbidden(&'static str),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Malformed or rejected request payload.
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Internal server error.")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Internal(ref e) = self {
            error!(error = %e, "internal error");
        }

        let mut res = (status, Json(json!({ "detail": self.to_string() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

/// True when the database rejected an insert on a unique/primary-key
/// constraint. The composite keys on the association tables are the
/// authoritative guard against duplicate edges; this lets callers map a
/// lost race to the same error as the pre-check.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_detail(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        value["detail"].as_str().expect("detail string").to_string()
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401_with_bearer_challenge() {
        let res = AppError::Unauthorized("Could not validate credentials").into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert_eq!(body_detail(res).await, "Could not validate credentials");
    }

    #[tokio::test]
    async fn forbidden_and_not_found_statuses() {
        let res = AppError::Forbidden("Users can't follow themselves.").into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = AppError::NotFound("User with the given ID was not found in the DB.")
            .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_hides_the_underlying_error() {
        let res = AppError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_detail(res).await, "Internal server error.");
    }

    #[test]
    fn row_not_found_is_not_a_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
