use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// One entry of a validation failure list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: String,
}

impl FieldError {
    pub fn new(field: &'static str, msg: impl Into<String>) -> Self {
        Self {
            field,
            msg: msg.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You can't access this route")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid signature sent!")]
    InvalidSignature,

    #[error("payment gateway error: {0}")]
    Gateway(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record"),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            ApiError::Gateway(e) => {
                error!(error = %e, "payment gateway call failed");
                json!({ "msg": "Payment gateway error" })
            }
            ApiError::Internal(e) => {
                error!(error = ?e, "internal error");
                json!({ "msg": "Server Error" })
            }
            other => json!({ "msg": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Collects field errors and turns them into `ApiError::Validation` at the end.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, msg: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, msg));
        }
        self
    }

    pub fn require(&mut self, value: &str, field: &'static str, msg: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, msg)
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_collects_every_failure() {
        let err = Validator::new()
            .require("", "name", "Name is required")
            .require("  ", "branch", "Please select your branch")
            .check(true, "role", "unused")
            .finish()
            .unwrap_err();
        match err {
            ApiError::Validation(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0], FieldError::new("name", "Name is required"));
                assert_eq!(list[1].field, "branch");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validator_passes_when_clean() {
        assert!(Validator::new().require("x", "name", "m").finish().is_ok());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidSignature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("Order").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Gateway(anyhow::anyhow!("down")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn sqlx_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn display_messages() {
        assert_eq!(ApiError::NotFound("Order").to_string(), "Order not found");
        assert_eq!(ApiError::InvalidSignature.to_string(), "Invalid signature sent!");
    }
}
