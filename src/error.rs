use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::auth::dto::{ErrorItem, ErrorsResponse, MessageResponse};
use crate::auth::repo::StoreError;
use crate::auth::validation::{Field, FieldError};

pub const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

/// Outcome of the register/login workflows when they do not succeed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("{0} already exists")]
    Conflict(Field),
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConstraintViolation(field) => AuthError::Conflict(field),
            StoreError::Database(e) => AuthError::Unexpected(e.into()),
        }
    }
}

impl From<&FieldError> for ErrorItem {
    fn from(e: &FieldError) -> Self {
        Self {
            field: e.field.as_str(),
            message: e.to_string(),
        }
    }
}

/// Client-facing failure. Carries only what may be shown to the caller.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(Vec<ErrorItem>),
    Unauthorized(&'static str),
    Internal(&'static str),
}

impl AuthError {
    /// Map to a response; `failure_message` replaces any internal error text.
    pub fn into_api(self, failure_message: &'static str) -> ApiError {
        match self {
            AuthError::Validation(errors) => {
                ApiError::BadRequest(errors.iter().map(ErrorItem::from).collect())
            }
            AuthError::Conflict(field) => ApiError::BadRequest(vec![ErrorItem {
                field: field.as_str(),
                message: AuthError::Conflict(field).to_string(),
            }]),
            AuthError::InvalidCredentials => ApiError::Unauthorized(INVALID_CREDENTIALS),
            AuthError::Unexpected(e) => {
                error!(error = ?e, "{}", failure_message);
                ApiError::Internal(failure_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorsResponse {
                    success: false,
                    errors,
                }),
            )
                .into_response(),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(MessageResponse {
                    success: false,
                    message,
                }),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    success: false,
                    message,
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validation::ErrorKind;

    #[test]
    fn conflict_becomes_single_field_error() {
        match AuthError::Conflict(Field::Email).into_api("boom") {
            ApiError::BadRequest(items) => assert_eq!(
                items,
                vec![ErrorItem {
                    field: "email",
                    message: "Email already exists".into()
                }]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn validation_keeps_order_and_wire_names() {
        let err = AuthError::Validation(vec![
            FieldError::new(Field::ConfirmPassword, ErrorKind::Mismatch),
            FieldError::new(Field::FullName, ErrorKind::Required),
        ]);
        match err.into_api("boom") {
            ApiError::BadRequest(items) => {
                assert_eq!(items[0].field, "confirmPassword");
                assert_eq!(items[1].field, "fullName");
                assert_eq!(items[1].message, "Full name is required");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unexpected_hides_internal_text() {
        let err = AuthError::Unexpected(anyhow::anyhow!("disk I/O error at page 7"));
        match err.into_api("An error occurred during login") {
            ApiError::Internal(msg) => assert_eq!(msg, "An error occurred during login"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn store_constraint_maps_to_conflict() {
        let err: AuthError = StoreError::ConstraintViolation(Field::Username).into();
        assert!(matches!(err, AuthError::Conflict(Field::Username)));
        assert_eq!(err.to_string(), "Username already exists");
    }
}
