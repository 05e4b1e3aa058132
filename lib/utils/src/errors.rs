use std::collections::BTreeMap;

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::status::StatusCode;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

const NOT_AUTHENTICATED_MESSAGE: &str = "The token could not be parsed from the request.";
const AUTH_FAILED_MESSAGE: &str = "The token is invalid or has expired.";
const INTERNAL_ERROR_MESSAGE: &str = "server-side error";
const NOT_AUTHORIZED_MESSAGE: &str = "You are not allowed to perform this action.";
const BLOCKED_FROM_APEX_MESSAGE: &str = "You are blocked from this Apexcom";
const BLOCKED_USER_MESSAGE: &str = "You are blocked from this user";
const BAD_REQUEST_MESSAGE: &str = "The given data was invalid.";

/// Validation messages keyed by input field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("invalid input: {0:?}")]
    ValidationError(FieldErrors),
    #[error("missing session token")]
    NotAuthenticated,
    #[error("authentication failed: {0}")]
    AuthenticationError(String),
    #[error("insufficient privileges")]
    InsufficientPrivileges,
    #[error("user is blocked from the apex")]
    BlockedFromApex,
    #[error("users are blocking each other")]
    BlockedUser,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    DatabaseError(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl AppError {
    /// Permission errors share the client error status of validation errors.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::NotAuthenticated | AppError::AuthenticationError(_) |
            AppError::InsufficientPrivileges | AppError::BlockedFromApex | AppError::BlockedUser => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Server errors never expose their detail.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => String::from(BAD_REQUEST_MESSAGE),
            AppError::NotAuthenticated => String::from(NOT_AUTHENTICATED_MESSAGE),
            AppError::AuthenticationError(_) => String::from(AUTH_FAILED_MESSAGE),
            AppError::InsufficientPrivileges => String::from(NOT_AUTHORIZED_MESSAGE),
            AppError::BlockedFromApex => String::from(BLOCKED_FROM_APEX_MESSAGE),
            AppError::BlockedUser => String::from(BLOCKED_USER_MESSAGE),
            AppError::NotFound(message) => message.clone(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => String::from(INTERNAL_ERROR_MESSAGE),
        }
    }

    /// Constructs a new [`AppError::InternalServerError`] from some other type.
    pub fn new(msg: impl ToString) -> Self {
        Self::InternalServerError(msg.to_string())
    }

    /// Constructs a [`AppError::ValidationError`] for a single field.
    pub fn invalid_field(field: &str, message: impl ToString) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.to_string(), vec![message.to_string()]);
        Self::ValidationError(field_errors)
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::NotFound(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("Request failed, status_code: {status_code}, error: {self}");
        } else {
            log::info!("Request rejected, status_code: {status_code}, error: {self}");
        }
        let fields = match &self {
            AppError::ValidationError(field_errors) => Some(field_errors.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.user_message(),
            fields,
        };
        (status_code, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound(String::from("Resource is not found.")),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, error_vec)| {
                let message_vec = error_vec
                    .iter()
                    .map(|error| match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("The {field} field is invalid ({}).", error.code),
                    })
                    .collect();
                (field.to_string(), message_vec)
            })
            .collect();
        AppError::ValidationError(field_errors)
    }
}
