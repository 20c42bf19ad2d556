use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

const GENERIC_STORE_MESSAGE: &str = "A database error occurred while processing the request.";

/// Failures reported by the persistence gateway, classified once from the driver error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("database operation failed: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let detail = match db_err.constraint() {
                Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                None => db_err.message().to_string(),
            };
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(detail);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(detail);
            }
            if db_err.is_check_violation() {
                return StoreError::CheckViolation(detail);
            }
        }
        StoreError::Database(err)
    }
}

/// Error kinds surfaced by the services and rendered by the HTTP layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidReference(String),

    #[error("Currency {currency_id} cannot be associated with more than two languages")]
    CapacityExceeded { currency_id: i32 },

    #[error("Language {language_id} is already associated with a currency")]
    LanguageAlreadyBound { language_id: i32 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InUse(String),

    #[error("Failed to fetch data from the rate feed: {message}")]
    FeedUnavailable { status: Option<u16>, message: String },

    #[error("Rate feed returned an unexpected payload: {0}")]
    FeedFormat(String),

    #[error("{0}")]
    Persistence(String),
}

impl ServiceError {
    /// Logs the store detail and keeps only a generic notice for the caller.
    pub fn persistence(err: StoreError, notice: &str) -> Self {
        error!("Store failure: {}", err);
        ServiceError::Persistence(notice.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidReference(_) => "InvalidReference",
            ServiceError::CapacityExceeded { .. } => "CapacityExceeded",
            ServiceError::LanguageAlreadyBound { .. } => "LanguageAlreadyBound",
            ServiceError::NotFound(_) => "NotFound",
            ServiceError::Validation(_) => "Validation",
            ServiceError::Conflict(_) => "Conflict",
            ServiceError::InUse(_) => "InUse",
            ServiceError::FeedUnavailable { .. } => "FeedUnavailable",
            ServiceError::FeedFormat(_) => "FeedFormatError",
            ServiceError::Persistence(_) => "PersistenceError",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::persistence(err, GENERIC_STORE_MESSAGE)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidReference(_)
            | ServiceError::CapacityExceeded { .. }
            | ServiceError::Validation(_)
            | ServiceError::InUse(_) => StatusCode::BAD_REQUEST,
            ServiceError::LanguageAlreadyBound { .. } | ServiceError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::FeedUnavailable {
                status: Some(status),
                ..
            } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ServiceError::FeedUnavailable { status: None, .. }
            | ServiceError::FeedFormat(_)
            | ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        })
    }
}
