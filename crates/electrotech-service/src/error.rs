//! # Service Error Type
//!
//! Unified error type returned by every service operation.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ElectroTech                            │
//! │                                                                         │
//! │  Caller (UI)                 Service Layer                              │
//! │  ───────────                 ─────────────                              │
//! │                                                                         │
//! │  sales.register(new_sale)                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Service Operation                                               │  │
//! │  │  ServiceResult<T>                                                │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  ValidationError? ─── "quantity must be positive" ──┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  CoreError? ─── InsufficientStock ──────────── ServiceError ───►│  │
//! │  │         │                                           ▲           │  │
//! │  │         ▼                                           │           │  │
//! │  │  DbError? ─── QueryFailed (logged, hidden) ─────────┘           │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error carries a machine-readable `code` and a human-readable
//! `message`. Database internals never reach the message; they are logged.

use serde::Serialize;

use electrotech_core::{CoreError, ValidationError};
use electrotech_db::DbError;

/// Convenience alias used by every service.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned from service operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for LAP-DELL-14: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced record does not exist
    NotFound,

    /// Input failed field validation
    ValidationError,

    /// Business key already taken (code, document number, username, ...)
    Duplicate,

    /// Database operation failed
    DatabaseError,

    /// Request conflicts with the current state of the store
    BusinessRule,

    /// Not enough units on hand
    InsufficientStock,

    /// Wrong username or password
    AuthenticationFailed,

    /// Unexpected failure
    Internal,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ServiceError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::ValidationError, message)
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::BusinessRule, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                tracing::warn!(field = %field, value = %value, "Unique constraint violation");
                ServiceError::new(ErrorCode::Duplicate, "A record with this value already exists")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint violation: {}", message);
                ServiceError::business_rule("Operation would break a store constraint")
            }
            DbError::ReturnExceedsSold {
                returnable,
                requested,
                ..
            } => ServiceError::business_rule(format!(
                "Cannot return {}: only {} returnable",
                requested, returnable
            )),
            DbError::StockConflict {
                product_id,
                requested,
            } => ServiceError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for product {}: requested {}",
                    product_id, requested
                ),
            ),
            DbError::StatusConflict { entity, id, status } => ServiceError::business_rule(
                format!("{} {} is {}, cannot perform operation", entity, id, status),
            ),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ServiceError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts domain errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        let code = match err {
            CoreError::Validation(e) => return ServiceError::from(e),
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidCredentials => ErrorCode::AuthenticationFailed,
            CoreError::EmptyDocument { .. } | CoreError::TooManyLines { .. } => {
                ErrorCode::ValidationError
            }
            CoreError::Inactive { .. }
            | CoreError::InvalidStatus { .. }
            | CoreError::AdminAlreadyExists { .. }
            | CoreError::LastAdmin { .. }
            | CoreError::ReturnExceedsSold { .. }
            | CoreError::InUse { .. } => ErrorCode::BusinessRule,
        };

        ServiceError::new(code, err.to_string())
    }
}

/// Converts field validation errors to service errors.
impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::Duplicate { .. } => ErrorCode::Duplicate,
            _ => ErrorCode::ValidationError,
        };

        ServiceError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let err = ServiceError::new(ErrorCode::InsufficientStock, "no units");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(json["message"], "no units");
    }

    #[test]
    fn test_db_errors_hide_internals() {
        let err: ServiceError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let err: ServiceError = DbError::UniqueViolation {
            field: "code".into(),
            value: "LAP-01".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Duplicate);
        assert!(!err.message.contains("LAP-01"));

        let err: ServiceError = DbError::CheckViolation {
            message: "CHECK constraint failed: stock >= 0".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert!(!err.message.contains("CHECK"));
        assert!(!err.message.contains("stock >= 0"));
    }

    #[test]
    fn test_document_conflicts_map_to_rules() {
        let err: ServiceError = DbError::StockConflict {
            product_id: "p1".into(),
            requested: 4,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: ServiceError = DbError::status_conflict("Sale", "s1", "cancelled").into();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err: ServiceError = DbError::ReturnExceedsSold {
            product_id: "p1".into(),
            returnable: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(err.message, "Cannot return 2: only 1 returnable");
    }

    #[test]
    fn test_core_errors() {
        let err: ServiceError = CoreError::InvalidCredentials.into();
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
        assert_eq!(err.to_string(), "[AuthenticationFailed] Invalid username or password");

        let err: ServiceError = CoreError::LastAdmin {
            username: "admin".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err: ServiceError = CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("name is required"));
    }

    #[test]
    fn test_validation_duplicate_code() {
        let err: ServiceError = ValidationError::Duplicate {
            field: "product line".into(),
            value: "p1".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }
}
