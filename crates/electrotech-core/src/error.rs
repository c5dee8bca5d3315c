//! # Error Types
//!
//! Domain-specific error types for electrotech-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  electrotech-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  electrotech-db errors (separate crate)                                │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  electrotech-service errors                                            │
//! │  └── ServiceError     - What callers see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← DbError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, ID, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Raised by the service layer after validation has passed but the request
/// conflicts with the current state of the store.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A referenced entity exists but has been deactivated.
    #[error("{entity} {id} is inactive")]
    Inactive { entity: String, id: String },

    /// Insufficient stock to complete a sale or reverse a purchase.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: 5 × LAPTOP-15
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "LAPTOP-15", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Document is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling a sale that is already cancelled
    /// - Returning goods from a cancelled sale
    #[error("{entity} {id} is {status}, cannot perform operation")]
    InvalidStatus {
        entity: String,
        id: String,
        status: String,
    },

    /// Another active administrator already exists.
    #[error("An administrator already exists: {username}")]
    AdminAlreadyExists { username: String },

    /// The operation would leave the system without an active administrator.
    #[error("User {username} is the only administrator")]
    LastAdmin { username: String },

    /// Return quantity exceeds what was sold and not yet returned.
    #[error("Cannot return {requested} of {code}: only {returnable} returnable")]
    ReturnExceedsSold {
        code: String,
        returnable: i64,
        requested: i64,
    },

    /// Username / password pair did not match an active account.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A sale or purchase was submitted without lines.
    #[error("{document} must contain at least one line")]
    EmptyDocument { document: String },

    /// A sale or purchase has too many lines.
    #[error("{document} cannot have more than {max} lines")]
    TooManyLines { document: String, max: usize },

    /// Entity is still referenced and cannot be deactivated.
    #[error("{entity} {id} is in use: {reason}")]
    InUse {
        entity: String,
        id: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an Inactive error for a given entity type and ID.
    pub fn inactive(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::Inactive {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
