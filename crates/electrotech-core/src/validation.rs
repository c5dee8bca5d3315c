//! # Validation Module
//!
//! Field validation rules shared by every service.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service (electrotech-service)                                │
//! │  └── THIS MODULE: primitive field rules (length, format, range)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service business rules                                       │
//! │  └── references exist and are active, stock, admin uniqueness          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every string validator trims its input first. Lengths are counted in
//! characters, not bytes, so accented names are measured correctly.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::{MAX_AMOUNT_CENTS, MAX_DOCUMENT_LINES, MAX_LINE_QUANTITY, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text field (descriptions, addresses, notes, reasons).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Longest person / company / category name.
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Helpers
// =============================================================================

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Trims an optional string and collapses blanks to `None`.
///
/// ```rust
/// use electrotech_core::validation::clean_optional;
///
/// assert_eq!(clean_optional(Some("  ")), None);
/// assert_eq!(clean_optional(Some(" a ")), Some("a".to_string()));
/// ```
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name-like field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if char_len(value) > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field (≤ [`MAX_TEXT_LENGTH`]).
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if char_len(v.trim()) > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        _ => Ok(()),
    }
}

/// Validates a product code.
///
/// ## Rules
/// - Required, at most 30 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use electrotech_core::validation::validate_product_code;
///
/// assert!(validate_product_code("LAP-DELL-15").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("has space").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    validate_required("code", code, 30)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (required, ≤ 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name, 200)
}

/// Validates a national ID, passport or tax registration number.
///
/// ## Rules
/// - 5 to 20 characters
/// - Letters, digits and hyphens only
pub fn validate_document_number(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if char_len(value) < 5 {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: 5,
        });
    }

    if char_len(value) > 20 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 20,
        });
    }

    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional e-mail address.
///
/// ## Rules
/// - At most 254 characters
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot, no whitespace, doesn't start or end with a dot
///
/// ```rust
/// use electrotech_core::validation::validate_email;
///
/// assert!(validate_email(Some("ana@electrotech.com")).is_ok());
/// assert!(validate_email(None).is_ok());
/// assert!(validate_email(Some("ana.electrotech.com")).is_err());
/// ```
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if char_len(email) > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain exactly one '@'")),
    };

    if local.is_empty() {
        return Err(invalid("missing name before '@'"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Validates an optional phone number.
///
/// ## Rules
/// - 7 to 20 characters of digits, spaces, `+`, `-`, `(`, `)`
/// - At least 7 digits
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<()> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    if char_len(phone) > 20 {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: 20,
        });
    }

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
    if !phone.chars().all(allowed) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "may only contain digits, spaces, +, -, ( and )".to_string(),
        });
    }

    if phone.chars().filter(char::is_ascii_digit).count() < 7 {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: 7,
        });
    }

    Ok(())
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 30 characters
/// - Starts with a letter
/// - Letters, digits, `_` and `.` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if char_len(username) < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if char_len(username) > 30 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 30,
        });
    }

    let starts_with_letter = username
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if !starts_with_letter || !valid_chars {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must start with a letter and contain only letters, numbers, '_' or '.'"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a new password.
///
/// ## Rules
/// - At least `min_length` characters, at most 128
/// - Contains at least one letter and one digit
///
/// Passwords are never trimmed.
pub fn validate_password(password: &str, min_length: usize) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if char_len(password) < min_length {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: min_length,
        });
    }

    if char_len(password) > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must contain at least one letter and one digit".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query. Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if char_len(query) > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an amount in cents (0..=[`MAX_AMOUNT_CENTS`]).
///
/// ```rust
/// use electrotech_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("price", 0).is_ok());
/// assert!(validate_amount_cents("price", -100).is_err());
/// assert!(validate_amount_cents("price", i64::MAX).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a product's price pair: both non-negative, sale ≥ purchase.
pub fn validate_prices(purchase_price_cents: i64, sale_price_cents: i64) -> ValidationResult<()> {
    validate_amount_cents("purchase price", purchase_price_cents)?;
    validate_amount_cents("sale price", sale_price_cents)?;

    if sale_price_cents < purchase_price_cents {
        return Err(ValidationError::OutOfRange {
            field: "sale price".to_string(),
            min: purchase_price_cents,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a document line quantity (1..=999).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level (0..=[`MAX_STOCK`]).
pub fn validate_stock(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a manual stock correction: non-zero, at most [`MAX_STOCK`]
/// units either way.
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must not be zero".to_string(),
        });
    }

    if !(-MAX_STOCK..=MAX_STOCK).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Validates the number of lines on a sale or purchase.
pub fn validate_document_lines(document: &str, line_count: usize) -> CoreResult<()> {
    if line_count == 0 {
        return Err(CoreError::EmptyDocument {
            document: document.to_string(),
        });
    }

    if line_count > MAX_DOCUMENT_LINES {
        return Err(CoreError::TooManyLines {
            document: document.to_string(),
            max: MAX_DOCUMENT_LINES,
        });
    }

    Ok(())
}

/// Rejects documents listing the same product on two lines.
pub fn validate_unique_products<'a>(
    product_ids: impl IntoIterator<Item = &'a str>,
) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for id in product_ids {
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: "product line".to_string(),
                value: id.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use electrotech_core::validation::validate_uuid;
///
/// assert!(validate_uuid("client_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("client_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
