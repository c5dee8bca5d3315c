//! # electrotech-core: Pure Domain Logic for ElectroTech
//!
//! Business types and rules for the ElectroTech inventory / point-of-sale
//! backend, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ElectroTech Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              electrotech-service (Service Layer)                │   │
//! │  │   SaleService, PurchaseService, UserService, ProductService ... │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ electrotech-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ numbering │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ INV / PO  │  │   field   │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │   / RET   │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                electrotech-db (Database Layer)                  │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, User, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`numbering`] - Invoice / purchase order / return numbers
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use electrotech_core::money::Money;
//! use electrotech_core::types::TaxRate;
//!
//! let price = Money::from_cents(129_900); // $1,299.00 laptop
//! let tax = price.calculate_tax(TaxRate::from_bps(1600));
//! assert_eq!(tax.cents(), 20_784);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::DocumentKind;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default sales tax rate in basis points (1600 = 16%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1600;

/// Maximum number of lines on a single sale or purchase.
///
/// ## Business Reason
/// Keeps documents printable on one invoice and stops runaway input.
pub const MAX_DOCUMENT_LINES: usize = 100;

/// Maximum quantity of a single product on one document line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Largest amount accepted for a single price, cost, discount or salary
/// ($1,000,000,000.00).
///
/// Bounds every document total: 100 lines × 999 units × this price, with tax
/// at up to 100%, stays far below `i64::MAX` cents.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Largest stock level, and largest single manual stock correction.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Default minimum password length for user accounts.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;
