//! # Document Numbering
//!
//! Human-readable numbers for invoices, purchase orders and returns.
//!
//! ## Format
//! ```text
//! INV-20261019-0042
//! │   │        │
//! │   │        └── daily sequence, zero-padded to 4 (wider past 9999)
//! │   └── document date (YYYYMMDD)
//! └── document kind prefix
//! ```
//!
//! The sequence restarts at 1 every day for every kind. The database layer
//! reads the highest number issued for the day inside the same transaction
//! that inserts the new document and hands it to [`next_sequence`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of numbered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Invoice,
    PurchaseOrder,
    Return,
}

impl DocumentKind {
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV",
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::Return => "RET",
        }
    }

    /// `LIKE` pattern matching every number of this kind issued on `date`.
    pub fn day_pattern(&self, date: NaiveDate) -> String {
        format!("{}-{}-%", self.prefix(), date.format("%Y%m%d"))
    }
}

/// Formats a document number.
///
/// ```rust
/// use chrono::NaiveDate;
/// use electrotech_core::numbering::{format_document_number, DocumentKind};
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// assert_eq!(
///     format_document_number(DocumentKind::Invoice, date, 42),
///     "INV-20261019-0042"
/// );
/// ```
pub fn format_document_number(kind: DocumentKind, date: NaiveDate, sequence: u32) -> String {
    format!("{}-{}-{:04}", kind.prefix(), date.format("%Y%m%d"), sequence)
}

/// Extracts the sequence from a number of `kind` issued on `date`.
///
/// Returns `None` when the prefix or date differ or the suffix isn't numeric.
pub fn parse_sequence(kind: DocumentKind, date: NaiveDate, number: &str) -> Option<u32> {
    let head = format!("{}-{}-", kind.prefix(), date.format("%Y%m%d"));
    let suffix = number.strip_prefix(&head)?;
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Next sequence given the highest number already issued today (if any).
pub fn next_sequence(kind: DocumentKind, date: NaiveDate, last_issued: Option<&str>) -> u32 {
    last_issued
        .and_then(|n| parse_sequence(kind, date, n))
        .map_or(1, |seq| seq.saturating_add(1))
}
