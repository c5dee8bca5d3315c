//! # Repository Module
//!
//! Database repository implementations for ElectroTech.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service                                                               │
//! │       │                                                                 │
//! │       │  db.products().get_by_code("LAP-001")                          │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── insert(&self, product)                                            │
//! │  ├── update(&self, product)                                            │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── search(&self, query, limit)                                       │
//! │  └── adjust_stock(&self, id, delta)                                    │
//! │       │                                                                 │
//! │       │  Parameterized SQL (bind, never format! user input)            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! Master data: [`category`], [`supplier`], [`product`], [`client`],
//! [`employee`], [`payment_method`], [`user`].
//!
//! Documents (transactional): [`sale`], [`purchase`], [`returns`].

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use electrotech_core::numbering::{format_document_number, next_sequence};
use electrotech_core::DocumentKind;

use crate::error::DbResult;

pub mod category;
pub mod client;
pub mod employee;
pub mod payment_method;
pub mod product;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod supplier;
pub mod user;

/// Generates a new entity ID (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a `LIKE` pattern matching `query` anywhere, with `%`, `_` and `\`
/// escaped. Use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Issues the next document number for `date` inside an open transaction.
///
/// Reads the highest number of the same kind issued that day. Longer numbers
/// sort first so `...-10000` beats `...-9999`.
pub(crate) async fn next_document_number(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    table: &'static str,
    column: &'static str,
    date: NaiveDate,
) -> DbResult<String> {
    let sql = format!(
        "SELECT {column} FROM {table} WHERE {column} LIKE ?1 \
         ORDER BY length({column}) DESC, {column} DESC LIMIT 1"
    );

    let last: Option<String> = sqlx::query_scalar(&sql)
        .bind(kind.day_pattern(date))
        .fetch_optional(&mut *conn)
        .await?;

    let sequence = next_sequence(kind, date, last.as_deref());
    Ok(format_document_number(kind, date, sequence))
}

// =============================================================================
// Test Fixtures
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("sam"), "%sam%");
        assert_eq!(contains_pattern(" 50% off "), "%50\\% off%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_new_id_is_uuid() {
        assert!(Uuid::parse_str(&new_id()).is_ok());
    }
}
