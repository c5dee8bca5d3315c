//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Full-text search using FTS5
//! - CRUD operations
//! - Stock corrections (delta updates)
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "dell lat"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Tokens quoted + prefixed: "dell"* "lat"*                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────┐                   │
//! │  │ products_fts (code, name, description)          │                   │
//! │  │                                                 │                   │
//! │  │ LAP-DELL-14 | Dell Latitude 14   | ...          │ ← MATCH!          │
//! │  │ LAP-DELL-15 | Dell Latitude 15   | ...          │ ← MATCH!          │
//! │  │ LAP-HP-14   | HP ProBook 440     | ...          │                   │
//! │  └─────────────────────────────────────────────────┘                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Joined back to products by rowid, active only, ordered by rank        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use electrotech_core::Product;

const COLUMNS: &str = "id, code, name, description, category_id, supplier_id, \
                       purchase_price_cents, sale_price_cents, stock, min_stock, \
                       is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("laptop", 20).await?;
/// let product = repo.get_by_code("LAP-DELL-15").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products using full-text search.
    ///
    /// ## How It Works
    /// 1. Each whitespace-separated token is quoted and prefix-matched
    /// 2. Tokens are ANDed across code, name and description
    /// 3. Results are ordered by relevance
    ///
    /// An empty query lists active products by name instead.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = limit, "Searching products");

        let Some(fts_query) = fts_match_expression(query) else {
            return self.list(false, limit).await;
        };

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                p.id,
                p.code,
                p.name,
                p.description,
                p.category_id,
                p.supplier_id,
                p.purchase_price_cents,
                p.sale_price_cents,
                p.stock,
                p.min_stock,
                p.is_active,
                p.created_at,
                p.updated_at
            FROM products p
            INNER JOIN products_fts fts ON p.rowid = fts.rowid
            WHERE products_fts MATCH ?1
              AND p.is_active = 1
            ORDER BY rank
            LIMIT ?2
            "#,
        )
        .bind(fts_query)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists products sorted by name.
    pub async fn list(&self, include_inactive: bool, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products WHERE (?1 OR is_active = 1) ORDER BY name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(include_inactive)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists the active products of a category.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products WHERE category_id = ?1 AND is_active = 1 ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Active products at or below their reorder threshold, emptiest first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE is_active = 1 AND stock <= min_stock \
             ORDER BY stock, name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its code (e.g. "LAP-DELL-15").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE code = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category or supplier
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, category_id, supplier_id,
                purchase_price_cents, sale_price_cents, stock, min_stock,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's catalogue fields.
    ///
    /// Stock is not touched here; it only moves through documents and
    /// [`ProductRepository::adjust_stock`].
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                category_id = ?5,
                supplier_id = ?6,
                purchase_price_cents = ?7,
                sale_price_cents = ?8,
                min_stock = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a stock delta and returns the new stock level.
    ///
    /// ## Delta Pattern
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ❌ WRONG: Absolute update (loses concurrent changes)              │
    /// │     UPDATE products SET stock = 7 WHERE id = ?                     │
    /// │                                                                     │
    /// │  ✅ CORRECT: Delta update                                          │
    /// │     UPDATE products SET stock = stock - 3 WHERE id = ?             │
    /// │                                                                     │
    /// │  Register A sells 3 → stock - 3                                    │
    /// │  Register B sells 2 → stock - 2                                    │
    /// │  Both land: -5 total                                               │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Returns
    /// * `Err(DbError::CheckViolation)` - the delta would make stock negative
    /// * `Err(DbError::NotFound)` - no such product
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = delta, "Adjusting stock");

        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Activates or soft-deletes a product.
    ///
    /// Historical sales keep referencing soft-deleted products.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting product active flag");

        let result =
            sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Turns free text into an FTS5 MATCH expression: every token quoted (so
/// `-`, `:` and `*` typed by users aren't FTS syntax) with a prefix star.
///
/// Returns `None` when nothing searchable is left.
fn fts_match_expression(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|token| token.replace('"', ""))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\"*"))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_category, insert_product, product, test_db};

    #[test]
    fn test_fts_match_expression() {
        assert_eq!(fts_match_expression("dell"), Some("\"dell\"*".to_string()));
        assert_eq!(
            fts_match_expression("  dell  lat "),
            Some("\"dell\"* \"lat\"*".to_string())
        );
        assert_eq!(
            fts_match_expression("say \"hi\""),
            Some("\"say\"* \"hi\"*".to_string())
        );
        assert_eq!(fts_match_expression("   "), None);
        assert_eq!(fts_match_expression("\"\""), None);
    }

    #[tokio::test]
    async fn test_search_by_name_prefix_and_code() {
        let db = test_db().await;
        let laptops = insert_category(&db, "Laptops").await;

        let mut dell = product("LAP-DELL-15", &laptops.id, 5, 129_900);
        dell.name = "Dell Latitude 15".to_string();
        db.products().insert(&dell).await.unwrap();

        let mut hp = product("LAP-HP-14", &laptops.id, 5, 99_900);
        hp.name = "HP ProBook 440".to_string();
        db.products().insert(&hp).await.unwrap();

        let results = db.products().search("lati", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "LAP-DELL-15");

        let results = db.products().search("LAP-HP", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, hp.id);

        // FTS syntax characters are treated as text
        assert!(db.products().search("dell:*", 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_search_follows_renames() {
        let db = test_db().await;
        let phones = insert_category(&db, "Phones").await;
        let mut phone = insert_product(&db, "PH-001", &phones.id, 3, 59_900).await;

        phone.name = "Galaxy S24".to_string();
        db.products().update(&phone).await.unwrap();

        assert_eq!(db.products().search("galaxy", 10).await.unwrap().len(), 1);
        assert!(db.products().search("\"Product PH\"", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_lists_active() {
        let db = test_db().await;
        let audio = insert_category(&db, "Audio").await;
        insert_product(&db, "HP-01", &audio.id, 5, 4_999).await;
        let old = insert_product(&db, "HP-02", &audio.id, 5, 2_999).await;
        db.products().set_active(&old.id, false).await.unwrap();

        assert_eq!(db.products().search("", 10).await.unwrap().len(), 1);
        assert_eq!(db.products().list(true, 10).await.unwrap().len(), 2);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = test_db().await;
        let audio = insert_category(&db, "Audio").await;
        let p = insert_product(&db, "HP-01", &audio.id, 5, 4_999).await;

        assert_eq!(db.products().adjust_stock(&p.id, 3).await.unwrap(), 8);
        assert_eq!(db.products().adjust_stock(&p.id, -8).await.unwrap(), 0);

        let err = db.products().adjust_stock(&p.id, -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));

        let err = db.products().adjust_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_and_category_listing() {
        let db = test_db().await;
        let tvs = insert_category(&db, "TVs").await;
        let audio = insert_category(&db, "Audio").await;

        // Fixture min_stock is 2
        insert_product(&db, "TV-01", &tvs.id, 1, 450_000).await;
        insert_product(&db, "TV-02", &tvs.id, 2, 550_000).await;
        insert_product(&db, "SPK-01", &audio.id, 10, 8_999).await;

        let low = db.products().list_low_stock().await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].code, "TV-01");

        assert_eq!(db.products().list_by_category(&tvs.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let db = test_db().await;
        let orphan = product("ORPHAN-1", "no-such-category", 1, 100);

        let err = db.products().insert(&orphan).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
