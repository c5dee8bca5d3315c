//! # Supplier Repository
//!
//! Database operations for suppliers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use electrotech_core::Supplier;

const COLUMNS: &str = "id, tax_id, company_name, contact_name, email, phone, address, \
                       is_active, created_at, updated_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a new supplier.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - tax id already registered
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, tax_id = %supplier.tax_id, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, tax_id, company_name, contact_name, email, phone, address,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.tax_id)
        .bind(&supplier.company_name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates every editable field.
    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                tax_id = ?2,
                company_name = ?3,
                contact_name = ?4,
                email = ?5,
                phone = ?6,
                address = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.tax_id)
        .bind(&supplier.company_name)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {COLUMNS} FROM suppliers WHERE id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn get_by_tax_id(&self, tax_id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {COLUMNS} FROM suppliers WHERE tax_id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(tax_id.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Lists suppliers ordered by company name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM suppliers WHERE (?1 OR is_active = 1) ORDER BY company_name"
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Substring search over company name, contact name and tax id.
    /// Only active suppliers are returned.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Supplier>> {
        debug!(query = %query, limit = limit, "Searching suppliers");

        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM suppliers
            WHERE is_active = 1
              AND (company_name LIKE ?1 ESCAPE '\'
                   OR contact_name LIKE ?1 ESCAPE '\'
                   OR tax_id LIKE ?1 ESCAPE '\')
            ORDER BY company_name
            LIMIT ?2
            "#
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(contains_pattern(query))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    /// Activates or soft-deletes a supplier.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting supplier active flag");

        let result =
            sqlx::query("UPDATE suppliers SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{insert_supplier, test_db};
    use crate::DbError;

    #[tokio::test]
    async fn test_get_by_tax_id() {
        let db = test_db().await;
        let supplier = insert_supplier(&db, "TAX-10001", "Distribuidora Norte").await;

        let found = db.suppliers().get_by_tax_id("TAX-10001").await.unwrap().unwrap();
        assert_eq!(found.id, supplier.id);
        assert!(db.suppliers().get_by_tax_id("TAX-00000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_tax_id() {
        let db = test_db().await;
        let first = insert_supplier(&db, "TAX-10001", "Distribuidora Norte").await;

        let mut dup = first.clone();
        dup.id = crate::repository::new_id();

        let err = db.suppliers().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_matches_company_and_contact() {
        let db = test_db().await;
        insert_supplier(&db, "TAX-10001", "Distribuidora Norte").await;
        insert_supplier(&db, "TAX-10002", "Importadora Sur").await;

        assert_eq!(db.suppliers().search("norte", 10).await.unwrap().len(), 1);
        // Both fixtures share a contact name
        assert_eq!(db.suppliers().search("Méndez", 10).await.unwrap().len(), 2);
        assert_eq!(db.suppliers().search("10002", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = test_db().await;
        let mut supplier = insert_supplier(&db, "TAX-10001", "Distribuidora Norte").await;

        supplier.phone = Some("555-123-4567".to_string());
        db.suppliers().update(&supplier).await.unwrap();
        db.suppliers().set_active(&supplier.id, false).await.unwrap();

        let stored = db.suppliers().get_by_id(&supplier.id).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("555-123-4567"));
        assert!(!stored.is_active);
        assert!(db.suppliers().search("norte", 10).await.unwrap().is_empty());
    }
}
