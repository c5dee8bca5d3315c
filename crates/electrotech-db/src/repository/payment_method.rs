//! # Payment Method Repository
//!
//! Database operations for the ways a sale can be paid.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use electrotech_core::PaymentMethod;

const COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";

/// Repository for payment method database operations.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    /// Creates a new PaymentMethodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    pub async fn insert(&self, method: &PaymentMethod) -> DbResult<()> {
        debug!(id = %method.id, name = %method.name, "Inserting payment method");

        sqlx::query(
            r#"
            INSERT INTO payment_methods (id, name, description, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(&method.description)
        .bind(method.is_active)
        .bind(method.created_at)
        .bind(method.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, method: &PaymentMethod) -> DbResult<()> {
        debug!(id = %method.id, "Updating payment method");

        let result = sqlx::query(
            "UPDATE payment_methods SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(&method.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", &method.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let sql = format!("SELECT {COLUMNS} FROM payment_methods WHERE id = ?1");
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(method)
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<PaymentMethod>> {
        let sql = format!("SELECT {COLUMNS} FROM payment_methods WHERE name = ?1");
        let method = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(method)
    }

    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<PaymentMethod>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM payment_methods WHERE (?1 OR is_active = 1) ORDER BY name"
        );
        let methods = sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(methods)
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_methods WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Activates or soft-deletes a payment method.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting payment method active flag");

        let result = sqlx::query(
            "UPDATE payment_methods SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{insert_payment_method, test_db};

    #[tokio::test]
    async fn test_lookup_and_count() {
        let db = test_db().await;
        let cash = insert_payment_method(&db, "Cash").await;
        let card = insert_payment_method(&db, "Credit Card").await;

        let found = db.payment_methods().get_by_name("cash").await.unwrap().unwrap();
        assert_eq!(found.id, cash.id);
        assert_eq!(db.payment_methods().count_active().await.unwrap(), 2);

        db.payment_methods().set_active(&card.id, false).await.unwrap();
        assert_eq!(db.payment_methods().count_active().await.unwrap(), 1);

        let names: Vec<String> = db
            .payment_methods()
            .list(true)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Cash", "Credit Card"]);
    }

    #[tokio::test]
    async fn test_update_description() {
        let db = test_db().await;
        let mut transfer = insert_payment_method(&db, "Bank Transfer").await;

        transfer.description = Some("SPEI / wire".to_string());
        db.payment_methods().update(&transfer).await.unwrap();

        let stored = db.payment_methods().get_by_id(&transfer.id).await.unwrap().unwrap();
        assert_eq!(stored.description.as_deref(), Some("SPEI / wire"));
    }
}
