//! # Return Repository
//!
//! Database operations for goods returned from completed sales.
//!
//! ```text
//! create(record)  ── one transaction ──────────────────────────────────
//!   ├── sale must be completed
//!   ├── returned so far + quantity ≤ sold on that sale
//!   ├── next return number   RET-YYYYMMDD-NNNN
//!   ├── INSERT returns
//!   └── UPDATE products      stock = stock + quantity
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{new_id, next_document_number};
use crate::error::{DbError, DbResult};
use electrotech_core::{DocumentKind, Return, SaleStatus};

const COLUMNS: &str = "id, return_number, sale_id, product_id, employee_id, quantity, \
                       refund_cents, reason, return_date, created_at";

/// A return about to be stored. The refund is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewReturnRecord {
    pub sale_id: String,
    pub product_id: String,
    pub employee_id: String,
    pub quantity: i64,
    pub refund_cents: i64,
    pub reason: String,
}

/// Repository for return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Stores a return and puts the units back in stock.
    ///
    /// The sale status and returnable quantity are re-checked inside the
    /// transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such sale, or product not on it
    /// * `Err(DbError::StatusConflict)` - the sale is cancelled
    /// * `Err(DbError::ReturnExceedsSold)` - more units than remain returnable
    pub async fn create(&self, record: &NewReturnRecord) -> DbResult<Return> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let status: Option<SaleStatus> =
            sqlx::query_scalar("SELECT status FROM sales WHERE id = ?1")
                .bind(&record.sale_id)
                .fetch_optional(&mut *tx)
                .await?;

        match status {
            None => return Err(DbError::not_found("Sale", &record.sale_id)),
            Some(SaleStatus::Cancelled) => {
                return Err(DbError::status_conflict(
                    "Sale",
                    &record.sale_id,
                    SaleStatus::Cancelled.as_str(),
                ))
            }
            Some(SaleStatus::Completed) => {}
        }

        let sold: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM sale_details WHERE sale_id = ?1 AND product_id = ?2",
        )
        .bind(&record.sale_id)
        .bind(&record.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(sold) = sold else {
            return Err(DbError::not_found("Sale line", &record.product_id));
        };

        let returned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM returns WHERE sale_id = ?1 AND product_id = ?2",
        )
        .bind(&record.sale_id)
        .bind(&record.product_id)
        .fetch_one(&mut *tx)
        .await?;

        let returnable = sold - returned;
        if record.quantity > returnable {
            return Err(DbError::ReturnExceedsSold {
                product_id: record.product_id.clone(),
                returnable,
                requested: record.quantity,
            });
        }

        let return_number = next_document_number(
            &mut tx,
            DocumentKind::Return,
            "returns",
            "return_number",
            now.date_naive(),
        )
        .await?;

        let stored = Return {
            id: new_id(),
            return_number,
            sale_id: record.sale_id.clone(),
            product_id: record.product_id.clone(),
            employee_id: record.employee_id.clone(),
            quantity: record.quantity,
            refund_cents: record.refund_cents,
            reason: record.reason.clone(),
            return_date: now,
            created_at: now,
        };

        debug!(id = %stored.id, return_number = %stored.return_number, sale_id = %stored.sale_id, "Creating return");

        sqlx::query(
            r#"
            INSERT INTO returns (
                id, return_number, sale_id, product_id, employee_id,
                quantity, refund_cents, reason, return_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.return_number)
        .bind(&stored.sale_id)
        .bind(&stored.product_id)
        .bind(&stored.employee_id)
        .bind(stored.quantity)
        .bind(stored.refund_cents)
        .bind(&stored.reason)
        .bind(stored.return_date)
        .bind(stored.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&stored.product_id)
            .bind(stored.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(stored)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Return>> {
        let sql = format!("SELECT {COLUMNS} FROM returns WHERE id = ?1");
        let found = sqlx::query_as::<_, Return>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    /// Returns recorded against a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Return>> {
        let sql = format!("SELECT {COLUMNS} FROM returns WHERE sale_id = ?1 ORDER BY return_date");
        let returns = sqlx::query_as::<_, Return>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(returns)
    }

    /// Total refunded with `from <= return_date < to`.
    pub async fn refund_total_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(refund_cents), 0) FROM returns \
             WHERE return_date >= ?1 AND return_date < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::repository::test_support::{
        insert_category, insert_employee, insert_payment_method, insert_product, test_db,
    };
    use crate::{Database, NewSaleLine, NewSaleRecord};
    use electrotech_core::{Product, Sale};

    struct Fixture {
        db: Database,
        employee_id: String,
        headphones: Product,
        sale: Sale,
    }

    /// Sells 3 headphones out of 10.
    async fn fixture() -> Fixture {
        let db = test_db().await;
        let audio = insert_category(&db, "Audio").await;
        let employee = insert_employee(&db, "EMP-0001").await;
        let cash = insert_payment_method(&db, "Cash").await;
        let headphones = insert_product(&db, "HP-01", &audio.id, 10, 5_000).await;

        let sale = db
            .sales()
            .create(&NewSaleRecord {
                client_id: None,
                employee_id: employee.id.clone(),
                payment_method_id: cash.id,
                subtotal_cents: 15_000,
                discount_cents: 0,
                tax_cents: 2_400,
                total_cents: 17_400,
                notes: None,
                lines: vec![NewSaleLine {
                    product_id: headphones.id.clone(),
                    code_snapshot: headphones.code.clone(),
                    name_snapshot: headphones.name.clone(),
                    quantity: 3,
                    unit_price_cents: 5_000,
                }],
            })
            .await
            .unwrap();

        Fixture {
            db,
            employee_id: employee.id,
            headphones,
            sale,
        }
    }

    fn record(f: &Fixture, quantity: i64) -> NewReturnRecord {
        NewReturnRecord {
            sale_id: f.sale.id.clone(),
            product_id: f.headphones.id.clone(),
            employee_id: f.employee_id.clone(),
            quantity,
            refund_cents: 5_800 * quantity,
            reason: "Left earcup crackles".to_string(),
        }
    }

    async fn stock(f: &Fixture) -> i64 {
        f.db.products()
            .get_by_id(&f.headphones.id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_create_restocks_and_numbers() {
        let f = fixture().await;
        assert_eq!(stock(&f).await, 7);

        let ret = f.db.returns().create(&record(&f, 2)).await.unwrap();

        let today = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(ret.return_number, format!("RET-{today}-0001"));
        assert_eq!(stock(&f).await, 9);
        assert_eq!(
            f.db.sales()
                .returned_quantity(&f.sale.id, &f.headphones.id)
                .await
                .unwrap(),
            2
        );

        let listed = f.db.returns().list_for_sale(&f.sale.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ret.id);
    }

    #[tokio::test]
    async fn test_cannot_return_more_than_sold() {
        let f = fixture().await;
        f.db.returns().create(&record(&f, 2)).await.unwrap();

        let err = f.db.returns().create(&record(&f, 2)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::ReturnExceedsSold {
                returnable: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(stock(&f).await, 9);

        f.db.returns().create(&record(&f, 1)).await.unwrap();
        assert_eq!(stock(&f).await, 10);
    }

    #[tokio::test]
    async fn test_cancelled_sale_rejects_returns() {
        let f = fixture().await;
        f.db.sales().cancel(&f.sale.id).await.unwrap();

        let err = f.db.returns().create(&record(&f, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { .. }));
    }

    #[tokio::test]
    async fn test_cancel_after_partial_return_restocks_remainder() {
        let f = fixture().await;
        f.db.returns().create(&record(&f, 1)).await.unwrap();
        assert_eq!(stock(&f).await, 8);

        f.db.sales().cancel(&f.sale.id).await.unwrap();
        assert_eq!(stock(&f).await, 10);
    }

    #[tokio::test]
    async fn test_refund_total_between() {
        let f = fixture().await;
        f.db.returns().create(&record(&f, 1)).await.unwrap();
        f.db.returns().create(&record(&f, 2)).await.unwrap();

        let now = Utc::now();
        let total = f
            .db
            .returns()
            .refund_total_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(total, 5_800 * 3);
    }

    #[tokio::test]
    async fn test_product_not_on_sale() {
        let f = fixture().await;
        let mut rec = record(&f, 1);
        rec.product_id = "not-on-sale".to_string();

        let err = f.db.returns().create(&rec).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
