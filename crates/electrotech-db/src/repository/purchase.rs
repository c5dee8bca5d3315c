//! # Purchase Repository
//!
//! Database operations for purchase orders.
//!
//! Purchases are received on registration: the same transaction that stores
//! the order adds its units to stock and records the latest unit cost as the
//! product's purchase price. Cancelling takes the units back out, which fails
//! if they've been sold in the meantime, and puts the purchase price back to
//! the unit cost of the newest purchase still received.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{new_id, next_document_number};
use crate::error::{DbError, DbResult};
use electrotech_core::{DocumentKind, Purchase, PurchaseDetail, PurchaseStatus};

const COLUMNS: &str = "id, order_number, supplier_id, employee_id, subtotal_cents, tax_cents, \
                       total_cents, status, notes, purchase_date, created_at, updated_at";

/// One line of a purchase about to be stored.
#[derive(Debug, Clone)]
pub struct NewPurchaseLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

impl NewPurchaseLine {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_cost_cents * self.quantity
    }
}

/// A fully priced purchase order. Totals are computed by the caller.
#[derive(Debug, Clone)]
pub struct NewPurchaseRecord {
    pub supplier_id: String,
    pub employee_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub lines: Vec<NewPurchaseLine>,
}

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Stores a purchase order and receives its stock.
    pub async fn create(&self, record: &NewPurchaseRecord) -> DbResult<Purchase> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order_number = next_document_number(
            &mut tx,
            DocumentKind::PurchaseOrder,
            "purchases",
            "order_number",
            now.date_naive(),
        )
        .await?;

        let purchase = Purchase {
            id: new_id(),
            order_number,
            supplier_id: record.supplier_id.clone(),
            employee_id: record.employee_id.clone(),
            subtotal_cents: record.subtotal_cents,
            tax_cents: record.tax_cents,
            total_cents: record.total_cents,
            status: PurchaseStatus::Received,
            notes: record.notes.clone(),
            purchase_date: now,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %purchase.id, order_number = %purchase.order_number, lines = record.lines.len(), "Creating purchase");

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, order_number, supplier_id, employee_id,
                subtotal_cents, tax_cents, total_cents,
                status, notes, purchase_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.order_number)
        .bind(&purchase.supplier_id)
        .bind(&purchase.employee_id)
        .bind(purchase.subtotal_cents)
        .bind(purchase.tax_cents)
        .bind(purchase.total_cents)
        .bind(purchase.status)
        .bind(&purchase.notes)
        .bind(purchase.purchase_date)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &record.lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_details (
                    id, purchase_id, product_id, quantity, unit_cost_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(new_id())
            .bind(&purchase.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .bind(line.line_total_cents())
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + ?2,
                    purchase_price_cents = ?3,
                    updated_at = ?4
                WHERE id = ?1
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", &line.product_id));
            }
        }

        tx.commit().await?;

        debug!(id = %purchase.id, total = purchase.total_cents, "Purchase stored");
        Ok(purchase)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let sql = format!("SELECT {COLUMNS} FROM purchases WHERE id = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(purchase)
    }

    pub async fn get_by_order_number(&self, order_number: &str) -> DbResult<Option<Purchase>> {
        let sql = format!("SELECT {COLUMNS} FROM purchases WHERE order_number = ?1");
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(order_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(purchase)
    }

    pub async fn get_details(&self, purchase_id: &str) -> DbResult<Vec<PurchaseDetail>> {
        let details = sqlx::query_as::<_, PurchaseDetail>(
            r#"
            SELECT id, purchase_id, product_id, quantity, unit_cost_cents, line_total_cents
            FROM purchase_details
            WHERE purchase_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Purchases (any status) with `from <= purchase_date < to`, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Purchase>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM purchases WHERE purchase_date >= ?1 AND purchase_date < ?2 \
             ORDER BY purchase_date DESC"
        );
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    /// Cancels a received purchase and removes its units from stock.
    ///
    /// Each product's purchase price goes back to its cost on the newest
    /// received purchase. With none left, the price is kept.
    ///
    /// ## Returns
    /// * `Err(DbError::StatusConflict)` - already cancelled
    /// * `Err(DbError::StockConflict)` - some units were sold since; nothing
    ///   was changed
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Cancelling purchase");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let status: Option<PurchaseStatus> =
            sqlx::query_scalar("SELECT status FROM purchases WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match status {
            None => return Err(DbError::not_found("Purchase", id)),
            Some(PurchaseStatus::Cancelled) => {
                return Err(DbError::status_conflict(
                    "Purchase",
                    id,
                    PurchaseStatus::Cancelled.as_str(),
                ))
            }
            Some(PurchaseStatus::Received) => {}
        }

        sqlx::query("UPDATE purchases SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(PurchaseStatus::Cancelled)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let lines: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_id, quantity FROM purchase_details WHERE purchase_id = ?1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in lines {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::StockConflict {
                    product_id,
                    requested: quantity,
                });
            }

            // This purchase is already marked cancelled, so it can't match.
            sqlx::query(
                r#"
                UPDATE products
                SET purchase_price_cents = COALESCE(
                    (SELECT d.unit_cost_cents
                     FROM purchase_details d
                     JOIN purchases p ON p.id = d.purchase_id
                     WHERE d.product_id = ?1
                       AND p.status = 'received'
                       AND d.unit_cost_cents <= products.sale_price_cents
                     ORDER BY p.purchase_date DESC,
                              length(p.order_number) DESC, p.order_number DESC
                     LIMIT 1),
                    purchase_price_cents)
                WHERE id = ?1
                "#,
            )
            .bind(&product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
