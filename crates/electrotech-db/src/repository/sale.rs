//! # Sale Repository
//!
//! Database operations for sales and sale details.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     ├── next invoice number   INV-YYYYMMDD-NNNN                        │
//! │     ├── INSERT sales          status = completed                       │
//! │     ├── INSERT sale_details   code/name/price snapshots                │
//! │     └── UPDATE products       stock = stock - qty  (guarded)           │
//! │                                                                         │
//! │  2. (OPTIONAL) RETURNS        see returns.rs                           │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL (one transaction)                                │
//! │     ├── completed → cancelled                                          │
//! │     └── stock += sold - already returned, per line                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure inside a transaction drops it, which rolls everything back:
//! a sale is never stored without its stock movement.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{new_id, next_document_number};
use crate::error::{DbError, DbResult};
use electrotech_core::{DocumentKind, ProductSales, Sale, SaleDetail, SaleStatus, SalesSummary};

const COLUMNS: &str = "id, invoice_number, client_id, employee_id, payment_method_id, \
                       subtotal_cents, discount_cents, tax_cents, total_cents, status, notes, \
                       sale_date, created_at, updated_at";

/// One priced line of a sale about to be stored.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub product_id: String,
    pub code_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewSaleLine {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// A fully priced sale. Totals are computed by the caller.
#[derive(Debug, Clone)]
pub struct NewSaleRecord {
    pub client_id: Option<String>,
    pub employee_id: String,
    pub payment_method_id: String,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub lines: Vec<NewSaleLine>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Stores a sale, its lines and the stock it consumes.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - the stored header with its invoice number
    /// * `Err(DbError::StockConflict)` - a product no longer has enough stock;
    ///   nothing was written
    pub async fn create(&self, record: &NewSaleRecord) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let invoice_number = next_document_number(
            &mut tx,
            DocumentKind::Invoice,
            "sales",
            "invoice_number",
            now.date_naive(),
        )
        .await?;

        let sale = Sale {
            id: new_id(),
            invoice_number,
            client_id: record.client_id.clone(),
            employee_id: record.employee_id.clone(),
            payment_method_id: record.payment_method_id.clone(),
            subtotal_cents: record.subtotal_cents,
            discount_cents: record.discount_cents,
            tax_cents: record.tax_cents,
            total_cents: record.total_cents,
            status: SaleStatus::Completed,
            notes: record.notes.clone(),
            sale_date: now,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %sale.id, invoice_number = %sale.invoice_number, lines = record.lines.len(), "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, invoice_number, client_id, employee_id, payment_method_id,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                status, notes, sale_date, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.invoice_number)
        .bind(&sale.client_id)
        .bind(&sale.employee_id)
        .bind(&sale.payment_method_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for line in &record.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_details (
                    id, sale_id, product_id, code_snapshot, name_snapshot,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.code_snapshot)
            .bind(&line.name_snapshot)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents())
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                debug!(product_id = %line.product_id, quantity = line.quantity, "Stock check failed, rolling back sale");
                return Err(DbError::StockConflict {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                });
            }
        }

        tx.commit().await?;

        debug!(id = %sale.id, total = sale.total_cents, "Sale stored");
        Ok(sale)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub async fn get_by_invoice(&self, invoice_number: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {COLUMNS} FROM sales WHERE invoice_number = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all lines of a sale, in the order they were entered.
    pub async fn get_details(&self, sale_id: &str) -> DbResult<Vec<SaleDetail>> {
        let details = sqlx::query_as::<_, SaleDetail>(
            r#"
            SELECT
                id,
                sale_id,
                product_id,
                code_snapshot,
                name_snapshot,
                quantity,
                unit_price_cents,
                line_total_cents
            FROM sale_details
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Sales (any status) with `from <= sale_date < to`, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM sales WHERE sale_date >= ?1 AND sale_date < ?2 \
             ORDER BY sale_date DESC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Cancels a completed sale and puts its unreturned units back on the shelf.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such sale
    /// * `Err(DbError::StatusConflict)` - sale already cancelled
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Cancelling sale");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let status: Option<SaleStatus> = sqlx::query_scalar("SELECT status FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        match status {
            None => return Err(DbError::not_found("Sale", id)),
            Some(SaleStatus::Cancelled) => {
                return Err(DbError::status_conflict("Sale", id, SaleStatus::Cancelled.as_str()))
            }
            Some(SaleStatus::Completed) => {}
        }

        sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(SaleStatus::Cancelled)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let restock: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT
                d.product_id,
                d.quantity - COALESCE(
                    (SELECT SUM(r.quantity) FROM returns r
                     WHERE r.sale_id = d.sale_id AND r.product_id = d.product_id),
                    0
                ) AS restock
            FROM sale_details d
            WHERE d.sale_id = ?1
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in restock.into_iter().filter(|(_, q)| *q > 0) {
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&product_id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Units of `product_id` already returned from `sale_id`.
    pub async fn returned_quantity(&self, sale_id: &str, product_id: &str) -> DbResult<i64> {
        let returned: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM returns WHERE sale_id = ?1 AND product_id = ?2",
        )
        .bind(sale_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(returned)
    }

    /// Totals of completed sales with `from <= sale_date < to`.
    pub async fn summary_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COUNT(*) AS sale_count,
                COALESCE(SUM(subtotal_cents), 0) AS subtotal_cents,
                COALESCE(SUM(discount_cents), 0) AS discount_cents,
                COALESCE(SUM(tax_cents), 0) AS tax_cents,
                COALESCE(SUM(total_cents), 0) AS total_cents
            FROM sales
            WHERE status = 'completed'
              AND sale_date >= ?1 AND sale_date < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Best sellers by units over completed sales in the period.
    pub async fn top_products(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                d.product_id AS product_id,
                p.code AS code,
                p.name AS name,
                SUM(d.quantity) AS units_sold,
                SUM(d.line_total_cents) AS revenue_cents
            FROM sale_details d
            INNER JOIN sales s ON s.id = d.sale_id
            INNER JOIN products p ON p.id = d.product_id
            WHERE s.status = 'completed'
              AND s.sale_date >= ?1 AND s.sale_date < ?2
            GROUP BY d.product_id, p.code, p.name
            ORDER BY units_sold DESC, revenue_cents DESC
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::repository::test_support::{
        insert_category, insert_employee, insert_payment_method, insert_product, test_db,
    };
    use crate::Database;
    use electrotech_core::Product;

    struct Fixture {
        db: Database,
        employee_id: String,
        cash_id: String,
        laptop: Product,
        mouse: Product,
    }

    async fn fixture() -> Fixture {
        let db = test_db().await;
        let computers = insert_category(&db, "Computers").await;
        let employee = insert_employee(&db, "EMP-0001").await;
        let cash = insert_payment_method(&db, "Cash").await;
        let laptop = insert_product(&db, "LAP-001", &computers.id, 5, 100_000).await;
        let mouse = insert_product(&db, "MOU-001", &computers.id, 10, 2_500).await;

        Fixture {
            db,
            employee_id: employee.id,
            cash_id: cash.id,
            laptop,
            mouse,
        }
    }

    fn line(product: &Product, quantity: i64) -> NewSaleLine {
        NewSaleLine {
            product_id: product.id.clone(),
            code_snapshot: product.code.clone(),
            name_snapshot: product.name.clone(),
            quantity,
            unit_price_cents: product.sale_price_cents,
        }
    }

    fn record(f: &Fixture, lines: Vec<NewSaleLine>) -> NewSaleRecord {
        let subtotal: i64 = lines.iter().map(NewSaleLine::line_total_cents).sum();
        let tax = subtotal * 16 / 100;
        NewSaleRecord {
            client_id: None,
            employee_id: f.employee_id.clone(),
            payment_method_id: f.cash_id.clone(),
            subtotal_cents: subtotal,
            discount_cents: 0,
            tax_cents: tax,
            total_cents: subtotal + tax,
            notes: None,
            lines,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_takes_stock_and_numbers_invoices() {
        let f = fixture().await;

        let first = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.laptop, 2), line(&f.mouse, 3)]))
            .await
            .unwrap();
        let second = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 1)]))
            .await
            .unwrap();

        let today = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(first.invoice_number, format!("INV-{today}-0001"));
        assert_eq!(second.invoice_number, format!("INV-{today}-0002"));

        assert_eq!(stock_of(&f.db, &f.laptop.id).await, 3);
        assert_eq!(stock_of(&f.db, &f.mouse.id).await, 6);

        let details = f.db.sales().get_details(&first.id).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].code_snapshot, "LAP-001");
        assert_eq!(details[0].line_total_cents, 200_000);

        let by_invoice = f
            .db
            .sales()
            .get_by_invoice(&first.invoice_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_invoice.id, first.id);
        assert_eq!(by_invoice.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_invoice_sequence_widens_past_9999() {
        let f = fixture().await;
        let today = Utc::now().format("%Y%m%d").to_string();

        let sale = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 1)]))
            .await
            .unwrap();
        sqlx::query("UPDATE sales SET invoice_number = ?1 WHERE id = ?2")
            .bind(format!("INV-{today}-9999"))
            .bind(&sale.id)
            .execute(f.db.pool())
            .await
            .unwrap();

        let next = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 1)]))
            .await
            .unwrap();
        assert_eq!(next.invoice_number, format!("INV-{today}-10000"));

        // "INV-...-9999" sorts after "INV-...-10000" as text
        let after = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 1)]))
            .await
            .unwrap();
        assert_eq!(after.invoice_number, format!("INV-{today}-10001"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let f = fixture().await;

        // First line is fine, second isn't
        let err = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 2), line(&f.laptop, 6)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::StockConflict { requested: 6, .. }));
        assert_eq!(stock_of(&f.db, &f.mouse.id).await, 10);
        assert_eq!(stock_of(&f.db, &f.laptop.id).await, 5);

        let now = Utc::now();
        let sales = f
            .db
            .sales()
            .list_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert!(sales.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let f = fixture().await;
        let sale = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.laptop, 2)]))
            .await
            .unwrap();

        f.db.sales().cancel(&sale.id).await.unwrap();
        assert_eq!(stock_of(&f.db, &f.laptop.id).await, 5);

        let err = f.db.sales().cancel(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::StatusConflict { .. }));
        assert_eq!(stock_of(&f.db, &f.laptop.id).await, 5);

        let err = f.db.sales().cancel("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_summary_and_top_products_skip_cancelled() {
        let f = fixture().await;
        let kept = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.mouse, 4)]))
            .await
            .unwrap();
        f.db.sales()
            .create(&record(&f, vec![line(&f.laptop, 1)]))
            .await
            .unwrap();
        let cancelled = f
            .db
            .sales()
            .create(&record(&f, vec![line(&f.laptop, 3)]))
            .await
            .unwrap();
        f.db.sales().cancel(&cancelled.id).await.unwrap();

        let now = Utc::now();
        let (from, to) = (now - Duration::hours(1), now + Duration::hours(1));

        let summary = f.db.sales().summary_between(from, to).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.subtotal_cents, 10_000 + 100_000);
        assert_eq!(summary.total_cents, kept.total_cents + 116_000);

        let top = f.db.sales().top_products(from, to, 10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "MOU-001");
        assert_eq!(top[0].units_sold, 4);
        assert_eq!(top[1].units_sold, 1);

        let empty = f
            .db
            .sales()
            .summary_between(now + Duration::days(1), now + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(empty, SalesSummary::default());
    }
}
