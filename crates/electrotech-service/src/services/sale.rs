//! # Sale Service
//!
//! Registers invoiced sales and cancels them.
//!
//! ## Register Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSale { client?, employee, payment method, discount, lines[] }       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  1. Lines: 1..=100, no repeated product, quantity 1..=999               │
//! │  2. References: client (if any), employee, payment method all active    │
//! │  3. Per line: product active, stock ≥ quantity, price from catalogue    │
//! │  4. Totals:                                                             │
//! │       subtotal = Σ unit price × quantity                                │
//! │       taxable  = subtotal − discount      (0 ≤ discount ≤ subtotal)     │
//! │       tax      = taxable × rate           (half away from zero)         │
//! │       total    = taxable + tax                                          │
//! │  5. Repository: invoice number, rows, stock decrement (one transaction) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 3 gives a friendly error early. The repository re-checks stock inside
//! its transaction, so a concurrent sale still cannot oversell.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ensure_active, require, validate_period};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_amount_cents, validate_document_lines, validate_optional_text,
    validate_quantity, validate_unique_products,
};
use electrotech_core::{CoreError, Money, Return, Sale, SaleDetail, ValidationError};
use electrotech_db::{Database, NewSaleLine, NewSaleRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub product_id: String,
    pub quantity: i64,
}

/// A sale as entered at the register. Prices come from the catalogue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    /// `None` for walk-in customers.
    pub client_id: Option<String>,
    pub employee_id: String,
    pub payment_method_id: String,
    #[serde(default)]
    pub discount_cents: i64,
    pub notes: Option<String>,
    pub lines: Vec<SaleLineInput>,
}

/// A sale with its lines and any returns recorded against it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDocument {
    pub sale: Sale,
    pub details: Vec<SaleDetail>,
    pub returns: Vec<Return>,
}

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    config: Arc<AppConfig>,
}

impl SaleService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        SaleService { db, config }
    }

    /// Registers a sale and returns its id.
    pub async fn register(&self, input: NewSale) -> ServiceResult<String> {
        validate_document_lines("Sale", input.lines.len())?;
        validate_unique_products(input.lines.iter().map(|l| l.product_id.as_str()))?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }
        validate_amount_cents("discount", input.discount_cents)?;
        validate_optional_text("notes", input.notes.as_deref())?;

        let client_id = clean_optional(input.client_id.as_deref());
        if let Some(client_id) = client_id.as_deref() {
            let client = self.db.clients().get_by_id(client_id).await?;
            let client = require(client, "Client", client_id)?;
            ensure_active(client.is_active, "Client", client_id)?;
        }

        let employee = self.db.employees().get_by_id(&input.employee_id).await?;
        let employee = require(employee, "Employee", &input.employee_id)?;
        ensure_active(employee.is_active, "Employee", &employee.id)?;

        let method = self
            .db
            .payment_methods()
            .get_by_id(&input.payment_method_id)
            .await?;
        let method = require(method, "Payment method", &input.payment_method_id)?;
        ensure_active(method.is_active, "Payment method", &method.id)?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self.db.products().get_by_id(&line.product_id).await?;
            let product = require(product, "Product", &line.product_id)?;
            ensure_active(product.is_active, "Product", &product.id)?;

            if !product.can_sell(line.quantity) {
                warn!(code = %product.code, stock = product.stock, requested = line.quantity, "Insufficient stock");
                return Err(CoreError::InsufficientStock {
                    code: product.code,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            lines.push(NewSaleLine {
                product_id: product.id,
                code_snapshot: product.code,
                name_snapshot: product.name,
                quantity: line.quantity,
                unit_price_cents: product.sale_price_cents,
            });
        }

        let subtotal: Money = lines
            .iter()
            .map(|l| Money::from_cents(l.line_total_cents()))
            .sum();
        let discount = Money::from_cents(input.discount_cents);
        if discount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal.cents(),
            }
            .into());
        }

        let taxable = subtotal - discount;
        let tax = taxable.calculate_tax(self.config.tax_rate());
        let total = taxable + tax;

        let record = NewSaleRecord {
            client_id,
            employee_id: employee.id,
            payment_method_id: method.id,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            notes: clean_optional(input.notes.as_deref()),
            lines,
        };

        let sale = self.db.sales().create(&record).await?;

        info!(
            id = %sale.id,
            invoice = %sale.invoice_number,
            lines = record.lines.len(),
            total = %self.config.format_currency(sale.total_cents),
            "Sale registered"
        );
        Ok(sale.id)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<SaleDocument> {
        let sale = self.db.sales().get_by_id(id).await?;
        let sale = require(sale, "Sale", id)?;
        self.document(sale).await
    }

    pub async fn get_by_invoice(&self, invoice_number: &str) -> ServiceResult<SaleDocument> {
        let invoice_number = invoice_number.trim();
        let sale = self.db.sales().get_by_invoice(invoice_number).await?;
        let sale = require(sale, "Sale", invoice_number)?;
        self.document(sale).await
    }

    /// Sales of any status with `from <= sale_date < to`, newest first.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Sale>> {
        validate_period(from, to)?;
        Ok(self.db.sales().list_between(from, to).await?)
    }

    /// Voids a completed sale. Units not yet returned go back to stock.
    pub async fn cancel(&self, id: &str) -> ServiceResult<()> {
        self.db.sales().cancel(id).await?;

        info!(id = %id, "Sale cancelled");
        Ok(())
    }

    async fn document(&self, sale: Sale) -> ServiceResult<SaleDocument> {
        let details = self.db.sales().get_details(&sale.id).await?;
        let returns = self.db.returns().list_for_sale(&sale.id).await?;
        Ok(SaleDocument {
            sale,
            details,
            returns,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::test_support::{
        category, client, employee, payment_method, product, test_app,
    };
    use crate::services::ProductUpdate;
    use crate::{ElectroTech, ErrorCode};
    use electrotech_core::{SaleStatus, MAX_AMOUNT_CENTS};

    struct Shop {
        app: ElectroTech,
        employee: String,
        cash: String,
        laptop: String,
        mouse: String,
    }

    /// Laptop $1,000.00 × 5 in stock, mouse $299.00 × 40.
    async fn shop() -> Shop {
        let app = test_app().await;
        let laptops = category(&app, "Laptops").await;
        let accessories = category(&app, "Accessories").await;

        Shop {
            employee: employee(&app, "EMP-0001").await,
            cash: payment_method(&app, "Cash").await,
            laptop: product(&app, "LAP-01", &laptops, 5, 100_000).await,
            mouse: product(&app, "ACC-01", &accessories, 40, 29_900).await,
            app,
        }
    }

    fn sale(shop: &Shop, lines: &[(&str, i64)]) -> NewSale {
        NewSale {
            client_id: None,
            employee_id: shop.employee.clone(),
            payment_method_id: shop.cash.clone(),
            discount_cents: 0,
            notes: None,
            lines: lines
                .iter()
                .map(|(product_id, quantity)| SaleLineInput {
                    product_id: product_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    async fn stock(shop: &Shop, id: &str) -> i64 {
        shop.app.products().get(id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_register_computes_totals() {
        let shop = shop().await;
        let mut input = sale(&shop, &[(&shop.laptop, 1), (&shop.mouse, 2)]);
        input.discount_cents = 9_800;

        let id = shop.app.sales().register(input).await.unwrap();
        let doc = shop.app.sales().get(&id).await.unwrap();

        // 100_000 + 2 × 29_900 = 159_800; − 9_800 = 150_000; 16% = 24_000
        assert_eq!(doc.sale.subtotal_cents, 159_800);
        assert_eq!(doc.sale.discount_cents, 9_800);
        assert_eq!(doc.sale.tax_cents, 24_000);
        assert_eq!(doc.sale.total_cents, 174_000);
        assert_eq!(doc.sale.status, SaleStatus::Completed);
        assert!(doc.sale.client_id.is_none());
        assert_eq!(doc.details.len(), 2);
        assert!(doc.returns.is_empty());

        let today = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(doc.sale.invoice_number, format!("INV-{today}-0001"));

        assert_eq!(stock(&shop, &shop.laptop).await, 4);
        assert_eq!(stock(&shop, &shop.mouse).await, 38);

        let by_invoice = shop
            .app
            .sales()
            .get_by_invoice(&doc.sale.invoice_number)
            .await
            .unwrap();
        assert_eq!(by_invoice.sale.id, id);
    }

    #[tokio::test]
    async fn test_snapshots_keep_sold_price() {
        let shop = shop().await;
        let id = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 1)]))
            .await
            .unwrap();

        let mouse = shop.app.products().get(&shop.mouse).await.unwrap();
        shop.app
            .products()
            .update(
                &shop.mouse,
                ProductUpdate {
                    code: "ACC-01".to_string(),
                    name: "Wireless mouse".to_string(),
                    description: None,
                    category_id: mouse.category_id,
                    supplier_id: None,
                    purchase_price_cents: 20_000,
                    sale_price_cents: 34_900,
                    min_stock: 2,
                },
            )
            .await
            .unwrap();
        let detail = &shop.app.sales().get(&id).await.unwrap().details[0];
        assert_eq!(detail.code_snapshot, "ACC-01");
        assert_eq!(detail.unit_price_cents, 29_900);
        assert_eq!(detail.line_total_cents, 29_900);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let shop = shop().await;

        let err = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 2), (&shop.laptop, 6)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("LAP-01"));

        assert_eq!(stock(&shop, &shop.mouse).await, 40);
        let now = Utc::now();
        let listed = shop
            .app
            .sales()
            .list_between(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_line_rules() {
        let shop = shop().await;

        let err = shop.app.sales().register(sale(&shop, &[])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 1), (&shop.mouse, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        let err = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut too_generous = sale(&shop, &[(&shop.mouse, 1)]);
        too_generous.discount_cents = 30_000;
        let err = shop.app.sales().register(too_generous).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_references_must_be_active() {
        let shop = shop().await;
        let ana = client(&shop.app, "12345678").await;

        let mut input = sale(&shop, &[(&shop.mouse, 1)]);
        input.client_id = Some(ana.clone());
        shop.app.sales().register(input.clone()).await.unwrap();

        shop.app.clients().deactivate(&ana).await.unwrap();
        let err = shop.app.sales().register(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        shop.app.products().deactivate(&shop.laptop).await.unwrap();
        let err = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.laptop, 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let mut input = sale(&shop, &[(&shop.mouse, 1)]);
        input.payment_method_id = "missing".to_string();
        let err = shop.app.sales().register(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let shop = shop().await;
        let id = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.laptop, 2)]))
            .await
            .unwrap();
        assert_eq!(stock(&shop, &shop.laptop).await, 3);

        shop.app.sales().cancel(&id).await.unwrap();
        assert_eq!(stock(&shop, &shop.laptop).await, 5);
        assert_eq!(
            shop.app.sales().get(&id).await.unwrap().sale.status,
            SaleStatus::Cancelled
        );

        let err = shop.app.sales().cancel(&id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
        assert_eq!(stock(&shop, &shop.laptop).await, 5);
    }

    #[tokio::test]
    async fn test_invoice_numbers_increase() {
        let shop = shop().await;
        let first = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 1)]))
            .await
            .unwrap();
        let second = shop
            .app
            .sales()
            .register(sale(&shop, &[(&shop.mouse, 1)]))
            .await
            .unwrap();

        let first = shop.app.sales().get(&first).await.unwrap().sale.invoice_number;
        let second = shop.app.sales().get(&second).await.unwrap().sale.invoice_number;
        assert!(first.ends_with("-0001"));
        assert!(second.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_most_expensive_line_totals() {
        let shop = shop().await;
        let servers = category(&shop.app, "Servers").await;
        let rack = product(&shop.app, "SRV-01", &servers, 999, MAX_AMOUNT_CENTS).await;

        let id = shop
            .app
            .sales()
            .register(sale(&shop, &[(&rack, 999)]))
            .await
            .unwrap();

        let doc = shop.app.sales().get(&id).await.unwrap();
        assert_eq!(doc.sale.subtotal_cents, MAX_AMOUNT_CENTS * 999);
        assert_eq!(doc.sale.tax_cents, MAX_AMOUNT_CENTS * 999 * 16 / 100);
    }

    #[tokio::test]
    async fn test_period_must_be_ordered() {
        let shop = shop().await;
        let now = Utc::now();
        let err = shop.app.sales().list_between(now, now).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
