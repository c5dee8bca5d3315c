//! # Purchase Service
//!
//! Purchase orders are received when registered: stock goes up and each
//! product's purchase price becomes the latest unit cost. Cancelling takes
//! the units back out, provided they have not been sold in the meantime.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ensure_active, require, validate_period};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_amount_cents, validate_document_lines, validate_optional_text,
    validate_prices, validate_quantity, validate_unique_products,
};
use electrotech_core::{Money, Purchase, PurchaseDetail};
use electrotech_db::{Database, NewPurchaseLine, NewPurchaseRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
    pub supplier_id: String,
    pub employee_id: String,
    pub notes: Option<String>,
    pub lines: Vec<PurchaseLineInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDocument {
    pub purchase: Purchase,
    pub details: Vec<PurchaseDetail>,
}

#[derive(Debug, Clone)]
pub struct PurchaseService {
    db: Database,
    config: Arc<AppConfig>,
}

impl PurchaseService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        PurchaseService { db, config }
    }

    /// Registers and receives a purchase order. Returns its id.
    pub async fn register(&self, input: NewPurchase) -> ServiceResult<String> {
        validate_document_lines("Purchase", input.lines.len())?;
        validate_unique_products(input.lines.iter().map(|l| l.product_id.as_str()))?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
            validate_amount_cents("unit cost", line.unit_cost_cents)?;
        }
        validate_optional_text("notes", input.notes.as_deref())?;

        let supplier = self.db.suppliers().get_by_id(&input.supplier_id).await?;
        let supplier = require(supplier, "Supplier", &input.supplier_id)?;
        ensure_active(supplier.is_active, "Supplier", &supplier.id)?;

        let employee = self.db.employees().get_by_id(&input.employee_id).await?;
        let employee = require(employee, "Employee", &input.employee_id)?;
        ensure_active(employee.is_active, "Employee", &employee.id)?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self.db.products().get_by_id(&line.product_id).await?;
            let product = require(product, "Product", &line.product_id)?;
            ensure_active(product.is_active, "Product", &product.id)?;

            // The unit cost becomes the product's purchase price.
            validate_prices(line.unit_cost_cents, product.sale_price_cents)?;

            lines.push(NewPurchaseLine {
                product_id: product.id,
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost_cents,
            });
        }

        let subtotal: Money = lines
            .iter()
            .map(|l| Money::from_cents(l.line_total_cents()))
            .sum();
        let tax = subtotal.calculate_tax(self.config.tax_rate());
        let total = subtotal + tax;

        let record = NewPurchaseRecord {
            supplier_id: supplier.id,
            employee_id: employee.id,
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            notes: clean_optional(input.notes.as_deref()),
            lines,
        };

        let purchase = self.db.purchases().create(&record).await?;

        info!(
            id = %purchase.id,
            order = %purchase.order_number,
            supplier = %supplier.company_name,
            total = %self.config.format_currency(purchase.total_cents),
            "Purchase received"
        );
        Ok(purchase.id)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<PurchaseDocument> {
        let purchase = self.db.purchases().get_by_id(id).await?;
        let purchase = require(purchase, "Purchase", id)?;
        self.document(purchase).await
    }

    pub async fn get_by_order_number(&self, order_number: &str) -> ServiceResult<PurchaseDocument> {
        let order_number = order_number.trim();
        let purchase = self.db.purchases().get_by_order_number(order_number).await?;
        let purchase = require(purchase, "Purchase", order_number)?;
        self.document(purchase).await
    }

    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Purchase>> {
        validate_period(from, to)?;
        Ok(self.db.purchases().list_between(from, to).await?)
    }

    /// Reverses a received purchase.
    ///
    /// Fails with `InsufficientStock` when part of the goods were sold
    /// since; in that case nothing changes. Purchase prices go back to the
    /// newest cost still received.
    pub async fn cancel(&self, id: &str) -> ServiceResult<()> {
        self.db.purchases().cancel(id).await?;

        info!(id = %id, "Purchase cancelled");
        Ok(())
    }

    async fn document(&self, purchase: Purchase) -> ServiceResult<PurchaseDocument> {
        let details = self.db.purchases().get_details(&purchase.id).await?;
        Ok(PurchaseDocument { purchase, details })
    }
}
