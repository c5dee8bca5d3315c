//! # Return Service
//!
//! Goods brought back from a completed sale go back on the shelf and the
//! customer gets back the share of what they paid that those units made up:
//!
//! ```text
//! goods  = unit price (as sold) × quantity
//! refund = sale total × goods / sale subtotal
//! ```
//!
//! The sale total already has the discount taken off and the tax added, so
//! both come back in proportion. A sale can be returned in several visits,
//! but never more units of a product than were sold on it, and never more
//! money than its total.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::{ensure_active, require};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{validate_quantity, validate_required, MAX_TEXT_LENGTH};
use electrotech_core::{CoreError, Money, Return, SaleStatus};
use electrotech_db::{Database, NewReturnRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReturn {
    pub sale_id: String,
    pub product_id: String,
    pub employee_id: String,
    pub quantity: i64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReturnService {
    db: Database,
    config: Arc<AppConfig>,
}

impl ReturnService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        ReturnService { db, config }
    }

    /// Records a return, restocks the units and returns the new id.
    pub async fn register(&self, input: NewReturn) -> ServiceResult<String> {
        validate_quantity(input.quantity)?;
        validate_required("reason", &input.reason, MAX_TEXT_LENGTH)?;

        let sale = self.db.sales().get_by_id(&input.sale_id).await?;
        let sale = require(sale, "Sale", &input.sale_id)?;
        if sale.status != SaleStatus::Completed {
            warn!(invoice = %sale.invoice_number, "Return against a cancelled sale");
            return Err(CoreError::InvalidStatus {
                entity: "Sale".to_string(),
                id: sale.invoice_number,
                status: sale.status.as_str().to_string(),
            }
            .into());
        }

        let employee = self.db.employees().get_by_id(&input.employee_id).await?;
        let employee = require(employee, "Employee", &input.employee_id)?;
        ensure_active(employee.is_active, "Employee", &employee.id)?;

        let details = self.db.sales().get_details(&sale.id).await?;
        let line = details
            .into_iter()
            .find(|d| d.product_id == input.product_id);
        let line = require(line, "Sale line", &input.product_id)?;

        let returned = self
            .db
            .sales()
            .returned_quantity(&sale.id, &line.product_id)
            .await?;
        let returnable = line.quantity - returned;
        if input.quantity > returnable {
            warn!(
                invoice = %sale.invoice_number,
                code = %line.code_snapshot,
                returnable,
                requested = input.quantity,
                "Return exceeds sold quantity"
            );
            return Err(CoreError::ReturnExceedsSold {
                code: line.code_snapshot,
                returnable,
                requested: input.quantity,
            }
            .into());
        }

        let goods = line.unit_price().multiply_quantity(input.quantity);
        let paid = sale.total();
        let already_refunded = self.refunded_for_sale(&sale.id).await?;
        let refund = paid
            .share(goods.cents(), sale.subtotal_cents)
            .min(paid - already_refunded)
            .max(Money::zero());

        let record = NewReturnRecord {
            sale_id: sale.id,
            product_id: line.product_id,
            employee_id: employee.id,
            quantity: input.quantity,
            refund_cents: refund.cents(),
            reason: input.reason.trim().to_string(),
        };

        let stored = self.db.returns().create(&record).await?;

        info!(
            id = %stored.id,
            number = %stored.return_number,
            invoice = %sale.invoice_number,
            quantity = stored.quantity,
            refund = %self.config.format_currency(stored.refund_cents),
            "Return registered"
        );
        Ok(stored.id)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Return> {
        let found = self.db.returns().get_by_id(id).await?;
        require(found, "Return", id)
    }

    pub async fn list_for_sale(&self, sale_id: &str) -> ServiceResult<Vec<Return>> {
        let sale = self.db.sales().get_by_id(sale_id).await?;
        require(sale, "Sale", sale_id)?;
        Ok(self.db.returns().list_for_sale(sale_id).await?)
    }

    /// Total refunded so far, tax included.
    pub async fn refunded_for_sale(&self, sale_id: &str) -> ServiceResult<Money> {
        let returns = self.list_for_sale(sale_id).await?;
        Ok(returns.iter().map(|r| Money::from_cents(r.refund_cents)).sum())
    }
}
