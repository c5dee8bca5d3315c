//! # Report Service
//!
//! Read-only figures for the back office. Only completed sales count;
//! cancelled ones are left out of every total.
//!
//! ```text
//! ┌─────────────────────────── Dashboard ───────────────────────────┐
//! │  today            SalesSummary for [00:00 UTC, next 00:00 UTC)   │
//! │  refunds today    Σ refund_cents of today's returns              │
//! │  low stock        active products with stock ≤ min_stock         │
//! │  active products  catalogue size                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::validate_period;
use crate::error::ServiceResult;
use electrotech_core::{Product, ProductSales, SalesSummary, ValidationError};
use electrotech_db::Database;

const MAX_TOP_PRODUCTS: u32 = 100;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub today: SalesSummary,
    pub refunds_today_cents: i64,
    pub low_stock_count: usize,
    pub active_product_count: i64,
}

impl Dashboard {
    /// Today's sales total minus today's refunds.
    pub fn net_today_cents(&self) -> i64 {
        self.today.total_cents - self.refunds_today_cents
    }
}

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    pub async fn sales_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<SalesSummary> {
        validate_period(from, to)?;
        Ok(self.db.sales().summary_between(from, to).await?)
    }

    /// Best sellers by units, `limit` in 1..=100.
    pub async fn top_products(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> ServiceResult<Vec<ProductSales>> {
        validate_period(from, to)?;
        if limit == 0 || limit > MAX_TOP_PRODUCTS {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: i64::from(MAX_TOP_PRODUCTS),
            }
            .into());
        }

        Ok(self.db.sales().top_products(from, to, limit).await?)
    }

    pub async fn low_stock(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    pub async fn dashboard(&self) -> ServiceResult<Dashboard> {
        let (from, to) = today_utc();

        let today = self.db.sales().summary_between(from, to).await?;
        let refunds_today_cents = self.db.returns().refund_total_between(from, to).await?;
        let low_stock_count = self.db.products().list_low_stock().await?.len();
        let active_product_count = self.db.products().count().await?;

        debug!(
            sales = today.sale_count,
            low_stock = low_stock_count,
            "Dashboard computed"
        );

        Ok(Dashboard {
            today,
            refunds_today_cents,
            low_stock_count,
            active_product_count,
        })
    }
}

/// `[start of today, start of tomorrow)` in UTC.
fn today_utc() -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
