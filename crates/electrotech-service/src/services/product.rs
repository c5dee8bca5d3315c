//! # Product Service
//!
//! Catalogue maintenance and manual stock corrections.
//!
//! Stock normally moves only through sales, purchases and returns.
//! [`ProductService::adjust_stock`] exists for stocktakes, breakage and other
//! corrections, and always records a reason in the log.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ensure_active, require};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_optional_text, validate_prices, validate_product_code,
    validate_product_name, validate_required, validate_search_query, validate_stock,
    validate_stock_delta, MAX_TEXT_LENGTH,
};
use electrotech_core::{CoreError, Product, ValidationError, MAX_STOCK};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

/// A product to add to the catalogue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub supplier_id: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    /// Opening stock.
    pub stock: i64,
    /// Reorder threshold; the configured default when absent.
    pub min_stock: Option<i64>,
}

/// Catalogue fields of an existing product. Stock is not editable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub supplier_id: Option<String>,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    pub min_stock: i64,
}

#[derive(Debug, Clone)]
pub struct ProductService {
    db: Database,
    config: Arc<AppConfig>,
}

impl ProductService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        ProductService { db, config }
    }

    /// Adds a product to the catalogue and returns its id.
    ///
    /// ## Rules
    /// - Category must exist and be active
    /// - Supplier is optional, but must be active when given
    /// - Code is unique
    /// - Sale price is not below the purchase price
    pub async fn create(&self, input: NewProduct) -> ServiceResult<String> {
        let min_stock = input.min_stock.unwrap_or(self.config.default_min_stock);

        validate_product_code(&input.code)?;
        validate_product_name(&input.name)?;
        validate_optional_text("description", input.description.as_deref())?;
        validate_prices(input.purchase_price_cents, input.sale_price_cents)?;
        validate_stock("stock", input.stock)?;
        validate_stock("min stock", min_stock)?;

        let supplier_id = clean_optional(input.supplier_id.as_deref());
        self.check_references(&input.category_id, supplier_id.as_deref())
            .await?;
        self.ensure_code_free(&input.code, None).await?;

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: clean_optional(input.description.as_deref()),
            category_id: input.category_id,
            supplier_id,
            purchase_price_cents: input.purchase_price_cents,
            sale_price_cents: input.sale_price_cents,
            stock: input.stock,
            min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.products().insert(&product).await?;

        info!(
            id = %product.id,
            code = %product.code,
            price = %product.sale_price(),
            stock = product.stock,
            "Product created"
        );
        Ok(product.id)
    }

    pub async fn update(&self, id: &str, input: ProductUpdate) -> ServiceResult<()> {
        validate_product_code(&input.code)?;
        validate_product_name(&input.name)?;
        validate_optional_text("description", input.description.as_deref())?;
        validate_prices(input.purchase_price_cents, input.sale_price_cents)?;
        validate_stock("min stock", input.min_stock)?;

        let mut product = self.get(id).await?;

        let supplier_id = clean_optional(input.supplier_id.as_deref());
        if product.category_id != input.category_id || product.supplier_id != supplier_id {
            self.check_references(&input.category_id, supplier_id.as_deref())
                .await?;
        }
        self.ensure_code_free(&input.code, Some(id)).await?;

        product.code = input.code.trim().to_string();
        product.name = input.name.trim().to_string();
        product.description = clean_optional(input.description.as_deref());
        product.category_id = input.category_id;
        product.supplier_id = supplier_id;
        product.purchase_price_cents = input.purchase_price_cents;
        product.sale_price_cents = input.sale_price_cents;
        product.min_stock = input.min_stock;

        self.db.products().update(&product).await?;

        info!(id = %id, code = %product.code, "Product updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Product> {
        let found = self.db.products().get_by_id(id).await?;
        require(found, "Product", id)
    }

    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Product> {
        let found = self.db.products().get_by_code(code).await?;
        require(found, "Product", code.trim())
    }

    /// Full-text search over code, name and description (active products).
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        Ok(self
            .db
            .products()
            .search(&query, self.config.search_limit)
            .await?)
    }

    pub async fn list_by_category(&self, category_id: &str) -> ServiceResult<Vec<Product>> {
        let category = self.db.categories().get_by_id(category_id).await?;
        require(category, "Category", category_id)?;

        Ok(self.db.products().list_by_category(category_id).await?)
    }

    /// Active products at or below their reorder threshold.
    pub async fn low_stock(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    /// Manual stock correction. Returns the new stock level.
    ///
    /// ## Rules
    /// - `delta` is non-zero and at most `MAX_STOCK` units either way
    /// - A reason is required
    /// - Stock stays within `0..=MAX_STOCK`
    pub async fn adjust_stock(&self, id: &str, delta: i64, reason: &str) -> ServiceResult<i64> {
        validate_stock_delta(delta)?;
        validate_required("reason", reason, MAX_TEXT_LENGTH)?;

        let product = self.get(id).await?;
        let target = product
            .stock
            .checked_add(delta)
            .filter(|t| *t <= MAX_STOCK)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: MAX_STOCK,
            })?;
        if target < 0 {
            warn!(id = %id, stock = product.stock, delta = delta, "Stock correction below zero");
            return Err(CoreError::InsufficientStock {
                code: product.code,
                available: product.stock,
                requested: delta.saturating_neg(),
            }
            .into());
        }

        let stock = self.db.products().adjust_stock(id, delta).await?;

        info!(
            id = %id,
            code = %product.code,
            delta = delta,
            stock = stock,
            reason = %reason.trim(),
            "Stock adjusted"
        );
        Ok(stock)
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        self.db.products().set_active(id, false).await?;

        info!(id = %id, "Product deactivated");
        Ok(())
    }

    /// Reactivates a product; its category must still be active.
    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        let product = self.get(id).await?;
        let category = self.db.categories().get_by_id(&product.category_id).await?;
        let category = require(category, "Category", &product.category_id)?;
        ensure_active(category.is_active, "Category", &category.id)?;

        self.db.products().set_active(id, true).await?;

        info!(id = %id, "Product activated");
        Ok(())
    }

    async fn check_references(
        &self,
        category_id: &str,
        supplier_id: Option<&str>,
    ) -> ServiceResult<()> {
        let category = self.db.categories().get_by_id(category_id).await?;
        let category = require(category, "Category", category_id)?;
        ensure_active(category.is_active, "Category", category_id)?;

        if let Some(supplier_id) = supplier_id {
            let supplier = self.db.suppliers().get_by_id(supplier_id).await?;
            let supplier = require(supplier, "Supplier", supplier_id)?;
            ensure_active(supplier.is_active, "Supplier", supplier_id)?;
        }

        Ok(())
    }

    async fn ensure_code_free(&self, code: &str, own_id: Option<&str>) -> ServiceResult<()> {
        if let Some(existing) = self.db.products().get_by_code(code).await? {
            if Some(existing.id.as_str()) != own_id {
                warn!(code = %code.trim(), "Product code already in use");
                return Err(ValidationError::Duplicate {
                    field: "code".to_string(),
                    value: code.trim().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
