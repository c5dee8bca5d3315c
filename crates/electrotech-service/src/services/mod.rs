//! # Services
//!
//! One service per entity. Each operation validates its input, checks the
//! business rules that need the database, calls a repository and logs.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────────┐
//! │ Service          │ Rules beyond field validation                        │
//! ├──────────────────┼──────────────────────────────────────────────────────┤
//! │ CategoryService  │ no deactivation while active products use it         │
//! │ ProductService   │ active category/supplier, unique code, stock ≥ 0     │
//! │ PaymentMethod... │ at least one active method remains                   │
//! │ UserService      │ at most one active admin, never zero once created    │
//! │ SaleService      │ active references, stock per line, totals and tax    │
//! │ PurchaseService  │ active references, reversal only if stock allows     │
//! │ ReturnService    │ completed sale, product on sale, ≤ returnable        │
//! └──────────────────┴──────────────────────────────────────────────────────┘
//! ```

pub mod category;
pub mod client;
pub mod employee;
pub mod payment_method;
pub mod product;
pub mod purchase;
pub mod report;
pub mod returns;
pub mod sale;
pub mod supplier;
pub mod user;

pub use category::{CategoryInput, CategoryService};
pub use client::{ClientInput, ClientService};
pub use employee::{EmployeeInput, EmployeeService};
pub use payment_method::{PaymentMethodInput, PaymentMethodService};
pub use product::{NewProduct, ProductService, ProductUpdate};
pub use purchase::{NewPurchase, PurchaseDocument, PurchaseLineInput, PurchaseService};
pub use report::{Dashboard, ReportService};
pub use returns::{NewReturn, ReturnService};
pub use sale::{NewSale, SaleDocument, SaleLineInput, SaleService};
pub use supplier::{SupplierInput, SupplierService};
pub use user::{NewUser, UserService};

use chrono::{DateTime, Utc};

use crate::error::{ServiceError, ServiceResult};
use electrotech_core::CoreError;

/// Unwraps a lookup, turning `None` into a NotFound error.
pub(crate) fn require<T>(found: Option<T>, entity: &str, id: &str) -> ServiceResult<T> {
    found.ok_or_else(|| CoreError::not_found(entity, id).into())
}

/// Rejects references to deactivated records.
pub(crate) fn ensure_active(is_active: bool, entity: &str, id: &str) -> ServiceResult<()> {
    if is_active {
        Ok(())
    } else {
        Err(CoreError::inactive(entity, id).into())
    }
}

/// Period queries are half-open: `from <= t < to`.
pub(crate) fn validate_period(from: DateTime<Utc>, to: DateTime<Utc>) -> ServiceResult<()> {
    if from >= to {
        return Err(ServiceError::validation("period start must be before its end"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::*;
    use crate::ElectroTech;

    pub async fn test_app() -> ElectroTech {
        ElectroTech::in_memory().await.unwrap()
    }

    pub async fn category(app: &ElectroTech, name: &str) -> String {
        app.categories()
            .create(CategoryInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    pub async fn supplier(app: &ElectroTech, tax_id: &str) -> String {
        app.suppliers()
            .create(SupplierInput {
                tax_id: tax_id.to_string(),
                company_name: format!("Distribuidora {tax_id}"),
                contact_name: Some("Laura Méndez".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub fn new_product(code: &str, category_id: &str, stock: i64, sale_price_cents: i64) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            name: format!("Product {code}"),
            description: None,
            category_id: category_id.to_string(),
            supplier_id: None,
            purchase_price_cents: sale_price_cents * 7 / 10,
            sale_price_cents,
            stock,
            min_stock: Some(2),
        }
    }

    pub async fn product(
        app: &ElectroTech,
        code: &str,
        category_id: &str,
        stock: i64,
        sale_price_cents: i64,
    ) -> String {
        app.products()
            .create(new_product(code, category_id, stock, sale_price_cents))
            .await
            .unwrap()
    }

    pub async fn client(app: &ElectroTech, document_number: &str) -> String {
        app.clients()
            .create(ClientInput {
                document_number: document_number.to_string(),
                first_name: "Ana".to_string(),
                last_name: "García".to_string(),
                email: Some("ana@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub fn employee_input(document_number: &str) -> EmployeeInput {
        EmployeeInput {
            document_number: document_number.to_string(),
            first_name: "Carlos".to_string(),
            last_name: "Ruiz".to_string(),
            position: "Cashier".to_string(),
            email: None,
            phone: None,
            hire_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            salary_cents: 1_200_000,
        }
    }

    pub async fn employee(app: &ElectroTech, document_number: &str) -> String {
        app.employees()
            .create(employee_input(document_number))
            .await
            .unwrap()
    }

    pub async fn payment_method(app: &ElectroTech, name: &str) -> String {
        app.payment_methods()
            .create(PaymentMethodInput {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }
}
