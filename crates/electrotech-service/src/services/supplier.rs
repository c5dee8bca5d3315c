//! # Supplier Service

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::require;
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_document_number, validate_email, validate_optional_text,
    validate_phone, validate_required, validate_search_query, MAX_NAME_LENGTH,
};
use electrotech_core::{Supplier, ValidationError};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    pub tax_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl SupplierInput {
    fn validate(&self) -> ServiceResult<()> {
        validate_document_number("tax id", &self.tax_id)?;
        validate_required("company name", &self.company_name, MAX_NAME_LENGTH)?;
        if let Some(contact) = clean_optional(self.contact_name.as_deref()) {
            validate_required("contact name", &contact, MAX_NAME_LENGTH)?;
        }
        validate_email(self.email.as_deref())?;
        validate_phone(self.phone.as_deref())?;
        validate_optional_text("address", self.address.as_deref())?;
        Ok(())
    }

    fn apply(self, supplier: &mut Supplier) {
        supplier.tax_id = self.tax_id.trim().to_string();
        supplier.company_name = self.company_name.trim().to_string();
        supplier.contact_name = clean_optional(self.contact_name.as_deref());
        supplier.email = clean_optional(self.email.as_deref());
        supplier.phone = clean_optional(self.phone.as_deref());
        supplier.address = clean_optional(self.address.as_deref());
    }
}

#[derive(Debug, Clone)]
pub struct SupplierService {
    db: Database,
    config: Arc<AppConfig>,
}

impl SupplierService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        SupplierService { db, config }
    }

    pub async fn create(&self, input: SupplierInput) -> ServiceResult<String> {
        input.validate()?;
        self.ensure_tax_id_free(&input.tax_id, None).await?;

        let now = Utc::now();
        let mut supplier = Supplier {
            id: new_id(),
            tax_id: String::new(),
            company_name: String::new(),
            contact_name: None,
            email: None,
            phone: None,
            address: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        input.apply(&mut supplier);

        self.db.suppliers().insert(&supplier).await?;

        info!(id = %supplier.id, tax_id = %supplier.tax_id, "Supplier created");
        Ok(supplier.id)
    }

    pub async fn update(&self, id: &str, input: SupplierInput) -> ServiceResult<()> {
        input.validate()?;
        let mut supplier = self.get(id).await?;
        self.ensure_tax_id_free(&input.tax_id, Some(id)).await?;

        input.apply(&mut supplier);
        self.db.suppliers().update(&supplier).await?;

        info!(id = %id, "Supplier updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Supplier> {
        let found = self.db.suppliers().get_by_id(id).await?;
        require(found, "Supplier", id)
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<Supplier>> {
        Ok(self.db.suppliers().list(include_inactive).await?)
    }

    /// Active suppliers matching company, contact or tax id. An empty query
    /// lists them all.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Supplier>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return self.list(false).await;
        }

        Ok(self
            .db
            .suppliers()
            .search(&query, self.config.search_limit)
            .await?)
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        self.db.suppliers().set_active(id, false).await?;

        info!(id = %id, "Supplier deactivated");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        self.db.suppliers().set_active(id, true).await?;

        info!(id = %id, "Supplier activated");
        Ok(())
    }

    async fn ensure_tax_id_free(&self, tax_id: &str, own_id: Option<&str>) -> ServiceResult<()> {
        if let Some(existing) = self.db.suppliers().get_by_tax_id(tax_id).await? {
            if Some(existing.id.as_str()) != own_id {
                warn!(tax_id = %tax_id.trim(), "Supplier tax id already registered");
                return Err(ValidationError::Duplicate {
                    field: "tax id".to_string(),
                    value: tax_id.trim().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{supplier, test_app};
    use crate::ErrorCode;

    #[tokio::test]
    async fn test_create_trims_and_cleans() {
        let app = test_app().await;
        let id = app
            .suppliers()
            .create(SupplierInput {
                tax_id: " DNO-840215-AB1 ".to_string(),
                company_name: "Distribuidora Norte".to_string(),
                contact_name: Some("  ".to_string()),
                email: Some("ventas@dnorte.com".to_string()),
                phone: Some("+52 55 1234 5678".to_string()),
                address: None,
            })
            .await
            .unwrap();

        let stored = app.suppliers().get(&id).await.unwrap();
        assert_eq!(stored.tax_id, "DNO-840215-AB1");
        assert!(stored.contact_name.is_none());
        assert_eq!(stored.email.as_deref(), Some("ventas@dnorte.com"));
    }

    #[tokio::test]
    async fn test_duplicate_tax_id() {
        let app = test_app().await;
        let first = supplier(&app, "ISU-910730").await;

        let err = app
            .suppliers()
            .create(SupplierInput {
                tax_id: "ISU-910730".to_string(),
                company_name: "Another".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        // Keeping its own tax id is not a conflict.
        app.suppliers()
            .update(
                &first,
                SupplierInput {
                    tax_id: "ISU-910730".to_string(),
                    company_name: "Importadora Sur".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_fields() {
        let app = test_app().await;
        let err = app
            .suppliers()
            .create(SupplierInput {
                tax_id: "AB".to_string(),
                company_name: "Tiny".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = app
            .suppliers()
            .create(SupplierInput {
                tax_id: "TGL-030112".to_string(),
                company_name: "TecnoGlobal".to_string(),
                email: Some("not-an-email".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_search_and_deactivate() {
        let app = test_app().await;
        let norte = supplier(&app, "DNO-840215").await;
        supplier(&app, "ISU-910730").await;

        let found = app.suppliers().search("840215").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, norte);

        assert_eq!(app.suppliers().search("  ").await.unwrap().len(), 2);

        app.suppliers().deactivate(&norte).await.unwrap();
        assert!(app.suppliers().search("840215").await.unwrap().is_empty());
        assert_eq!(app.suppliers().list(true).await.unwrap().len(), 2);

        app.suppliers().activate(&norte).await.unwrap();
        assert_eq!(app.suppliers().list(false).await.unwrap().len(), 2);
    }
}
