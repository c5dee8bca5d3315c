//! # Payment Method Service
//!
//! The register always needs at least one active way to take payment, so the
//! last active method cannot be switched off.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::require;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_optional_text, validate_required, MAX_NAME_LENGTH,
};
use electrotech_core::{CoreError, PaymentMethod};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInput {
    pub name: String,
    pub description: Option<String>,
}

impl PaymentMethodInput {
    fn validate(&self) -> ServiceResult<()> {
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional_text("description", self.description.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PaymentMethodService {
    db: Database,
}

impl PaymentMethodService {
    pub fn new(db: Database) -> Self {
        PaymentMethodService { db }
    }

    pub async fn create(&self, input: PaymentMethodInput) -> ServiceResult<String> {
        input.validate()?;

        let now = Utc::now();
        let method = PaymentMethod {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: clean_optional(input.description.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.payment_methods().insert(&method).await?;

        info!(id = %method.id, name = %method.name, "Payment method created");
        Ok(method.id)
    }

    pub async fn update(&self, id: &str, input: PaymentMethodInput) -> ServiceResult<()> {
        input.validate()?;

        let mut method = self.get(id).await?;
        method.name = input.name.trim().to_string();
        method.description = clean_optional(input.description.as_deref());

        self.db.payment_methods().update(&method).await?;

        info!(id = %id, name = %method.name, "Payment method updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<PaymentMethod> {
        let found = self.db.payment_methods().get_by_id(id).await?;
        require(found, "Payment method", id)
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<PaymentMethod>> {
        Ok(self.db.payment_methods().list(include_inactive).await?)
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        let method = self.get(id).await?;
        if !method.is_active {
            return Ok(());
        }

        if self.db.payment_methods().count_active().await? <= 1 {
            warn!(id = %id, name = %method.name, "Refusing to deactivate last payment method");
            return Err(CoreError::InUse {
                entity: "Payment method".to_string(),
                id: id.to_string(),
                reason: "it is the last active payment method".to_string(),
            }
            .into());
        }

        self.db.payment_methods().set_active(id, false).await?;

        info!(id = %id, name = %method.name, "Payment method deactivated");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        self.db.payment_methods().set_active(id, true).await?;

        info!(id = %id, "Payment method activated");
        Ok(())
    }
}
