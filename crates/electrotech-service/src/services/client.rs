//! # Client Service

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
use electrotech_core::{Client, ValidationError};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ClientInput {
    fn validate(&self) -> ServiceResult<()> {
        validate_document_number("document number", &self.document_number)?;
        validate_required("first name", &self.first_name, MAX_NAME_LENGTH)?;
        validate_required("last name", &self.last_name, MAX_NAME_LENGTH)?;
        validate_email(self.email.as_deref())?;
        validate_phone(self.phone.as_deref())?;
        validate_optional_text("address", self.address.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ClientService {
    db: Database,
    config: Arc<AppConfig>,
}

impl ClientService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        ClientService { db, config }
    }

    /// Registers a client. The document number must not be on file yet.
    pub async fn create(&self, input: ClientInput) -> ServiceResult<String> {
        input.validate()?;
        self.ensure_document_free(&input.document_number, None)
            .await?;

        let now = Utc::now();
        let client = Client {
            id: new_id(),
            document_number: input.document_number.trim().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: clean_optional(input.email.as_deref()),
            phone: clean_optional(input.phone.as_deref()),
            address: clean_optional(input.address.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.clients().insert(&client).await?;

        info!(id = %client.id, document = %client.document_number, "Client created");
        Ok(client.id)
    }

    pub async fn update(&self, id: &str, input: ClientInput) -> ServiceResult<()> {
        input.validate()?;
        let mut client = self.get(id).await?;
        self.ensure_document_free(&input.document_number, Some(id))
            .await?;

        client.document_number = input.document_number.trim().to_string();
        client.first_name = input.first_name.trim().to_string();
        client.last_name = input.last_name.trim().to_string();
        client.email = clean_optional(input.email.as_deref());
        client.phone = clean_optional(input.phone.as_deref());
        client.address = clean_optional(input.address.as_deref());

        self.db.clients().update(&client).await?;

        info!(id = %id, "Client updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Client> {
        let found = self.db.clients().get_by_id(id).await?;
        require(found, "Client", id)
    }

    pub async fn get_by_document(&self, document_number: &str) -> ServiceResult<Client> {
        let found = self.db.clients().get_by_document(document_number).await?;
        require(found, "Client", document_number.trim())
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<Client>> {
        Ok(self.db.clients().list(include_inactive).await?)
    }

    /// Active clients by name, document number or email.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Client>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return self.list(false).await;
        }

        Ok(self
            .db
            .clients()
            .search(&query, self.config.search_limit)
            .await?)
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        self.db.clients().set_active(id, false).await?;

        info!(id = %id, "Client deactivated");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        self.db.clients().set_active(id, true).await?;

        info!(id = %id, "Client activated");
        Ok(())
    }

    async fn ensure_document_free(
        &self,
        document_number: &str,
        own_id: Option<&str>,
    ) -> ServiceResult<()> {
        if let Some(existing) = self.db.clients().get_by_document(document_number).await? {
            if Some(existing.id.as_str()) != own_id {
                warn!(document = %document_number.trim(), "Client document already registered");
                return Err(ValidationError::Duplicate {
                    field: "document number".to_string(),
                    value: document_number.trim().to_string(),
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
    use crate::services::test_support::{client, test_app};
    use crate::ErrorCode;

    #[tokio::test]
    async fn test_create_and_find() {
        let app = test_app().await;
        let id = client(&app, "12345678").await;

        let stored = app.clients().get_by_document(" 12345678 ").await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.full_name(), "Ana García");

        let found = app.clients().search("garcía").await.unwrap();
        assert_eq!(found.len(), 1);
        let found = app.clients().search("Ana Gar").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_document_unique() {
        let app = test_app().await;
        client(&app, "12345678").await;

        let err = app
            .clients()
            .create(ClientInput {
                document_number: "12345678".to_string(),
                first_name: "Otra".to_string(),
                last_name: "Persona".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_update_validates() {
        let app = test_app().await;
        let id = client(&app, "12345678").await;

        let err = app
            .clients()
            .update(
                &id,
                ClientInput {
                    document_number: "12345678".to_string(),
                    first_name: "".to_string(),
                    last_name: "García".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        app.clients()
            .update(
                &id,
                ClientInput {
                    document_number: "12345678".to_string(),
                    first_name: "Ana María".to_string(),
                    last_name: "García".to_string(),
                    phone: Some("555-123-4567".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = app.clients().get(&id).await.unwrap();
        assert_eq!(stored.first_name, "Ana María");
        assert!(stored.email.is_none());
        assert_eq!(stored.phone.as_deref(), Some("555-123-4567"));
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_search() {
        let app = test_app().await;
        let id = client(&app, "12345678").await;

        app.clients().deactivate(&id).await.unwrap();
        assert!(app.clients().search("Ana").await.unwrap().is_empty());
        assert!(app.clients().list(false).await.unwrap().is_empty());

        app.clients().activate(&id).await.unwrap();
        assert_eq!(app.clients().list(false).await.unwrap().len(), 1);

        let err = app.clients().deactivate("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
