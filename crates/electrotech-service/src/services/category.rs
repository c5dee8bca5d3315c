//! # Category Service

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::require;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_optional_text, validate_required, MAX_NAME_LENGTH,
};
use electrotech_core::{Category, CoreError};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

/// Fields a user can set on a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryInput {
    fn validate(&self) -> ServiceResult<()> {
        validate_required("name", &self.name, MAX_NAME_LENGTH)?;
        validate_optional_text("description", self.description.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CategoryService {
    db: Database,
}

impl CategoryService {
    pub fn new(db: Database) -> Self {
        CategoryService { db }
    }

    /// Creates a category and returns its id.
    pub async fn create(&self, input: CategoryInput) -> ServiceResult<String> {
        input.validate()?;

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: clean_optional(input.description.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.categories().insert(&category).await?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category.id)
    }

    pub async fn update(&self, id: &str, input: CategoryInput) -> ServiceResult<()> {
        input.validate()?;

        let mut category = self.get(id).await?;
        category.name = input.name.trim().to_string();
        category.description = clean_optional(input.description.as_deref());

        self.db.categories().update(&category).await?;

        info!(id = %id, name = %category.name, "Category updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Category> {
        let found = self.db.categories().get_by_id(id).await?;
        require(found, "Category", id)
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<Category>> {
        Ok(self.db.categories().list(include_inactive).await?)
    }

    /// Soft-deletes a category that no active product uses.
    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        self.get(id).await?;

        let in_use = self.db.categories().count_active_products(id).await?;
        if in_use > 0 {
            warn!(id = %id, products = in_use, "Category still in use");
            return Err(CoreError::InUse {
                entity: "Category".to_string(),
                id: id.to_string(),
                reason: format!("{} active products belong to it", in_use),
            }
            .into());
        }

        self.db.categories().set_active(id, false).await?;

        info!(id = %id, "Category deactivated");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        self.db.categories().set_active(id, true).await?;

        info!(id = %id, "Category activated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{category, product, test_app};
    use crate::ErrorCode;

    #[tokio::test]
    async fn test_create_and_update() {
        let app = test_app().await;
        let id = category(&app, "  Laptops ").await;

        let stored = app.categories().get(&id).await.unwrap();
        assert_eq!(stored.name, "Laptops");
        assert!(stored.is_active);

        app.categories()
            .update(
                &id,
                CategoryInput {
                    name: "Notebooks".to_string(),
                    description: Some("Portable computers".to_string()),
                },
            )
            .await
            .unwrap();

        let stored = app.categories().get(&id).await.unwrap();
        assert_eq!(stored.name, "Notebooks");
        assert_eq!(stored.description.as_deref(), Some("Portable computers"));
    }

    #[tokio::test]
    async fn test_name_required_and_unique() {
        let app = test_app().await;

        let err = app
            .categories()
            .create(CategoryInput {
                name: "   ".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        category(&app, "Audio").await;
        let err = app
            .categories()
            .create(CategoryInput {
                name: "AUDIO".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_deactivate_rejected_while_in_use() {
        let app = test_app().await;
        let phones = category(&app, "Phones").await;
        let product_id = product(&app, "PH-01", &phones, 3, 50_000).await;

        let err = app.categories().deactivate(&phones).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        app.products().deactivate(&product_id).await.unwrap();
        app.categories().deactivate(&phones).await.unwrap();

        assert!(app.categories().list(false).await.unwrap().is_empty());
        assert_eq!(app.categories().list(true).await.unwrap().len(), 1);

        app.categories().activate(&phones).await.unwrap();
        assert_eq!(app.categories().list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_category() {
        let app = test_app().await;
        let err = app.categories().get("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = app.categories().deactivate("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
