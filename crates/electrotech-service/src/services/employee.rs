//! # Employee Service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::require;
use crate::config::AppConfig;
use crate::error::ServiceResult;
use electrotech_core::validation::{
    clean_optional, validate_amount_cents, validate_document_number, validate_email,
    validate_phone, validate_required, validate_search_query, MAX_NAME_LENGTH,
};
use electrotech_core::{Employee, ValidationError};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub document_number: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: NaiveDate,
    /// Monthly salary in cents.
    pub salary_cents: i64,
}

impl EmployeeInput {
    fn validate(&self, today: NaiveDate) -> ServiceResult<()> {
        validate_document_number("document number", &self.document_number)?;
        validate_required("first name", &self.first_name, MAX_NAME_LENGTH)?;
        validate_required("last name", &self.last_name, MAX_NAME_LENGTH)?;
        validate_required("position", &self.position, MAX_NAME_LENGTH)?;
        validate_email(self.email.as_deref())?;
        validate_phone(self.phone.as_deref())?;
        validate_amount_cents("salary", self.salary_cents)?;

        if self.hire_date > today {
            return Err(ValidationError::InvalidFormat {
                field: "hire date".to_string(),
                reason: "cannot be in the future".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn apply(self, employee: &mut Employee) {
        employee.document_number = self.document_number.trim().to_string();
        employee.first_name = self.first_name.trim().to_string();
        employee.last_name = self.last_name.trim().to_string();
        employee.position = self.position.trim().to_string();
        employee.email = clean_optional(self.email.as_deref());
        employee.phone = clean_optional(self.phone.as_deref());
        employee.hire_date = self.hire_date;
        employee.salary_cents = self.salary_cents;
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeService {
    db: Database,
    config: Arc<AppConfig>,
}

impl EmployeeService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        EmployeeService { db, config }
    }

    pub async fn create(&self, input: EmployeeInput) -> ServiceResult<String> {
        input.validate(Utc::now().date_naive())?;
        self.ensure_document_free(&input.document_number, None)
            .await?;

        let now = Utc::now();
        let mut employee = Employee {
            id: new_id(),
            document_number: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            position: String::new(),
            email: None,
            phone: None,
            hire_date: input.hire_date,
            salary_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        input.apply(&mut employee);

        self.db.employees().insert(&employee).await?;

        info!(
            id = %employee.id,
            name = %employee.full_name(),
            position = %employee.position,
            "Employee created"
        );
        Ok(employee.id)
    }

    pub async fn update(&self, id: &str, input: EmployeeInput) -> ServiceResult<()> {
        input.validate(Utc::now().date_naive())?;
        let mut employee = self.get(id).await?;
        self.ensure_document_free(&input.document_number, Some(id))
            .await?;

        input.apply(&mut employee);
        self.db.employees().update(&employee).await?;

        info!(id = %id, "Employee updated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Employee> {
        let found = self.db.employees().get_by_id(id).await?;
        require(found, "Employee", id)
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<Employee>> {
        Ok(self.db.employees().list(include_inactive).await?)
    }

    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Employee>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return self.list(false).await;
        }

        Ok(self
            .db
            .employees()
            .search(&query, self.config.search_limit)
            .await?)
    }

    /// Soft-deletes an employee. Documents they handled keep referencing them.
    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        self.db.employees().set_active(id, false).await?;

        info!(id = %id, "Employee deactivated");
        Ok(())
    }

    async fn ensure_document_free(
        &self,
        document_number: &str,
        own_id: Option<&str>,
    ) -> ServiceResult<()> {
        if let Some(existing) = self.db.employees().get_by_document(document_number).await? {
            if Some(existing.id.as_str()) != own_id {
                warn!(document = %document_number.trim(), "Employee document already registered");
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
    use chrono::Duration;

    use super::*;
    use crate::services::test_support::{employee, employee_input, test_app};
    use crate::ErrorCode;

    #[tokio::test]
    async fn test_create_and_search() {
        let app = test_app().await;
        let id = employee(&app, "EMP-0001").await;

        let stored = app.employees().get(&id).await.unwrap();
        assert_eq!(stored.full_name(), "Carlos Ruiz");
        assert_eq!(stored.salary_cents, 1_200_000);

        let found = app.employees().search("ruiz").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_hire_date_not_in_future() {
        let app = test_app().await;
        let mut input = employee_input("EMP-0002");
        input.hire_date = Utc::now().date_naive() + Duration::days(2);

        let err = app.employees().create(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = employee_input("EMP-0002");
        input.hire_date = Utc::now().date_naive();
        app.employees().create(input).await.unwrap();
    }

    #[tokio::test]
    async fn test_document_unique_and_salary() {
        let app = test_app().await;
        employee(&app, "EMP-0001").await;

        let err = app
            .employees()
            .create(employee_input("EMP-0001"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        let mut input = employee_input("EMP-0003");
        input.salary_cents = -1;
        let err = app.employees().create(input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let app = test_app().await;
        let id = employee(&app, "EMP-0001").await;

        let mut input = employee_input("EMP-0001");
        input.position = "Store Manager".to_string();
        input.salary_cents = 2_000_000;
        app.employees().update(&id, input).await.unwrap();

        let stored = app.employees().get(&id).await.unwrap();
        assert_eq!(stored.position, "Store Manager");
        assert_eq!(stored.salary_cents, 2_000_000);

        app.employees().deactivate(&id).await.unwrap();
        assert!(app.employees().list(false).await.unwrap().is_empty());
        assert!(!app.employees().get(&id).await.unwrap().is_active);
    }
}
