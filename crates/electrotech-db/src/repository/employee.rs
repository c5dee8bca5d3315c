//! # Employee Repository
//!
//! Database operations for staff members.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use electrotech_core::Employee;

const COLUMNS: &str = "id, document_number, first_name, last_name, position, email, phone, \
                       hire_date, salary_cents, is_active, created_at, updated_at";

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, document_number, first_name, last_name, position, email, phone,
                hire_date, salary_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.document_number)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.position)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.hire_date)
        .bind(employee.salary_cents)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                document_number = ?2,
                first_name = ?3,
                last_name = ?4,
                position = ?5,
                email = ?6,
                phone = ?7,
                hire_date = ?8,
                salary_cents = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.document_number)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.position)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.hire_date)
        .bind(employee.salary_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE id = ?1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    pub async fn get_by_document(&self, document_number: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {COLUMNS} FROM employees WHERE document_number = ?1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(document_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Employee>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM employees WHERE (?1 OR is_active = 1) \
             ORDER BY last_name, first_name"
        );
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }

    /// Substring search over names, document number and position.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Employee>> {
        debug!(query = %query, limit = limit, "Searching employees");

        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM employees
            WHERE is_active = 1
              AND (first_name LIKE ?1 ESCAPE '\'
                   OR last_name LIKE ?1 ESCAPE '\'
                   OR (first_name || ' ' || last_name) LIKE ?1 ESCAPE '\'
                   OR document_number LIKE ?1 ESCAPE '\'
                   OR position LIKE ?1 ESCAPE '\')
            ORDER BY last_name, first_name
            LIMIT ?2
            "#
        );
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(contains_pattern(query))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }

    /// Activates or soft-deletes an employee.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting employee active flag");

        let result =
            sqlx::query("UPDATE employees SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::repository::test_support::{insert_employee, test_db};

    #[tokio::test]
    async fn test_round_trips_hire_date_and_salary() {
        let db = test_db().await;
        let employee = insert_employee(&db, "EMP-0001").await;

        let stored = db.employees().get_by_id(&employee.id).await.unwrap().unwrap();
        assert_eq!(stored.hire_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(stored.salary_cents, 1_200_000);
        assert_eq!(stored.full_name(), "Carlos Ruiz");
    }

    #[tokio::test]
    async fn test_update_position() {
        let db = test_db().await;
        let mut employee = insert_employee(&db, "EMP-0001").await;

        employee.position = "Store Manager".to_string();
        employee.salary_cents = 2_500_000;
        db.employees().update(&employee).await.unwrap();

        let stored = db.employees().get_by_document("EMP-0001").await.unwrap().unwrap();
        assert_eq!(stored.position, "Store Manager");
        assert_eq!(db.employees().search("manager", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deactivated_employee_hidden() {
        let db = test_db().await;
        let employee = insert_employee(&db, "EMP-0001").await;
        insert_employee(&db, "EMP-0002").await;

        db.employees().set_active(&employee.id, false).await.unwrap();

        assert_eq!(db.employees().list(false).await.unwrap().len(), 1);
        assert_eq!(db.employees().search("carlos", 5).await.unwrap().len(), 1);
    }
}
