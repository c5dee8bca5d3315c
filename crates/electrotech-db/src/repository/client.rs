//! # Client Repository
//!
//! Database operations for customers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use electrotech_core::Client;

const COLUMNS: &str = "id, document_number, first_name, last_name, email, phone, address, \
                       is_active, created_at, updated_at";

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - document number already registered
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, document_number, first_name, last_name, email, phone, address,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&client.id)
        .bind(&client.document_number)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                document_number = ?2,
                first_name = ?3,
                last_name = ?4,
                email = ?5,
                phone = ?6,
                address = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.document_number)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE id = ?1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn get_by_document(&self, document_number: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {COLUMNS} FROM clients WHERE document_number = ?1");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(document_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    /// Lists clients ordered by last name, first name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Client>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM clients WHERE (?1 OR is_active = 1) \
             ORDER BY last_name, first_name"
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Substring search over names, document number and email.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        debug!(query = %query, limit = limit, "Searching clients");

        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM clients
            WHERE is_active = 1
              AND (first_name LIKE ?1 ESCAPE '\'
                   OR last_name LIKE ?1 ESCAPE '\'
                   OR (first_name || ' ' || last_name) LIKE ?1 ESCAPE '\'
                   OR document_number LIKE ?1 ESCAPE '\'
                   OR email LIKE ?1 ESCAPE '\')
            ORDER BY last_name, first_name
            LIMIT ?2
            "#
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(contains_pattern(query))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    /// Activates or soft-deletes a client.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = active, "Setting client active flag");

        let result =
            sqlx::query("UPDATE clients SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }
}
