//! # User Repository
//!
//! Database operations for login accounts.
//!
//! Password hashes are opaque strings here; hashing and verification live in
//! the service layer.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use electrotech_core::User;

const COLUMNS: &str = "id, username, password_hash, role, employee_id, is_active, \
                       last_login_at, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken (case-insensitive)
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, password_hash, role, employee_id, is_active,
                last_login_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.employee_id)
        .bind(user.is_active)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates role, linked employee and active flag.
    ///
    /// The password has its own path: [`UserRepository::update_password`].
    pub async fn update(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = %user.role, active = user.is_active, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                role = ?2,
                employee_id = ?3,
                is_active = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(user.role)
        .bind(&user.employee_id)
        .bind(user.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Case-insensitive lookup by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM users WHERE (?1 OR is_active = 1) ORDER BY username"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn count_active_admins(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// The active administrator, if there is one.
    pub async fn active_admin(&self) -> DbResult<Option<User>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM users WHERE role = 'admin' AND is_active = 1 \
             ORDER BY created_at LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating user password");

        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Records a successful login.
    pub async fn touch_last_login(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use electrotech_core::{User, UserRole};

    use crate::repository::new_id;
    use crate::repository::test_support::test_db;
    use crate::DbError;

    fn user(username: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: new_id(),
            username: username.to_string(),
            password_hash: "$argon2id$v=19$placeholder".to_string(),
            role,
            employee_id: None,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_role_round_trip() {
        let db = test_db().await;
        let seller = user("maria", UserRole::Seller);
        db.users().insert(&seller).await.unwrap();

        let stored = db.users().get_by_username("MARIA").await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Seller);
        assert_eq!(stored.password_hash, seller.password_hash);
        assert!(stored.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_username_unique_ignoring_case() {
        let db = test_db().await;
        db.users().insert(&user("admin", UserRole::Admin)).await.unwrap();

        let err = db
            .users()
            .insert(&user("Admin", UserRole::Seller))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_admin_counting() {
        let db = test_db().await;
        assert_eq!(db.users().count_active_admins().await.unwrap(), 0);
        assert!(db.users().active_admin().await.unwrap().is_none());

        let admin = user("admin", UserRole::Admin);
        db.users().insert(&admin).await.unwrap();
        db.users().insert(&user("pedro", UserRole::Warehouse)).await.unwrap();

        assert_eq!(db.users().count_active_admins().await.unwrap(), 1);
        assert_eq!(db.users().active_admin().await.unwrap().unwrap().id, admin.id);

        let mut demoted = admin.clone();
        demoted.role = UserRole::Seller;
        db.users().update(&demoted).await.unwrap();
        assert_eq!(db.users().count_active_admins().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_active_admin_rejected() {
        let db = test_db().await;
        let first = user("admin", UserRole::Admin);
        db.users().insert(&first).await.unwrap();

        let err = db
            .users()
            .insert(&user("root", UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Inactive admins are outside the index
        let mut retired = user("old_admin", UserRole::Admin);
        retired.is_active = false;
        db.users().insert(&retired).await.unwrap();

        let mut promoted = user("maria", UserRole::Seller);
        db.users().insert(&promoted).await.unwrap();
        promoted.role = UserRole::Admin;
        let err = db.users().update(&promoted).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.users().count_active_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_password_and_last_login() {
        let db = test_db().await;
        let u = user("maria", UserRole::Seller);
        db.users().insert(&u).await.unwrap();

        db.users().update_password(&u.id, "$argon2id$new").await.unwrap();
        db.users().touch_last_login(&u.id).await.unwrap();

        let stored = db.users().get_by_id(&u.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$argon2id$new");
        assert!(stored.last_login_at.is_some());

        assert!(db.users().update_password("missing", "x").await.is_err());
    }
}
