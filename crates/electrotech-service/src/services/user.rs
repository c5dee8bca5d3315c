//! # User Service
//!
//! Login accounts, credentials and the administrator rule.
//!
//! ## Administrator Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  At most ONE active admin exists at any time.                          │
//! │                                                                         │
//! │  create(role = admin)      ── another active admin? ──► AdminAlreadyExists
//! │  change_role(→ admin)      ── another active admin? ──► AdminAlreadyExists
//! │  activate(admin account)   ── another active admin? ──► AdminAlreadyExists
//! │  change_role(admin → x)    ── only active admin?    ──► LastAdmin       │
//! │  deactivate(admin)         ── only active admin?    ──► LastAdmin       │
//! │                                                                         │
//! │  ensure_admin() bootstraps the first admin on an empty install.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ensure_active, require};
use crate::config::AppConfig;
use crate::error::ServiceResult;
use crate::password::{hash_password, verify_password};
use electrotech_core::validation::{validate_password, validate_username};
use electrotech_core::{CoreError, User, UserRole, ValidationError};
use electrotech_db::repository::new_id;
use electrotech_db::Database;

/// A login account to create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(db: Database, config: Arc<AppConfig>) -> Self {
        UserService { db, config }
    }

    /// Creates an account and returns its id.
    pub async fn create(&self, input: NewUser) -> ServiceResult<String> {
        validate_username(&input.username)?;
        validate_password(&input.password, self.config.min_password_length)?;

        let username = input.username.trim().to_string();
        if self.db.users().get_by_username(&username).await?.is_some() {
            warn!(username = %username, "Username already taken");
            return Err(ValidationError::Duplicate {
                field: "username".to_string(),
                value: username,
            }
            .into());
        }

        let employee_id = match input.employee_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let employee = self.db.employees().get_by_id(id).await?;
                let employee = require(employee, "Employee", id)?;
                ensure_active(employee.is_active, "Employee", id)?;
                Some(employee.id)
            }
            _ => None,
        };

        if input.role == UserRole::Admin {
            self.ensure_no_other_admin(None).await?;
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            username,
            password_hash: hash_password(&input.password)?,
            role: input.role,
            employee_id,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        self.db.users().insert(&user).await?;

        info!(id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user.id)
    }

    /// Checks a username / password pair and records the login.
    ///
    /// Unknown users, inactive users and wrong passwords all fail with the
    /// same `AUTHENTICATION_FAILED` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let found = self.db.users().get_by_username(username).await?;

        let mut user = match found {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(username = %username.trim(), "Failed login attempt");
                return Err(CoreError::InvalidCredentials.into());
            }
        };

        self.db.users().touch_last_login(&user.id).await?;
        user.last_login_at = Some(Utc::now());

        info!(id = %user.id, username = %user.username, "User logged in");
        Ok(user)
    }

    /// Changes a user's own password after checking the current one.
    pub async fn change_password(
        &self,
        id: &str,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let user = self.get(id).await?;
        if !verify_password(current_password, &user.password_hash) {
            warn!(id = %id, "Password change with wrong current password");
            return Err(CoreError::InvalidCredentials.into());
        }

        self.set_password(&user, new_password).await
    }

    /// Administrator action: sets a new password without the current one.
    pub async fn reset_password(&self, id: &str, new_password: &str) -> ServiceResult<()> {
        let user = self.get(id).await?;
        self.set_password(&user, new_password).await
    }

    pub async fn change_role(&self, id: &str, role: UserRole) -> ServiceResult<()> {
        let mut user = self.get(id).await?;
        if user.role == role {
            return Ok(());
        }

        if user.is_active {
            if role == UserRole::Admin {
                self.ensure_no_other_admin(Some(id)).await?;
            } else if user.is_admin() {
                self.ensure_not_last_admin(&user).await?;
            }
        }

        let previous = user.role;
        user.role = role;
        self.db.users().update(&user).await?;

        info!(id = %id, from = %previous, to = %role, "User role changed");
        Ok(())
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResult<()> {
        let mut user = self.get(id).await?;
        if !user.is_active {
            return Ok(());
        }
        if user.is_admin() {
            self.ensure_not_last_admin(&user).await?;
        }

        user.is_active = false;
        self.db.users().update(&user).await?;

        info!(id = %id, username = %user.username, "User deactivated");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> ServiceResult<()> {
        let mut user = self.get(id).await?;
        if user.is_active {
            return Ok(());
        }
        if user.is_admin() {
            self.ensure_no_other_admin(Some(id)).await?;
        }

        user.is_active = true;
        self.db.users().update(&user).await?;

        info!(id = %id, username = %user.username, "User activated");
        Ok(())
    }

    /// Creates the first administrator when there is no active one.
    ///
    /// Returns the new id, or `None` when an admin already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<Option<String>> {
        if let Some(admin) = self.db.users().active_admin().await? {
            info!(username = %admin.username, "Administrator present");
            return Ok(None);
        }

        let id = self
            .create(NewUser {
                username: username.to_string(),
                password: password.to_string(),
                role: UserRole::Admin,
                employee_id: None,
            })
            .await?;

        info!(id = %id, "Bootstrapped administrator account");
        Ok(Some(id))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<User> {
        let found = self.db.users().get_by_id(id).await?;
        require(found, "User", id)
    }

    pub async fn list(&self, include_inactive: bool) -> ServiceResult<Vec<User>> {
        Ok(self.db.users().list(include_inactive).await?)
    }

    async fn set_password(&self, user: &User, new_password: &str) -> ServiceResult<()> {
        validate_password(new_password, self.config.min_password_length)?;

        let hash = hash_password(new_password)?;
        self.db.users().update_password(&user.id, &hash).await?;

        info!(id = %user.id, "Password changed");
        Ok(())
    }

    async fn ensure_no_other_admin(&self, own_id: Option<&str>) -> ServiceResult<()> {
        if let Some(admin) = self.db.users().active_admin().await? {
            if Some(admin.id.as_str()) != own_id {
                warn!(existing = %admin.username, "Second administrator rejected");
                return Err(CoreError::AdminAlreadyExists {
                    username: admin.username,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn ensure_not_last_admin(&self, user: &User) -> ServiceResult<()> {
        if self.db.users().count_active_admins().await? <= 1 {
            warn!(id = %user.id, "Refusing to remove the only administrator");
            return Err(CoreError::LastAdmin {
                username: user.username.clone(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{employee, test_app};
    use crate::ErrorCode;

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "caja2024!".to_string(),
            role,
            employee_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let app = test_app().await;
        let carlos = employee(&app, "EMP-0001").await;

        let mut input = new_user("carlos.r", UserRole::Seller);
        input.employee_id = Some(carlos.clone());
        let id = app.users().create(input).await.unwrap();

        let stored = app.users().get(&id).await.unwrap();
        assert_ne!(stored.password_hash, "caja2024!");
        assert_eq!(stored.employee_id.as_deref(), Some(carlos.as_str()));

        let user = app.users().authenticate("Carlos.R", "caja2024!").await.unwrap();
        assert_eq!(user.id, id);
        assert!(user.last_login_at.is_some());
        assert!(app.users().get(&id).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_authentication_failures_look_alike() {
        let app = test_app().await;
        let id = app.users().create(new_user("maria", UserRole::Seller)).await.unwrap();

        let wrong = app.users().authenticate("maria", "wrong-pass1").await.unwrap_err();
        let unknown = app.users().authenticate("nobody", "caja2024!").await.unwrap_err();
        assert_eq!(wrong.code, ErrorCode::AuthenticationFailed);
        assert_eq!(wrong.message, unknown.message);

        app.users().deactivate(&id).await.unwrap();
        let inactive = app.users().authenticate("maria", "caja2024!").await.unwrap_err();
        assert_eq!(inactive.code, ErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_credential_rules() {
        let app = test_app().await;

        let mut weak = new_user("pedro", UserRole::Warehouse);
        weak.password = "short1".to_string();
        let err = app.users().create(weak).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = app
            .users()
            .create(new_user("1pedro", UserRole::Warehouse))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        app.users().create(new_user("pedro", UserRole::Warehouse)).await.unwrap();
        let err = app
            .users()
            .create(new_user("PEDRO", UserRole::Seller))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);

        let mut orphan = new_user("lucia", UserRole::Seller);
        orphan.employee_id = Some("missing".to_string());
        let err = app.users().create(orphan).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_single_admin() {
        let app = test_app().await;
        let admin = app.users().create(new_user("admin", UserRole::Admin)).await.unwrap();

        let err = app
            .users()
            .create(new_user("boss", UserRole::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let seller = app.users().create(new_user("maria", UserRole::Seller)).await.unwrap();
        let err = app.users().change_role(&seller, UserRole::Admin).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = app.users().change_role(&admin, UserRole::Seller).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        let err = app.users().deactivate(&admin).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);

        assert_eq!(app.database().users().count_active_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inactive_admin_cannot_return_beside_another() {
        let app = test_app().await;
        let seller = app.users().create(new_user("maria", UserRole::Seller)).await.unwrap();
        app.users().deactivate(&seller).await.unwrap();

        // Inactive accounts do not count as admins.
        app.users().change_role(&seller, UserRole::Admin).await.unwrap();
        app.users().create(new_user("admin", UserRole::Admin)).await.unwrap();

        let err = app.users().activate(&seller).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRule);
    }

    #[tokio::test]
    async fn test_change_and_reset_password() {
        let app = test_app().await;
        let id = app.users().create(new_user("maria", UserRole::Seller)).await.unwrap();

        let err = app
            .users()
            .change_password(&id, "not-current1", "nueva2025!")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);

        app.users().change_password(&id, "caja2024!", "nueva2025!").await.unwrap();
        assert!(app.users().authenticate("maria", "caja2024!").await.is_err());
        app.users().authenticate("maria", "nueva2025!").await.unwrap();

        let err = app.users().reset_password(&id, "abc").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        app.users().reset_password(&id, "reset2025x").await.unwrap();
        app.users().authenticate("maria", "reset2025x").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_admin_bootstraps_once() {
        let app = test_app().await;

        let first = app.users().ensure_admin("admin", "cambiar123").await.unwrap();
        assert!(first.is_some());

        let second = app.users().ensure_admin("admin2", "cambiar123").await.unwrap();
        assert!(second.is_none());

        let admin = app.users().authenticate("admin", "cambiar123").await.unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(app.users().list(false).await.unwrap().len(), 1);
    }
}
