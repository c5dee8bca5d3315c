//! # electrotech-service: Service Layer for ElectroTech
//!
//! Validates input, enforces the store's business rules and calls the
//! repositories in `electrotech-db`.
//!
//! ## Module Organization
//! ```text
//! electrotech_service/
//! ├── lib.rs          ◄─── You are here (ElectroTech handle, tracing)
//! ├── config.rs       ◄─── AppConfig (env overrides, currency format)
//! ├── error.rs        ◄─── ServiceError / ErrorCode
//! ├── password.rs     ◄─── argon2 hashing
//! └── services/
//!     ├── category.rs, supplier.rs, product.rs       catalogue
//!     ├── client.rs, employee.rs, user.rs            people and accounts
//!     ├── payment_method.rs
//!     ├── sale.rs, purchase.rs, returns.rs           documents (stock moves)
//!     └── report.rs                                  summaries
//! ```
//!
//! ## Every Operation Has the Same Shape
//! ```text
//! validate fields ──► check references / rules ──► repository ──► log ──► Ok(id | ())
//!        │                      │                        │
//!        └──────────────────────┴────────────────────────┴──► Err(ServiceError)
//! ```
//!
//! ## Example
//! ```rust,no_run
//! # async fn demo() -> Result<(), electrotech_service::ServiceError> {
//! use electrotech_service::{AppConfig, ElectroTech};
//! use electrotech_service::services::CategoryInput;
//!
//! let app = ElectroTech::open(AppConfig::default()).await?;
//! let laptops = app
//!     .categories()
//!     .create(CategoryInput {
//!         name: "Laptops".to_string(),
//!         description: None,
//!     })
//!     .await?;
//! # let _ = laptops;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use electrotech_db::{Database, DbConfig};

pub use config::{AppConfig, ConfigError};
pub use error::{ErrorCode, ServiceError, ServiceResult};

use services::{
    CategoryService, ClientService, EmployeeService, PaymentMethodService, ProductService,
    PurchaseService, ReportService, ReturnService, SaleService, SupplierService, UserService,
};

/// Application handle: database plus configuration.
///
/// Cheap to clone. Each accessor hands out a service sharing the same pool
/// and configuration.
#[derive(Debug, Clone)]
pub struct ElectroTech {
    db: Database,
    config: Arc<AppConfig>,
}

impl ElectroTech {
    /// Opens (or creates) the configured database and applies migrations.
    ///
    /// ## Startup Sequence
    /// 1. Create the data directory if needed
    /// 2. Connect (WAL, foreign keys on)
    /// 3. Run pending migrations
    pub async fn open(config: AppConfig) -> ServiceResult<Self> {
        let db_config = DbConfig::new(config.database_path.clone());
        let db_config = if db_config.is_in_memory() {
            DbConfig::in_memory()
        } else {
            ensure_data_dir(&config.database_path)?;
            db_config
        };

        let db = Database::new(db_config).await?;

        info!(
            store = %config.store_name,
            tax_bps = config.default_tax_rate_bps,
            "ElectroTech ready"
        );

        Ok(Self::with_database(db, config))
    }

    /// Fresh in-memory store with default settings.
    pub async fn in_memory() -> ServiceResult<Self> {
        Self::open(AppConfig::in_memory()).await
    }

    pub fn with_database(db: Database, config: AppConfig) -> Self {
        ElectroTech {
            db,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn categories(&self) -> CategoryService {
        CategoryService::new(self.db.clone())
    }

    pub fn suppliers(&self) -> SupplierService {
        SupplierService::new(self.db.clone(), self.config.clone())
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.db.clone(), self.config.clone())
    }

    pub fn clients(&self) -> ClientService {
        ClientService::new(self.db.clone(), self.config.clone())
    }

    pub fn employees(&self) -> EmployeeService {
        EmployeeService::new(self.db.clone(), self.config.clone())
    }

    pub fn payment_methods(&self) -> PaymentMethodService {
        PaymentMethodService::new(self.db.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone(), self.config.clone())
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.db.clone(), self.config.clone())
    }

    pub fn purchases(&self) -> PurchaseService {
        PurchaseService::new(self.db.clone(), self.config.clone())
    }

    pub fn returns(&self) -> ReturnService {
        ReturnService::new(self.db.clone(), self.config.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone())
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

fn ensure_data_dir(database_path: &Path) -> ServiceResult<()> {
    match database_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir).map_err(|e| {
            tracing::error!(dir = %dir.display(), "Cannot create data directory: {}", e);
            ServiceError::internal("Cannot create data directory")
        }),
        _ => Ok(()),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=electrotech_db=trace` - Show trace for the database crate only
/// - Default: `info,electrotech=debug,sqlx=warn`
///
/// Calling it again after a subscriber is installed does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,electrotech=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
