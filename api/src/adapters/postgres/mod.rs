//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod activity_repo;
pub mod agenda_repo;
pub mod catalog_repo;
pub mod criteria;
pub mod financial_repo;
pub mod laudo_repo;
pub mod lawyer_repo;
pub mod notification_repo;
pub mod pericia_repo;
pub mod telepericia_repo;
pub mod tenant_repo;


pub use activity_repo::PostgresActivityLogRepository;
pub use agenda_repo::PostgresAgendaRepository;
pub use catalog_repo::PostgresCatalogRepository;
pub use financial_repo::PostgresFinancialRepository;
pub use laudo_repo::PostgresLaudoRepository;
pub use lawyer_repo::PostgresLawyerRepository;
pub use notification_repo::PostgresNotificationRepository;
pub use pericia_repo::PostgresPericiaRepository;
pub use telepericia_repo::PostgresTelepericiaRepository;
pub use tenant_repo::PostgresTenantRepository;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, SqlErr};

use crate::error::DomainError;

const INIT_SCHEMA: &str = include_str!("../../../migrations/0001_init.sql");

/// Map a unique-constraint failure to `AlreadyExists`, anything else to `Database`
pub(crate) fn unique_violation(err: DbErr, message: String) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyExists(message),
        _ => DomainError::Database(err.to_string()),
    }
}

/// Apply the bundled schema; every statement is idempotent
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DomainError> {
    db.execute_unprepared(INIT_SCHEMA)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;
    tracing::info!("Database schema applied");
    Ok(())
}
