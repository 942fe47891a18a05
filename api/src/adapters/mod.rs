//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod postgres;
pub mod realtime;

pub use postgres::{
    run_migrations, PostgresActivityLogRepository, PostgresAgendaRepository,
    PostgresCatalogRepository, PostgresFinancialRepository, PostgresLaudoRepository,
    PostgresLawyerRepository, PostgresNotificationRepository, PostgresPericiaRepository,
    PostgresTelepericiaRepository, PostgresTenantRepository,
};
pub use realtime::NotificationHub;
