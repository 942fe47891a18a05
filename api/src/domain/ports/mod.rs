//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod realtime;
pub mod repositories;

pub use realtime::NotificationPublisher;
pub use repositories::{
    ActivityLogRepository, AgendaRepository, CatalogRepository, FinancialRepository,
    LaudoRepository, LawyerRepository, NotificationRepository, PericiaRepository,
    TelepericiaRepository, TenantRepository,
};
