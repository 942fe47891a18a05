//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities and ports; the pure rule
//! modules (`status_engine`, `dashboard_rules`, `stage_filter`,
//! `scheduling`, `city_overview`) perform no I/O.

pub mod agenda_service;
pub mod analytics_calendar;
pub mod catalog_service;
pub mod city_overview;
pub mod dashboard_rules;
pub mod financial_service;
pub mod laudo_service;
pub mod lawyer_service;
pub mod notification_service;
pub mod pericia_service;
pub mod scheduling;
pub mod stage_filter;
pub mod status_engine;
pub mod telepericia_service;

pub use agenda_service::AgendaService;
pub use analytics_calendar::AnalyticsCalendarService;
pub use catalog_service::CatalogService;
pub use financial_service::FinancialService;
pub use laudo_service::LaudoService;
pub use lawyer_service::LawyerService;
pub use notification_service::NotificationService;
pub use pericia_service::PericiaService;
pub use telepericia_service::TelepericiaService;
