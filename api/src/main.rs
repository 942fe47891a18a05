//! Gestor Pericial API Server
//!
//! Multi-tenant case management for court-appointed experts: perícias and
//! their workflow, agenda and batch scheduling, telepericia slots, lawyers,
//! laudos, finances, the analytics calendar and notifications.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod report;
mod tenancy;
mod validation;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod integration_tests;

use adapters::{
    run_migrations, NotificationHub, PostgresActivityLogRepository, PostgresAgendaRepository,
    PostgresCatalogRepository, PostgresFinancialRepository, PostgresLaudoRepository,
    PostgresLawyerRepository, PostgresNotificationRepository, PostgresPericiaRepository,
    PostgresTelepericiaRepository, PostgresTenantRepository,
};
use app::{
    AgendaService, AnalyticsCalendarService, CatalogService, FinancialService, LaudoService,
    LawyerService, NotificationService, PericiaService, TelepericiaService,
};
use config::Config;
use tenancy::tenant_middleware;

type Pericias = PericiaService<
    PostgresPericiaRepository,
    PostgresCatalogRepository,
    PostgresActivityLogRepository,
    PostgresFinancialRepository,
>;
type Agenda =
    AgendaService<PostgresAgendaRepository, PostgresPericiaRepository, PostgresCatalogRepository>;
type Financial = FinancialService<
    PostgresFinancialRepository,
    PostgresPericiaRepository,
    PostgresCatalogRepository,
>;
type Telepericia = TelepericiaService<PostgresTelepericiaRepository, PostgresPericiaRepository>;
type AnalyticsCalendar = AnalyticsCalendarService<
    PostgresPericiaRepository,
    PostgresFinancialRepository,
    PostgresCatalogRepository,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pericia_service: Arc<Pericias>,
    pub catalog_service: Arc<CatalogService<PostgresCatalogRepository>>,
    pub agenda_service: Arc<Agenda>,
    pub lawyer_service: Arc<LawyerService<PostgresLawyerRepository, PostgresPericiaRepository>>,
    pub laudo_service: Arc<LaudoService<PostgresLaudoRepository, PostgresPericiaRepository>>,
    pub financial_service: Arc<Financial>,
    pub telepericia_service: Arc<Telepericia>,
    pub analytics_calendar_service: Arc<AnalyticsCalendar>,
    pub notification_service:
        Arc<NotificationService<PostgresNotificationRepository, NotificationHub>>,
    pub notification_hub: Arc<NotificationHub>,
    pub tenant_repo: Arc<PostgresTenantRepository>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gestor_pericial_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gestor Pericial API...");

    let config = Config::from_env().context("Invalid configuration")?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    if config.run_migrations {
        run_migrations(&db)
            .await
            .context("Failed to apply migrations")?;
        tracing::info!("Migrations applied");
    }

    // Create adapters
    let tenant_repo = Arc::new(PostgresTenantRepository::new(db.clone()));
    let catalog_repo = Arc::new(PostgresCatalogRepository::new(db.clone()));
    let pericia_repo = Arc::new(PostgresPericiaRepository::new(db.clone()));
    let activity_repo = Arc::new(PostgresActivityLogRepository::new(db.clone()));
    let agenda_repo = Arc::new(PostgresAgendaRepository::new(db.clone()));
    let lawyer_repo = Arc::new(PostgresLawyerRepository::new(db.clone()));
    let laudo_repo = Arc::new(PostgresLaudoRepository::new(db.clone()));
    let financial_repo = Arc::new(PostgresFinancialRepository::new(db.clone()));
    let notification_repo = Arc::new(PostgresNotificationRepository::new(db.clone()));
    let telepericia_repo = Arc::new(PostgresTelepericiaRepository::new(db.clone()));
    let notification_hub = Arc::new(NotificationHub::new());

    // Create application services
    let offset = config.local_offset;
    let state = AppState {
        pericia_service: Arc::new(PericiaService::new(
            pericia_repo.clone(),
            catalog_repo.clone(),
            activity_repo,
            financial_repo.clone(),
            offset,
        )),
        catalog_service: Arc::new(CatalogService::new(catalog_repo.clone())),
        agenda_service: Arc::new(AgendaService::new(
            agenda_repo,
            pericia_repo.clone(),
            catalog_repo.clone(),
            offset,
        )),
        lawyer_service: Arc::new(LawyerService::new(lawyer_repo, pericia_repo.clone())),
        laudo_service: Arc::new(LaudoService::new(laudo_repo, pericia_repo.clone())),
        financial_service: Arc::new(FinancialService::new(
            financial_repo.clone(),
            pericia_repo.clone(),
            catalog_repo.clone(),
            offset,
        )),
        telepericia_service: Arc::new(TelepericiaService::new(
            telepericia_repo,
            pericia_repo.clone(),
            offset,
        )),
        analytics_calendar_service: Arc::new(AnalyticsCalendarService::new(
            pericia_repo,
            financial_repo,
            catalog_repo,
            offset,
        )),
        notification_service: Arc::new(NotificationService::new(
            notification_repo,
            notification_hub.clone(),
        )),
        notification_hub,
        tenant_repo: tenant_repo.clone(),
    };

    // Bulk writes are rate limited per peer IP
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(config.bulk_rate_per_second)
            .burst_size(config.bulk_rate_burst)
            .finish()
            .context("Failed to build governor config")?,
    );

    let bulk_routes = Router::new()
        .route("/pericias/import", post(handlers::import_pericias))
        .route("/pericias/batch-update", post(handlers::batch_update_pericias))
        .route(
            "/agenda/batch-scheduling",
            get(handlers::list_batches).post(handlers::schedule_batch),
        )
        .route("/financial/import", post(handlers::import_statement))
        .layer(GovernorLayer {
            config: governor_config.clone(),
        });

    // Routes that need X-Tenant-Id
    let tenant_routes = Router::new()
        .route("/tenants/current", get(handlers::get_current_tenant))
        // Perícias
        .route(
            "/pericias",
            get(handlers::list_pericias).post(handlers::create_pericia),
        )
        .route("/pericias/export", get(handlers::export_pericias))
        .route("/pericias/change-status", post(handlers::change_status))
        .route("/pericias/urgency", post(handlers::set_urgency))
        .route("/pericias/dashboard", get(handlers::get_dashboard))
        .route("/pericias/dashboard/:bucket", get(handlers::get_bucket))
        .route("/pericias/stages/:stage", get(handlers::get_stage))
        .route(
            "/pericias/cities/overview",
            get(handlers::list_city_overviews),
        )
        .route(
            "/pericias/cities/:id/overview",
            get(handlers::get_city_overview),
        )
        .route(
            "/pericias/:id",
            get(handlers::get_pericia)
                .patch(handlers::update_pericia)
                .delete(handlers::delete_pericia),
        )
        .route("/pericias/:id/timeline", get(handlers::get_timeline))
        .route("/pericias/:id/lawyers", get(handlers::list_pericia_lawyers))
        // Operational views
        .route("/nomeacoes", get(handlers::get_nomeacoes))
        .route("/pericias-hoje", get(handlers::get_pericias_hoje))
        .route("/laudos-pendentes", get(handlers::get_laudos_pendentes))
        .route("/fila-agendamento", get(handlers::get_fila_agendamento))
        // Catalog
        .route(
            "/config/:resource",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/config/:resource/:id",
            get(handlers::get_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        // Agenda
        .route(
            "/agenda/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/agenda/events/:id", patch(handlers::update_event))
        .route(
            "/agenda/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/agenda/tasks/:id", patch(handlers::update_task))
        .route(
            "/agenda/batch-scheduling/preview",
            post(handlers::preview_batch),
        )
        .route("/agenda/weekly-workload", get(handlers::weekly_workload))
        .route("/agenda/weekly-report", get(handlers::weekly_report))
        .route(
            "/agenda/laudo-blocks/suggest",
            post(handlers::suggest_laudo_blocks),
        )
        .route(
            "/agenda/laudo-blocks/apply",
            post(handlers::apply_laudo_blocks),
        )
        // Lawyers
        .route(
            "/lawyers",
            get(handlers::list_lawyers).post(handlers::create_lawyer),
        )
        .route(
            "/lawyers/:id",
            get(handlers::get_lawyer)
                .patch(handlers::update_lawyer)
                .delete(handlers::delete_lawyer),
        )
        .route("/lawyers/:id/pericias", post(handlers::link_pericia))
        // Laudos
        .route(
            "/laudos",
            get(handlers::list_laudos).post(handlers::create_laudo),
        )
        .route(
            "/laudos/:id",
            get(handlers::get_laudo)
                .patch(handlers::update_laudo)
                .delete(handlers::delete_laudo),
        )
        // Financial
        .route(
            "/financial/receipts",
            get(handlers::list_receipts).post(handlers::create_receipt),
        )
        .route(
            "/financial/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/financial/unmatched", get(handlers::list_unmatched))
        .route("/financial/reconcile", post(handlers::reconcile))
        .route("/financial/analytics", get(handlers::get_analytics))
        .route(
            "/financial/analytics/timeline",
            get(handlers::get_analytics_timeline),
        )
        .route(
            "/analytics-calendar/overview",
            get(handlers::get_calendar_overview),
        )
        // Telepericia
        .route(
            "/telepericia/slots",
            get(handlers::list_slots).post(handlers::create_slot),
        )
        .route(
            "/telepericia/slots/:id",
            get(handlers::get_slot)
                .patch(handlers::update_slot)
                .delete(handlers::delete_slot),
        )
        .route(
            "/telepericia/slots/:id/assign",
            post(handlers::assign_to_slot),
        )
        .route(
            "/telepericia/slots/:id/reorder",
            patch(handlers::reorder_slot),
        )
        .route(
            "/telepericia/slots/:id/items/:item_id",
            delete(handlers::delete_slot_item),
        )
        // Notifications
        .route(
            "/notifications/rules",
            get(handlers::list_rules).post(handlers::upsert_rule),
        )
        .route("/notifications/digest", post(handlers::schedule_digest))
        .route("/notifications/realtime", post(handlers::push_realtime))
        .route(
            "/notifications/stream",
            get(handlers::stream_notifications),
        )
        .merge(bulk_routes)
        .layer(middleware::from_fn_with_state(
            tenant_repo,
            tenant_middleware::<PostgresTenantRepository>,
        ));

    // Tenant provisioning (no tenant header)
    let provisioning_routes = Router::new()
        .route("/tenants", post(handlers::create_tenant))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .merge(provisioning_routes)
        .merge(tenant_routes)
        // Middleware
        .layer(cors_layer(&config.frontend_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
