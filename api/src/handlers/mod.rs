//! HTTP handlers
//!
//! Axum request handlers for the API endpoints. Every handler except
//! `create_tenant` runs behind the tenant middleware and reads the caller
//! from `Extension<RequestContext>`.

use serde::Serialize;

pub mod agenda;
pub mod analytics_calendar;
pub mod config;
pub mod dashboard;
pub mod financial;
pub mod laudos;
pub mod lawyers;
pub mod notifications;
pub mod pericias;
pub mod telepericia;
pub mod tenants;

pub use agenda::{
    apply_laudo_blocks, create_event, create_task, list_batches, list_events, list_tasks,
    preview_batch, schedule_batch, suggest_laudo_blocks, update_event, update_task,
    weekly_report, weekly_workload,
};
pub use analytics_calendar::get_calendar_overview;
pub use config::{create_item, delete_item, get_item, list_items, update_item};
pub use dashboard::{
    get_bucket, get_city_overview, get_dashboard, get_fila_agendamento, get_laudos_pendentes,
    get_nomeacoes, get_pericias_hoje, get_stage, list_city_overviews,
};
pub use financial::{
    create_expense, create_receipt, get_analytics, get_analytics_timeline, import_statement,
    list_expenses, list_receipts, list_unmatched, reconcile,
};
pub use laudos::{create_laudo, delete_laudo, get_laudo, list_laudos, update_laudo};
pub use lawyers::{
    create_lawyer, delete_lawyer, get_lawyer, link_pericia, list_lawyers, list_pericia_lawyers,
    update_lawyer,
};
pub use notifications::{
    list_rules, push_realtime, schedule_digest, stream_notifications, upsert_rule,
};
pub use pericias::{
    batch_update_pericias, change_status, create_pericia, delete_pericia, export_pericias,
    get_pericia, get_timeline, import_pericias, list_pericias, set_urgency, update_pericia,
};
pub use telepericia::{
    assign_to_slot, create_slot, delete_slot, delete_slot_item, get_slot, list_slots,
    reorder_slot, update_slot,
};
pub use tenants::{create_tenant, get_current_tenant};

/// Body of a successful DELETE
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn yes() -> Self {
        Self { deleted: true }
    }
}
