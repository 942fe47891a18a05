//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).
//!
//! Every method takes the caller's `TenantId`. Records owned by another
//! tenant are invisible: lookups return `None` and mutations fail with
//! `DomainError::NotFound`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::criteria::{PericiaCriterion, PericiaQuery};
use crate::domain::entities::{
    ActivityLog, AgendaEvent, AgendaEventId, AgendaTask, AgendaTaskId, CatalogItem, CatalogItemId,
    CatalogItemPatch, CatalogResource, CaseRole, Despesa, ImportBatch, Laudo, LaudoId, Lawyer,
    LawyerId, LawyerOnPericia, NewActivityLog, NewAgendaEvent, NewAgendaTask, NewCatalogItem,
    NewDespesa, NewLaudo, NewLawyer, NewPericia, NewRecebimento, NewSchedulingBatch,
    NewUnmatchedPayment, NotificationChannel, NotificationConfig, Pericia, PericiaId,
    NewTeleSlot, PericiaPatch, Recebimento, ScheduleUpdate, SchedulingBatch, StatusChange,
    StatusLog, TeleSlot, TeleSlotId, TeleSlotItem, TeleSlotItemId, Tenant, TenantId,
    UnmatchedPayment, UnmatchedPaymentId,
};
use crate::error::DomainError;

/// Repository for tenants
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError>;

    async fn create(&self, nome: &str) -> Result<Tenant, DomainError>;
}

/// Repository for catalog (config) items
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// List items of one resource, ordered by `ordem` then `nome`
    async fn list(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
    ) -> Result<Vec<CatalogItem>, DomainError>;

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, DomainError>;

    async fn find_by_codigo(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        codigo: &str,
    ) -> Result<Option<CatalogItem>, DomainError>;

    /// Status ids keyed by code; codes absent from the catalog are omitted
    async fn find_status_ids_by_codes(
        &self,
        tenant: &TenantId,
        codes: &[&str],
    ) -> Result<HashMap<String, CatalogItemId>, DomainError>;

    async fn create(
        &self,
        tenant: &TenantId,
        item: &NewCatalogItem,
    ) -> Result<CatalogItem, DomainError>;

    async fn update(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
        patch: CatalogItemPatch,
    ) -> Result<CatalogItem, DomainError>;

    async fn delete(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<(), DomainError>;
}

/// Repository for perícias and their status history
#[async_trait]
pub trait PericiaRepository: Send + Sync {
    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Option<Pericia>, DomainError>;

    /// Which of `ids` exist for the tenant
    async fn existing_ids(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
    ) -> Result<HashSet<PericiaId>, DomainError>;

    async fn find_by_cnj(
        &self,
        tenant: &TenantId,
        processo_cnj: &str,
    ) -> Result<Option<Pericia>, DomainError>;

    async fn query(
        &self,
        tenant: &TenantId,
        query: &PericiaQuery,
    ) -> Result<Vec<Pericia>, DomainError>;

    async fn count(
        &self,
        tenant: &TenantId,
        criteria: &[PericiaCriterion],
    ) -> Result<u64, DomainError>;

    async fn create(&self, tenant: &TenantId, pericia: &NewPericia)
        -> Result<Pericia, DomainError>;

    /// Insert all rows or none
    async fn create_many(
        &self,
        tenant: &TenantId,
        pericias: &[NewPericia],
    ) -> Result<u64, DomainError>;

    async fn update(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
        patch: &PericiaPatch,
    ) -> Result<Pericia, DomainError>;

    /// Apply the same patch to every listed perícia of the tenant
    async fn update_many(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
        patch: &PericiaPatch,
    ) -> Result<u64, DomainError>;

    async fn delete(&self, tenant: &TenantId, id: &PericiaId) -> Result<(), DomainError>;

    /// Update the perícia and append its status log in one transaction
    async fn apply_status_change(
        &self,
        tenant: &TenantId,
        change: &StatusChange,
    ) -> Result<Pericia, DomainError>;

    /// Status log entries of a perícia, newest first
    async fn status_logs(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Vec<StatusLog>, DomainError>;

    /// The tenant's status log entries written within `[from, to]`, oldest first
    async fn status_logs_between(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StatusLog>, DomainError>;

    /// Set or clear the scheduled date of several perícias in one
    /// transaction; ids of other tenants are skipped
    async fn set_schedules(
        &self,
        tenant: &TenantId,
        updates: &[ScheduleUpdate],
    ) -> Result<u64, DomainError>;
}

/// Repository for the generic activity audit trail
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn record(
        &self,
        tenant: &TenantId,
        entry: &NewActivityLog,
    ) -> Result<ActivityLog, DomainError>;

    async fn list_for_entity(
        &self,
        tenant: &TenantId,
        entity_id: &uuid::Uuid,
    ) -> Result<Vec<ActivityLog>, DomainError>;
}

/// Repository for agenda events, tasks and scheduling batches
#[async_trait]
pub trait AgendaRepository: Send + Sync {
    async fn create_event(
        &self,
        tenant: &TenantId,
        event: &NewAgendaEvent,
    ) -> Result<AgendaEvent, DomainError>;

    async fn find_event(
        &self,
        tenant: &TenantId,
        id: &AgendaEventId,
    ) -> Result<Option<AgendaEvent>, DomainError>;

    /// Events ordered by start; when a window is given, only events
    /// starting within `[from, to)`
    async fn list_events(
        &self,
        tenant: &TenantId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<AgendaEvent>, DomainError>;

    /// Events whose occupied interval intersects `[from, to)`, ordered by
    /// start; an event without an end occupies its default duration
    async fn overlapping_events(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AgendaEvent>, DomainError>;

    /// Persist every field of an existing event
    async fn save_event(&self, event: &AgendaEvent) -> Result<AgendaEvent, DomainError>;

    /// Insert all events or none
    async fn create_events(
        &self,
        tenant: &TenantId,
        events: &[NewAgendaEvent],
    ) -> Result<Vec<AgendaEvent>, DomainError>;

    /// Insert the events and the batch record in one transaction
    async fn create_batch(
        &self,
        tenant: &TenantId,
        events: &[NewAgendaEvent],
        batch: &NewSchedulingBatch,
    ) -> Result<SchedulingBatch, DomainError>;

    /// Batches, newest first
    async fn list_batches(&self, tenant: &TenantId) -> Result<Vec<SchedulingBatch>, DomainError>;

    async fn create_task(
        &self,
        tenant: &TenantId,
        task: &NewAgendaTask,
    ) -> Result<AgendaTask, DomainError>;

    async fn find_task(
        &self,
        tenant: &TenantId,
        id: &AgendaTaskId,
    ) -> Result<Option<AgendaTask>, DomainError>;

    /// Tasks ordered by due date, undated last
    async fn list_tasks(&self, tenant: &TenantId) -> Result<Vec<AgendaTask>, DomainError>;

    async fn save_task(&self, task: &AgendaTask) -> Result<AgendaTask, DomainError>;
}

/// Repository for lawyers
#[async_trait]
pub trait LawyerRepository: Send + Sync {
    async fn create(&self, tenant: &TenantId, lawyer: &NewLawyer) -> Result<Lawyer, DomainError>;

    /// Lawyers ordered by name
    async fn list(&self, tenant: &TenantId) -> Result<Vec<Lawyer>, DomainError>;

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &LawyerId,
    ) -> Result<Option<Lawyer>, DomainError>;

    async fn save(&self, lawyer: &Lawyer) -> Result<Lawyer, DomainError>;

    async fn delete(&self, tenant: &TenantId, id: &LawyerId) -> Result<(), DomainError>;

    /// Fails with `AlreadyExists` when the pair is already linked
    async fn link(&self, tenant: &TenantId, link: &LawyerOnPericia) -> Result<(), DomainError>;

    async fn list_for_pericia(
        &self,
        tenant: &TenantId,
        pericia_id: &PericiaId,
    ) -> Result<Vec<(Lawyer, CaseRole)>, DomainError>;
}

/// Repository for laudos
#[async_trait]
pub trait LaudoRepository: Send + Sync {
    async fn create(&self, tenant: &TenantId, laudo: &NewLaudo) -> Result<Laudo, DomainError>;

    /// Newest first, optionally restricted to one perícia
    async fn list(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Laudo>, DomainError>;

    async fn find_by_id(&self, tenant: &TenantId, id: &LaudoId)
        -> Result<Option<Laudo>, DomainError>;

    async fn save(&self, laudo: &Laudo) -> Result<Laudo, DomainError>;

    async fn delete(&self, tenant: &TenantId, id: &LaudoId) -> Result<(), DomainError>;
}

/// Repository for telepericia slots and their items
#[async_trait]
pub trait TelepericiaRepository: Send + Sync {
    async fn create_slot(
        &self,
        tenant: &TenantId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError>;

    /// Slots with their items, ordered by date and start time
    async fn list_slots(&self, tenant: &TenantId) -> Result<Vec<TeleSlot>, DomainError>;

    async fn find_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
    ) -> Result<Option<TeleSlot>, DomainError>;

    /// Replace the slot configuration; items are kept
    async fn update_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError>;

    /// Delete the slot and its items
    async fn delete_slot(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<(), DomainError>;

    async fn add_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        pericia_id: &PericiaId,
        order_index: i32,
    ) -> Result<TeleSlotItem, DomainError>;

    /// Number the slot's items by their position in `ordered`, in one transaction
    async fn set_item_order(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        ordered: &[TeleSlotItemId],
    ) -> Result<(), DomainError>;

    /// Delete the item and renumber the remaining ones from zero, in one transaction
    async fn remove_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        item_id: &TeleSlotItemId,
    ) -> Result<(), DomainError>;
}

/// Repository for receipts, expenses and bank imports
#[async_trait]
pub trait FinancialRepository: Send + Sync {
    async fn create_receipt(
        &self,
        tenant: &TenantId,
        receipt: &NewRecebimento,
    ) -> Result<Recebimento, DomainError>;

    /// Receipts, newest first, optionally restricted to one perícia
    async fn list_receipts(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Recebimento>, DomainError>;

    async fn create_expense(
        &self,
        tenant: &TenantId,
        expense: &NewDespesa,
    ) -> Result<Despesa, DomainError>;

    /// Expenses, newest first
    async fn list_expenses(&self, tenant: &TenantId) -> Result<Vec<Despesa>, DomainError>;

    /// Create the batch, its matched receipts and unmatched lines in one
    /// transaction
    async fn import_batch(
        &self,
        tenant: &TenantId,
        source_file_name: Option<&str>,
        matched: &[NewRecebimento],
        unmatched: &[NewUnmatchedPayment],
    ) -> Result<ImportBatch, DomainError>;

    /// Lines still waiting for reconciliation, newest first
    async fn list_unmatched(&self, tenant: &TenantId) -> Result<Vec<UnmatchedPayment>, DomainError>;

    /// Mark lines as matched; returns how many changed
    async fn reconcile(
        &self,
        tenant: &TenantId,
        ids: &[UnmatchedPaymentId],
        notes: Option<&str>,
    ) -> Result<u64, DomainError>;
}

/// Repository for notification channel rules
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert or update the rule of one channel
    async fn upsert(
        &self,
        tenant: &TenantId,
        channel: NotificationChannel,
        enabled: Option<bool>,
        config: Option<serde_json::Value>,
    ) -> Result<NotificationConfig, DomainError>;

    async fn list(&self, tenant: &TenantId) -> Result<Vec<NotificationConfig>, DomainError>;
}
