//! Agenda domain entities
//!
//! Calendar events, to-do tasks and the record of batch scheduling
//! operations (lotes).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogItemId, PericiaId, TenantId};

entity_id!(
    /// Unique identifier for an agenda event
    AgendaEventId
);

entity_id!(
    /// Unique identifier for an agenda task
    AgendaTaskId
);

entity_id!(
    /// Unique identifier for a scheduling batch
    SchedulingBatchId
);

/// Assumed length of an event that has no end time
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Shortest duration an event counts for in workload figures
pub const MIN_EVENT_MINUTES: i64 = 15;

wire_enum!(
    /// Kind of calendar entry
    EventType {
        Pericia => "PERICIA",
        BlocoTrabalho => "BLOCO_TRABALHO",
        Prazo => "PRAZO",
        Reuniao => "REUNIAO",
        Outro => "OUTRO",
    } default Outro
);

wire_enum!(
    /// Lifecycle of a calendar entry
    EventStatus {
        Agendada => "AGENDADA",
        Confirmada => "CONFIRMADA",
        Realizada => "REALIZADA",
        Cancelada => "CANCELADA",
        Remarcada => "REMARCADA",
    } default Agendada
);

wire_enum!(
    /// Where an event came from
    EventSource {
        Manual => "MANUAL",
        Lote => "LOTE",
        Ia => "IA",
        Externo => "EXTERNO",
    } default Manual
);

wire_enum!(
    TaskStatus {
        Todo => "TODO",
        Doing => "DOING",
        Done => "DONE",
    } default Todo
);

wire_enum!(
    /// Lote lifecycle; only confirmed batches block re-scheduling
    BatchStatus {
        Pendente => "PENDENTE",
        Confirmado => "CONFIRMADO",
    } default Pendente
);

/// One recorded status change of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub from: EventStatus,
    pub to: EventStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaEvent {
    pub id: AgendaEventId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub status: EventStatus,
    pub source: EventSource,
    pub ai_suggested: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub pericia_id: Option<PericiaId>,
    pub cnj_id: Option<String>,
    pub city_id: Option<CatalogItemId>,
    pub city: Option<String>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgendaEvent {
    /// End time, assuming the default length when none was given
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_at
            .unwrap_or(self.start_at + Duration::minutes(DEFAULT_EVENT_MINUTES))
    }

    /// Minutes this event occupies, never below `MIN_EVENT_MINUTES`
    pub fn allocated_minutes(&self) -> i64 {
        let ms = (self.effective_end() - self.start_at).num_milliseconds();
        let minutes = (ms as f64 / 60_000.0).round() as i64;
        minutes.max(MIN_EVENT_MINUTES)
    }

    /// Half-open interval overlap with `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_at < end && start < self.effective_end()
    }

    pub fn is_active(&self) -> bool {
        self.status != EventStatus::Cancelada
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewAgendaEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub status: EventStatus,
    pub source: EventSource,
    pub ai_suggested: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub pericia_id: Option<PericiaId>,
    pub cnj_id: Option<String>,
    pub city_id: Option<CatalogItemId>,
    pub city: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct AgendaEventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaTask {
    pub id: AgendaTaskId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: i16,
    pub pericia_id: Option<PericiaId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAgendaTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: i16,
    pub pericia_id: Option<PericiaId>,
}

#[derive(Debug, Clone, Default)]
pub struct AgendaTaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Option<i16>,
}

/// One scheduled row of a lote, as recorded in the batch result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub pericia_id: Option<PericiaId>,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub status: BatchStatus,
    pub created: usize,
    pub items: Vec<BatchItemResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingBatch {
    pub id: SchedulingBatchId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub date_ref: DateTime<Utc>,
    #[serde(rename = "criteriaJson")]
    pub criteria: serde_json::Value,
    #[serde(rename = "resultJson")]
    pub result: BatchResult,
    pub created_at: DateTime<Utc>,
}

impl SchedulingBatch {
    pub fn is_confirmed(&self) -> bool {
        self.result.status == BatchStatus::Confirmado
    }
}

#[derive(Debug, Clone)]
pub struct NewSchedulingBatch {
    pub date_ref: DateTime<Utc>,
    pub criteria: serde_json::Value,
    pub result: BatchResult,
}
