//! Agenda service
//!
//! Calendar events and tasks, lote (batch) scheduling with server-side
//! conflict checks, weekly workload and report, and laudo work blocks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::app::scheduling::{
    check_planning_date, detect_conflicts, local_date, local_midnight, plan_lot,
    suggest_laudo_blocks, week_start, weekly_workload, BlockPlan, BlockRequest, LotCandidate, LotParams, PlannedSlot,
    SchedulingConflict, WeeklyWorkload,
};
use crate::domain::entities::{
    AgendaEvent, AgendaEventId, AgendaEventPatch, AgendaTask, AgendaTaskId, AgendaTaskPatch,
    BatchItemResult, BatchResult, BatchStatus, CatalogItemId, CatalogResource, EventSource,
    EventStatus, EventType, NewAgendaEvent, NewAgendaTask, NewSchedulingBatch, PericiaId,
    SchedulingBatch, SchedulingBatchId, StatusHistoryEntry, TenantId,
};
use crate::domain::ports::{AgendaRepository, CatalogRepository, PericiaRepository};
use crate::error::AppError;
use crate::report::{render_weekly_report, ReportMode};

/// Title of lote events submitted without one
pub const BATCH_DEFAULT_TITLE: &str = "Agendamento";
/// Title of laudo blocks submitted without one
pub const BLOCK_DEFAULT_TITLE: &str = "Bloco de Laudo";

/// Wizard parameters stored verbatim as the batch criteria
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub city_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalidade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One row of a submitted lote
#[derive(Debug, Clone, Default)]
pub struct BatchItem {
    pub pericia_id: Option<PericiaId>,
    pub cnj_id: Option<String>,
    pub city_id: Option<CatalogItemId>,
    pub city: Option<String>,
    pub title: Option<String>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub source: Option<EventSource>,
    pub ai_suggested: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreated {
    pub created: usize,
    pub batch_id: SchedulingBatchId,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPreview {
    pub items: Vec<PlannedSlot>,
    pub conflicts: Vec<SchedulingConflict>,
    pub valid: bool,
}

/// An accepted laudo block suggestion
#[derive(Debug, Clone)]
pub struct LaudoBlockItem {
    pub title: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pericia_id: Option<PericiaId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlocksApplied {
    pub created: usize,
}

/// Weekly report with its text rendering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
    pub totals: WeeklyWorkload,
}

fn check_interval(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<(), String> {
    match end {
        Some(end) if end <= start => Err("Término deve ser posterior ao início".to_string()),
        _ => Ok(()),
    }
}

fn check_priority(priority: i16) -> Result<(), AppError> {
    if !(1..=5).contains(&priority) {
        return Err(AppError::BadRequest(
            "Prioridade deve estar entre 1 e 5".to_string(),
        ));
    }
    Ok(())
}

fn non_blank(title: Option<String>, default: &str) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub struct AgendaService<A, P, C>
where
    A: AgendaRepository,
    P: PericiaRepository,
    C: CatalogRepository,
{
    agenda: Arc<A>,
    pericias: Arc<P>,
    catalog: Arc<C>,
    offset: FixedOffset,
}

impl<A, P, C> AgendaService<A, P, C>
where
    A: AgendaRepository,
    P: PericiaRepository,
    C: CatalogRepository,
{
    pub fn new(agenda: Arc<A>, pericias: Arc<P>, catalog: Arc<C>, offset: FixedOffset) -> Self {
        Self {
            agenda,
            pericias,
            catalog,
            offset,
        }
    }

    /// Every listed perícia must belong to the tenant
    async fn check_pericias(&self, tenant: &TenantId, ids: &[PericiaId]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        let existing = self.pericias.existing_ids(tenant, ids).await?;
        match ids.iter().find(|id| !existing.contains(id)) {
            Some(missing) => Err(AppError::BadRequest(format!(
                "Perícia inexistente: {}",
                missing
            ))),
            None => Ok(()),
        }
    }

    /// Monday of the week containing `date`, or the current local week
    fn monday(&self, date: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
        let date = date.unwrap_or_else(|| local_date(Utc::now(), self.offset));
        check_planning_date(date)?;
        Ok(week_start(date))
    }

    async fn week_events(
        &self,
        tenant: &TenantId,
        monday: NaiveDate,
    ) -> Result<Vec<AgendaEvent>, AppError> {
        let from = local_midnight(monday, self.offset);
        let to = local_midnight(monday + Duration::days(7), self.offset);
        Ok(self.agenda.list_events(tenant, Some((from, to))).await?)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub async fn create_event(
        &self,
        tenant: &TenantId,
        mut event: NewAgendaEvent,
    ) -> Result<AgendaEvent, AppError> {
        event.title = event.title.trim().to_string();
        if event.title.is_empty() {
            return Err(AppError::BadRequest("Título é obrigatório".to_string()));
        }
        check_interval(event.start_at, event.end_at).map_err(AppError::BadRequest)?;
        if let Some(pid) = event.pericia_id {
            self.check_pericias(tenant, &[pid]).await?;
        }
        if event.metadata.is_null() {
            event.metadata = serde_json::json!({});
        }

        let created = self.agenda.create_event(tenant, &event).await?;
        tracing::info!(
            tenant_id = %tenant,
            event_id = %created.id,
            event_type = %created.event_type,
            "Agenda event created"
        );
        Ok(created)
    }

    /// Events ordered by start, optionally limited to those starting in `[from, to)`
    pub async fn list_events(
        &self,
        tenant: &TenantId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<AgendaEvent>, AppError> {
        Ok(self.agenda.list_events(tenant, window).await?)
    }

    /// Apply a patch; a status change is appended to the event's history
    pub async fn update_event(
        &self,
        tenant: &TenantId,
        actor: Option<&str>,
        id: &AgendaEventId,
        patch: AgendaEventPatch,
        reason: Option<String>,
    ) -> Result<AgendaEvent, AppError> {
        let mut event = self
            .agenda
            .find_event(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Evento não encontrado.".to_string()))?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::BadRequest("Título é obrigatório".to_string()));
            }
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = Some(description);
        }
        if let Some(event_type) = patch.event_type {
            event.event_type = event_type;
        }
        if let Some(start_at) = patch.start_at {
            event.start_at = start_at;
        }
        if let Some(end_at) = patch.end_at {
            event.end_at = Some(end_at);
        }
        if let Some(location) = patch.location {
            event.location = Some(location);
        }
        if let Some(metadata) = patch.metadata {
            event.metadata = metadata;
        }
        check_interval(event.start_at, event.end_at).map_err(AppError::BadRequest)?;

        if let Some(status) = patch.status.filter(|s| *s != event.status) {
            event.status_history.push(StatusHistoryEntry {
                from: event.status,
                to: status,
                changed_at: Utc::now(),
                changed_by: actor.map(str::to_string),
                reason,
            });
            tracing::info!(
                tenant_id = %tenant,
                event_id = %event.id,
                from = %event.status,
                to = %status,
                "Agenda event status changed"
            );
            event.status = status;
        }

        Ok(self.agenda.save_event(&event).await?)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    pub async fn create_task(
        &self,
        tenant: &TenantId,
        mut task: NewAgendaTask,
    ) -> Result<AgendaTask, AppError> {
        task.title = task.title.trim().to_string();
        if task.title.is_empty() {
            return Err(AppError::BadRequest("Título é obrigatório".to_string()));
        }
        check_priority(task.priority)?;
        if let Some(pid) = task.pericia_id {
            self.check_pericias(tenant, &[pid]).await?;
        }

        let created = self.agenda.create_task(tenant, &task).await?;
        tracing::info!(tenant_id = %tenant, task_id = %created.id, "Agenda task created");
        Ok(created)
    }

    pub async fn list_tasks(&self, tenant: &TenantId) -> Result<Vec<AgendaTask>, AppError> {
        Ok(self.agenda.list_tasks(tenant).await?)
    }

    pub async fn update_task(
        &self,
        tenant: &TenantId,
        id: &AgendaTaskId,
        patch: AgendaTaskPatch,
    ) -> Result<AgendaTask, AppError> {
        let mut task = self
            .agenda
            .find_task(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tarefa não encontrada.".to_string()))?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::BadRequest("Título é obrigatório".to_string()));
            }
            task.title = title;
        }
        if let Some(priority) = patch.priority {
            check_priority(priority)?;
            task.priority = priority;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due_at) = patch.due_at {
            task.due_at = Some(due_at);
        }

        Ok(self.agenda.save_task(&task).await?)
    }

    // ========================================================================
    // Lotes
    // ========================================================================

    async fn confirmed_pericias(&self, tenant: &TenantId) -> Result<HashSet<PericiaId>, AppError> {
        let batches = self.agenda.list_batches(tenant).await?;
        Ok(batches
            .iter()
            .filter(|b| b.is_confirmed())
            .flat_map(|b| b.result.items.iter().filter_map(|i| i.pericia_id))
            .collect())
    }

    /// Check the slots against confirmed lotes, each other and the agenda
    async fn conflicts_for(
        &self,
        tenant: &TenantId,
        slots: &[PlannedSlot],
    ) -> Result<Vec<SchedulingConflict>, AppError> {
        let (Some(from), Some(to)) = (
            slots.iter().map(|s| s.start_at).min(),
            slots.iter().map(|s| s.end_at).max(),
        ) else {
            return Ok(Vec::new());
        };

        let existing = self.agenda.overlapping_events(tenant, from, to).await?;
        let confirmed = self.confirmed_pericias(tenant).await?;
        Ok(detect_conflicts(slots, &confirmed, &existing))
    }

    /// Lay out a draft lote and report its conflicts without persisting
    pub async fn preview_batch(
        &self,
        tenant: &TenantId,
        params: &LotParams,
        pericia_ids: &[PericiaId],
    ) -> Result<BatchPreview, AppError> {
        if pericia_ids.is_empty() {
            return Err(AppError::BadRequest(
                "Selecione ao menos uma perícia".to_string(),
            ));
        }
        let cidades: HashMap<CatalogItemId, String> = self
            .catalog
            .list(tenant, CatalogResource::Cidades)
            .await?
            .into_iter()
            .map(|c| (c.id, c.nome))
            .collect();

        let mut candidates = Vec::with_capacity(pericia_ids.len());
        for id in pericia_ids {
            let pericia = self
                .pericias
                .find_by_id(tenant, id)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Perícia inexistente: {}", id)))?;
            candidates.push(LotCandidate {
                pericia_id: pericia.id,
                city: pericia.cidade_id.and_then(|c| cidades.get(&c).cloned()),
                processo_cnj: pericia.processo_cnj,
            });
        }

        let items = plan_lot(params, &candidates, self.offset)?;
        let conflicts = self.conflicts_for(tenant, &items).await?;
        Ok(BatchPreview {
            valid: conflicts.is_empty(),
            items,
            conflicts,
        })
    }

    /// Persist a lote: every event plus the batch record, or nothing
    pub async fn schedule_batch(
        &self,
        tenant: &TenantId,
        items: Vec<BatchItem>,
        metadata: BatchMetadata,
    ) -> Result<BatchCreated, AppError> {
        if items.is_empty() {
            return Err(AppError::BadRequest("Lote sem itens".to_string()));
        }
        for (row, item) in items.iter().enumerate() {
            check_interval(item.start_at, item.end_at)
                .map_err(|e| AppError::BadRequest(format!("Linha {}: {}", row + 1, e)))?;
        }
        let ids: Vec<PericiaId> = items.iter().filter_map(|i| i.pericia_id).collect();
        self.check_pericias(tenant, &ids).await?;

        let slots: Vec<PlannedSlot> = items
            .iter()
            .enumerate()
            .map(|(row, i)| PlannedSlot::new(row, i.pericia_id, i.start_at, i.end_at))
            .collect();
        let conflicts = self.conflicts_for(tenant, &slots).await?;
        if !conflicts.is_empty() {
            tracing::warn!(
                tenant_id = %tenant,
                conflicts = conflicts.len(),
                "Batch scheduling rejected"
            );
            let listed = conflicts
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::Internal(e.to_string()))?;
            return Err(AppError::Conflict {
                message: format!("{} conflito(s) de agendamento", conflicts.len()),
                items: listed,
            });
        }

        let events: Vec<NewAgendaEvent> = items
            .iter()
            .map(|item| NewAgendaEvent {
                title: non_blank(item.title.clone(), BATCH_DEFAULT_TITLE),
                description: None,
                event_type: item.event_type.unwrap_or(EventType::Outro),
                status: item.status.unwrap_or(EventStatus::Agendada),
                source: item.source.unwrap_or(EventSource::Lote),
                ai_suggested: item.ai_suggested,
                start_at: item.start_at,
                end_at: item.end_at,
                location: metadata.location.clone(),
                pericia_id: item.pericia_id,
                cnj_id: item.cnj_id.clone(),
                city_id: item.city_id,
                city: item.city.clone(),
                metadata: serde_json::json!({}),
            })
            .collect();

        let date_ref = metadata
            .date
            .map(|d| local_midnight(d, self.offset))
            .or_else(|| items.first().map(|i| i.start_at))
            .unwrap_or_else(Utc::now);
        let batch = NewSchedulingBatch {
            date_ref,
            criteria: serde_json::to_value(&metadata)
                .map_err(|e| AppError::Internal(e.to_string()))?,
            result: BatchResult {
                status: BatchStatus::Confirmado,
                created: events.len(),
                items: items
                    .iter()
                    .map(|i| BatchItemResult {
                        pericia_id: i.pericia_id,
                        scheduled_at: i.start_at,
                    })
                    .collect(),
            },
        };

        let created = self.agenda.create_batch(tenant, &events, &batch).await?;
        tracing::info!(
            tenant_id = %tenant,
            batch_id = %created.id,
            created = created.result.created,
            "Batch scheduled"
        );
        Ok(BatchCreated {
            created: created.result.created,
            batch_id: created.id,
        })
    }

    /// Lotes, newest first
    pub async fn list_batches(&self, tenant: &TenantId) -> Result<Vec<SchedulingBatch>, AppError> {
        Ok(self.agenda.list_batches(tenant).await?)
    }

    // ========================================================================
    // Workload and laudo blocks
    // ========================================================================

    pub async fn weekly_workload(
        &self,
        tenant: &TenantId,
        start_date: Option<NaiveDate>,
    ) -> Result<WeeklyWorkload, AppError> {
        let monday = self.monday(start_date)?;
        let events = self.week_events(tenant, monday).await?;
        Ok(weekly_workload(monday, &events, self.offset))
    }

    pub async fn weekly_report(
        &self,
        tenant: &TenantId,
        start_date: Option<NaiveDate>,
        mode: ReportMode,
    ) -> Result<WeeklyReport, AppError> {
        let totals = self.weekly_workload(tenant, start_date).await?;
        Ok(WeeklyReport {
            file_name: format!("agenda-semanal-{}.txt", totals.week_start),
            mime_type: "text/plain; charset=utf-8".to_string(),
            content: render_weekly_report(&totals, mode),
            totals,
        })
    }

    pub async fn suggest_laudo_blocks(
        &self,
        tenant: &TenantId,
        start_date: Option<NaiveDate>,
        request: BlockRequest,
    ) -> Result<BlockPlan, AppError> {
        let monday = self.monday(start_date)?;
        let events = self.week_events(tenant, monday).await?;
        Ok(suggest_laudo_blocks(monday, &request, &events, self.offset)?)
    }

    /// Insert the accepted blocks as AI-suggested work blocks, all or none
    pub async fn apply_laudo_blocks(
        &self,
        tenant: &TenantId,
        items: Vec<LaudoBlockItem>,
    ) -> Result<BlocksApplied, AppError> {
        if items.is_empty() {
            return Err(AppError::BadRequest("Nenhum bloco informado".to_string()));
        }
        for (row, item) in items.iter().enumerate() {
            check_interval(item.start_at, Some(item.end_at))
                .map_err(|e| AppError::BadRequest(format!("Linha {}: {}", row + 1, e)))?;
        }
        let ids: Vec<PericiaId> = items.iter().filter_map(|i| i.pericia_id).collect();
        self.check_pericias(tenant, &ids).await?;

        let events: Vec<NewAgendaEvent> = items
            .into_iter()
            .map(|item| NewAgendaEvent {
                title: non_blank(item.title, BLOCK_DEFAULT_TITLE),
                event_type: EventType::BlocoTrabalho,
                status: EventStatus::Agendada,
                source: EventSource::Ia,
                ai_suggested: true,
                start_at: item.start_at,
                end_at: Some(item.end_at),
                pericia_id: item.pericia_id,
                metadata: serde_json::json!({ "aiSuggested": true }),
                ..Default::default()
            })
            .collect();

        let created = self.agenda.create_events(tenant, &events).await?;
        tracing::info!(tenant_id = %tenant, created = created.len(), "Laudo blocks applied");
        Ok(BlocksApplied {
            created: created.len(),
        })
    }
}
