//! Agenda handlers
//!
//! Events, tasks, batch scheduling (lotes), weekly workload and laudo
//! work blocks.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::agenda_service::{
    BatchCreated, BatchItem, BatchMetadata, BatchPreview, BlocksApplied, LaudoBlockItem,
};
use crate::app::scheduling::{parse_hhmm, BlockPlan, BlockRequest, LotParams, WeeklyWorkload};
use crate::domain::entities::{
    AgendaEvent, AgendaEventId, AgendaEventPatch, AgendaTask, AgendaTaskId, AgendaTaskPatch,
    CatalogItemId, EventSource, EventStatus, EventType, NewAgendaEvent, NewAgendaTask,
    PericiaId, SchedulingBatch, TaskStatus,
};
use crate::error::AppError;
use crate::report::ReportMode;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

/// Check if the client wants JSON response
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false)
}

// ============================================================================
// Events
// ============================================================================

/// Optional `[from, to)` window on the event start
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub source: Option<EventSource>,
    #[serde(default)]
    pub ai_suggested: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub pericia_id: Option<PericiaId>,
    pub cnj_id: Option<String>,
    pub city_id: Option<CatalogItemId>,
    pub city: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Stored in the status history when `status` changes
    pub reason: Option<String>,
}

/// GET /agenda/events
pub async fn list_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<AgendaEvent>>, AppError> {
    let window = match (query.from, query.to) {
        (Some(from), Some(to)) if from < to => Some((from, to)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "from e to devem ser informados juntos, com from < to".to_string(),
            ))
        }
    };
    let events = state
        .agenda_service
        .list_events(&ctx.tenant_id, window)
        .await?;
    Ok(Json(events))
}

/// POST /agenda/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<AgendaEvent>), AppError> {
    let event = NewAgendaEvent {
        title: req.title,
        description: req.description,
        event_type: req.event_type.unwrap_or_default(),
        status: req.status.unwrap_or_default(),
        source: req.source.unwrap_or_default(),
        ai_suggested: req.ai_suggested,
        start_at: req.start_at,
        end_at: req.end_at,
        location: req.location,
        pericia_id: req.pericia_id,
        cnj_id: req.cnj_id,
        city_id: req.city_id,
        city: req.city,
        metadata: req.metadata.unwrap_or(serde_json::Value::Null),
    };
    let created = state
        .agenda_service
        .create_event(&ctx.tenant_id, event)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /agenda/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEventRequest>,
) -> Result<Json<AgendaEvent>, AppError> {
    let patch = AgendaEventPatch {
        title: req.title,
        description: req.description,
        event_type: req.event_type,
        status: req.status,
        start_at: req.start_at,
        end_at: req.end_at,
        location: req.location,
        metadata: req.metadata,
    };
    let event = state
        .agenda_service
        .update_event(
            &ctx.tenant_id,
            ctx.user_id.as_deref(),
            &AgendaEventId(id),
            patch,
            req.reason,
        )
        .await?;
    Ok(Json(event))
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 5, message = "deve estar entre 1 e 5"))]
    pub priority: i16,
    pub pericia_id: Option<PericiaId>,
}

fn default_priority() -> i16 {
    3
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 5, message = "deve estar entre 1 e 5"))]
    pub priority: Option<i16>,
}

/// GET /agenda/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<AgendaTask>>, AppError> {
    Ok(Json(state.agenda_service.list_tasks(&ctx.tenant_id).await?))
}

/// POST /agenda/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<AgendaTask>), AppError> {
    let task = NewAgendaTask {
        title: req.title,
        description: req.description,
        status: req.status.unwrap_or_default(),
        due_at: req.due_at,
        priority: req.priority,
        pericia_id: req.pericia_id,
    };
    let created = state
        .agenda_service
        .create_task(&ctx.tenant_id, task)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /agenda/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<AgendaTask>, AppError> {
    let patch = AgendaTaskPatch {
        title: req.title,
        description: req.description,
        status: req.status,
        due_at: req.due_at,
        priority: req.priority,
    };
    let task = state
        .agenda_service
        .update_task(&ctx.tenant_id, &AgendaTaskId(id), patch)
        .await?;
    Ok(Json(task))
}

// ============================================================================
// Batch scheduling
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBatchRequest {
    pub date: NaiveDate,
    /// Local start of the first row, `HH:MM`
    pub start_time: String,
    #[validate(range(min = 1, max = 1440, message = "deve estar entre 1 e 1440"))]
    pub duration_minutes: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 1440, message = "deve estar entre 0 e 1440"))]
    pub interval_minutes: i64,
    #[validate(length(min = 1, max = 500, message = "selecione entre 1 e 500 perícias"))]
    pub pericia_ids: Vec<PericiaId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemRequest {
    pub pericia_id: Option<PericiaId>,
    pub cnj_id: Option<String>,
    pub city_id: Option<CatalogItemId>,
    pub city: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub source: Option<EventSource>,
    #[serde(default)]
    pub ai_suggested: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
}

impl From<BatchItemRequest> for BatchItem {
    fn from(req: BatchItemRequest) -> Self {
        BatchItem {
            pericia_id: req.pericia_id,
            cnj_id: req.cnj_id,
            city_id: req.city_id,
            city: req.city,
            title: req.title,
            event_type: req.event_type,
            status: req.status,
            source: req.source,
            ai_suggested: req.ai_suggested,
            start_at: req.start_at,
            end_at: req.end_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchSchedulingRequest {
    #[validate(length(min = 1, message = "lote sem itens"))]
    pub items: Vec<BatchItemRequest>,
    #[serde(default)]
    pub metadata: BatchMetadata,
}

/// GET /agenda/batch-scheduling
///
/// Saved lotes, newest first.
pub async fn list_batches(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<SchedulingBatch>>, AppError> {
    Ok(Json(state.agenda_service.list_batches(&ctx.tenant_id).await?))
}

/// POST /agenda/batch-scheduling/preview
///
/// Lay out a draft lote and report its conflicts. Nothing is written.
pub async fn preview_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<PreviewBatchRequest>,
) -> Result<Json<BatchPreview>, AppError> {
    let start_time = parse_hhmm(&req.start_time).ok_or_else(|| {
        AppError::BadRequest(format!("startTime inválido: {}", req.start_time))
    })?;
    let params = LotParams {
        date: req.date,
        start_time,
        duration_minutes: req.duration_minutes,
        interval_minutes: req.interval_minutes,
    };
    let preview = state
        .agenda_service
        .preview_batch(&ctx.tenant_id, &params, &req.pericia_ids)
        .await?;
    Ok(Json(preview))
}

/// POST /agenda/batch-scheduling
///
/// Persist a lote. Any conflict rejects the whole lote with 409.
pub async fn schedule_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<BatchSchedulingRequest>,
) -> Result<(StatusCode, Json<BatchCreated>), AppError> {
    let items: Vec<BatchItem> = req.items.into_iter().map(BatchItem::from).collect();
    let created = state
        .agenda_service
        .schedule_batch(&ctx.tenant_id, items, req.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ============================================================================
// Workload and laudo blocks
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekQuery {
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub mode: ReportMode,
}

/// GET /agenda/weekly-workload
pub async fn weekly_workload(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeeklyWorkload>, AppError> {
    let workload = state
        .agenda_service
        .weekly_workload(&ctx.tenant_id, query.start_date)
        .await?;
    Ok(Json(workload))
}

/// GET /agenda/weekly-report
///
/// - Accept: application/json → JSON with the rendered text and totals
/// - Otherwise → the text itself as a download
pub async fn weekly_report(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<WeekQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let report = state
        .agenda_service
        .weekly_report(&ctx.tenant_id, query.start_date, query.mode)
        .await?;

    if wants_json(&headers) {
        Ok(Json(report).into_response())
    } else {
        let disposition = format!("attachment; filename=\"{}\"", report.file_name);
        Ok((
            [
                (header::CONTENT_TYPE, report.mime_type),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            report.content,
        )
            .into_response())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestBlocksRequest {
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 1440, message = "deve estar entre 1 e 1440"))]
    pub avg_minutes_per_laudo: i64,
    #[validate(range(min = 0, max = 10000, message = "deve estar entre 0 e 10000"))]
    pub backlog: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 1440, message = "deve estar entre 0 e 1440"))]
    pub min_buffer_minutes: i64,
    #[serde(default)]
    pub preferred_windows: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaudoBlockRequest {
    pub title: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub pericia_id: Option<PericiaId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyBlocksRequest {
    #[validate(length(min = 1, message = "nenhum bloco informado"))]
    pub items: Vec<LaudoBlockRequest>,
}

/// POST /agenda/laudo-blocks/suggest
pub async fn suggest_laudo_blocks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<SuggestBlocksRequest>,
) -> Result<Json<BlockPlan>, AppError> {
    let request = BlockRequest {
        avg_minutes_per_laudo: req.avg_minutes_per_laudo,
        backlog: req.backlog,
        min_buffer_minutes: req.min_buffer_minutes,
        preferred_windows: req.preferred_windows,
    };
    let plan = state
        .agenda_service
        .suggest_laudo_blocks(&ctx.tenant_id, req.start_date, request)
        .await?;
    Ok(Json(plan))
}

/// POST /agenda/laudo-blocks/apply
pub async fn apply_laudo_blocks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<ApplyBlocksRequest>,
) -> Result<(StatusCode, Json<BlocksApplied>), AppError> {
    let items = req
        .items
        .into_iter()
        .map(|b| LaudoBlockItem {
            title: b.title,
            start_at: b.start_at,
            end_at: b.end_at,
            pericia_id: b.pericia_id,
        })
        .collect();
    let applied = state
        .agenda_service
        .apply_laudo_blocks(&ctx.tenant_id, items)
        .await?;
    Ok((StatusCode::CREATED, Json(applied)))
}
