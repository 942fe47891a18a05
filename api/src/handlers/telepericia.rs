//! Telepericia slot handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::telepericia_service::{ItemMove, SlotView, TeleSlotInput, TeleSlotPatch};
use crate::domain::entities::{PericiaId, TeleSlotId, TeleSlotItemId};
use crate::error::AppError;
use crate::handlers::Deleted;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub date: NaiveDate,
    #[validate(length(min = 4, max = 5))]
    pub start_time: String,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,
    #[validate(length(max = 100))]
    #[serde(rename = "type")]
    pub slot_type: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub appointment_duration_minutes: i32,
    #[validate(range(min = 0, max = 1440))]
    pub gap_minutes: Option<i32>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    pub date: Option<NaiveDate>,
    #[validate(length(min = 4, max = 5))]
    pub start_time: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 100))]
    #[serde(rename = "type")]
    pub slot_type: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub appointment_duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 1440))]
    pub gap_minutes: Option<i32>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub pericia_id: PericiaId,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, max = 500), nested)]
    pub items: Vec<ReorderItem>,
}

/// GET /telepericia/slots
pub async fn list_slots(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    Ok(Json(
        state.telepericia_service.list_slots(&ctx.tenant_id).await?,
    ))
}

/// POST /telepericia/slots
pub async fn create_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotView>), AppError> {
    let input = TeleSlotInput {
        date: req.date,
        start_time: req.start_time,
        duration_minutes: req.duration_minutes,
        slot_type: req.slot_type,
        appointment_duration_minutes: req.appointment_duration_minutes,
        gap_minutes: req.gap_minutes.unwrap_or(0),
        capacity: req.capacity,
        timezone: req.timezone,
    };
    let slot = state
        .telepericia_service
        .create_slot(&ctx.tenant_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// GET /telepericia/slots/:id
pub async fn get_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SlotView>, AppError> {
    Ok(Json(
        state
            .telepericia_service
            .get_slot(&ctx.tenant_id, &TeleSlotId(id))
            .await?,
    ))
}

/// PATCH /telepericia/slots/:id
pub async fn update_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSlotRequest>,
) -> Result<Json<SlotView>, AppError> {
    let patch = TeleSlotPatch {
        date: req.date,
        start_time: req.start_time,
        duration_minutes: req.duration_minutes,
        slot_type: req.slot_type,
        appointment_duration_minutes: req.appointment_duration_minutes,
        gap_minutes: req.gap_minutes,
        capacity: req.capacity,
        timezone: req.timezone,
    };
    let slot = state
        .telepericia_service
        .update_slot(&ctx.tenant_id, &TeleSlotId(id), patch)
        .await?;
    Ok(Json(slot))
}

/// DELETE /telepericia/slots/:id
pub async fn delete_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    state
        .telepericia_service
        .delete_slot(&ctx.tenant_id, &TeleSlotId(id))
        .await?;
    Ok(Json(Deleted::yes()))
}

/// POST /telepericia/slots/:id/assign
pub async fn assign_to_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AssignRequest>,
) -> Result<Json<SlotView>, AppError> {
    let slot = state
        .telepericia_service
        .assign(&ctx.tenant_id, &TeleSlotId(id), &req.pericia_id)
        .await?;
    Ok(Json(slot))
}

/// PATCH /telepericia/slots/:id/reorder
pub async fn reorder_slot(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> Result<Json<SlotView>, AppError> {
    let moves: Vec<ItemMove> = req
        .items
        .iter()
        .map(|m| ItemMove {
            item_id: TeleSlotItemId(m.item_id),
            order_index: m.order_index,
        })
        .collect();
    let slot = state
        .telepericia_service
        .reorder(&ctx.tenant_id, &TeleSlotId(id), &moves)
        .await?;
    Ok(Json(slot))
}

/// DELETE /telepericia/slots/:id/items/:item_id
pub async fn delete_slot_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SlotView>, AppError> {
    let slot = state
        .telepericia_service
        .delete_item(&ctx.tenant_id, &TeleSlotId(id), &TeleSlotItemId(item_id))
        .await?;
    Ok(Json(slot))
}
