//! Laudo handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::{Laudo, LaudoId, LaudoPatch, LaudoStatus, NewLaudo, PericiaId};
use crate::error::AppError;
use crate::handlers::Deleted;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLaudosQuery {
    pub pericia_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLaudoRequest {
    pub pericia_id: PericiaId,
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub status: Option<LaudoStatus>,
    pub content: Option<String>,
    pub sections: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLaudoRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub status: Option<LaudoStatus>,
    pub content: Option<String>,
    pub sections: Option<serde_json::Value>,
}

/// GET /laudos
pub async fn list_laudos(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListLaudosQuery>,
) -> Result<Json<Vec<Laudo>>, AppError> {
    let pericia = query.pericia_id.map(PericiaId);
    let laudos = state
        .laudo_service
        .list(&ctx.tenant_id, pericia.as_ref())
        .await?;
    Ok(Json(laudos))
}

/// POST /laudos
pub async fn create_laudo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateLaudoRequest>,
) -> Result<(StatusCode, Json<Laudo>), AppError> {
    let laudo = NewLaudo {
        pericia_id: req.pericia_id,
        title: req.title.unwrap_or_default(),
        status: req.status.unwrap_or_default(),
        content: req.content,
        sections: req.sections.unwrap_or(serde_json::Value::Null),
    };
    let created = state.laudo_service.create(&ctx.tenant_id, laudo).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /laudos/:id
pub async fn get_laudo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Laudo>, AppError> {
    Ok(Json(
        state
            .laudo_service
            .get(&ctx.tenant_id, &LaudoId(id))
            .await?,
    ))
}

/// PATCH /laudos/:id
pub async fn update_laudo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateLaudoRequest>,
) -> Result<Json<Laudo>, AppError> {
    let patch = LaudoPatch {
        title: req.title,
        status: req.status,
        content: req.content,
        sections: req.sections,
    };
    let laudo = state
        .laudo_service
        .update(&ctx.tenant_id, &LaudoId(id), patch)
        .await?;
    Ok(Json(laudo))
}

/// DELETE /laudos/:id
pub async fn delete_laudo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    state
        .laudo_service
        .delete(&ctx.tenant_id, &LaudoId(id))
        .await?;
    Ok(Json(Deleted::yes()))
}
