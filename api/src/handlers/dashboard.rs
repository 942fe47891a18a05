//! Dashboard and operational view handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::city_overview::CityOverview;
use crate::app::dashboard_rules::DashboardBucket;
use crate::app::pericia_service::{
    Dashboard, FilaAgendamento, NomeacoesView, Page, PericiaSummary,
};
use crate::app::stage_filter::Stage;
use crate::domain::entities::{CatalogItemId, Pericia};
use crate::error::AppError;
use crate::handlers::pericias::{default_limit, default_page};
use crate::tenancy::RequestContext;
use crate::AppState;

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// GET /pericias/dashboard
///
/// KPI counters per bucket, chart data and the most recent urgent cases.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(state.pericia_service.dashboard(&ctx.tenant_id).await?))
}

/// GET /pericias/dashboard/:bucket
pub async fn get_bucket(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Pericia>>, AppError> {
    let bucket: DashboardBucket = bucket.parse().map_err(AppError::BadRequest)?;
    let page = state
        .pericia_service
        .bucket(&ctx.tenant_id, bucket, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// GET /pericias/stages/:stage
pub async fn get_stage(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(stage): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Pericia>>, AppError> {
    let stage: Stage = stage.parse().map_err(AppError::BadRequest)?;
    let page = state
        .pericia_service
        .stage(&ctx.tenant_id, stage, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// GET /nomeacoes
pub async fn get_nomeacoes(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<PageQuery>,
) -> Result<Json<NomeacoesView>, AppError> {
    let view = state
        .pericia_service
        .nomeacoes(&ctx.tenant_id, query.page, query.limit)
        .await?;
    Ok(Json(view))
}

/// GET /pericias-hoje
pub async fn get_pericias_hoje(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<PericiaSummary>>, AppError> {
    Ok(Json(state.pericia_service.pericias_hoje(&ctx.tenant_id).await?))
}

/// GET /laudos-pendentes
pub async fn get_laudos_pendentes(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<PericiaSummary>>, AppError> {
    Ok(Json(
        state.pericia_service.laudos_pendentes(&ctx.tenant_id).await?,
    ))
}

/// GET /fila-agendamento
pub async fn get_fila_agendamento(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<FilaAgendamento>, AppError> {
    Ok(Json(
        state.pericia_service.fila_agendamento(&ctx.tenant_id).await?,
    ))
}

/// GET /pericias/cities/overview
pub async fn list_city_overviews(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<CityOverview>>, AppError> {
    Ok(Json(
        state.pericia_service.city_overview_list(&ctx.tenant_id).await?,
    ))
}

/// GET /pericias/cities/:id/overview
pub async fn get_city_overview(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CityOverview>, AppError> {
    let overview = state
        .pericia_service
        .city_overview(&ctx.tenant_id, &CatalogItemId(id))
        .await?;
    Ok(Json(overview))
}
