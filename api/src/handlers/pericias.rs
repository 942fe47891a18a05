//! Perícia handlers
//!
//! CRUD, bulk operations and the status workflow.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::pericia_service::{
    ChangeStatusCommand, ExportResult, Page, PericiaFilter, TimelineEntry, DEFAULT_PAGE_SIZE,
};
use crate::domain::entities::{
    CatalogItemId, NewPericia, PagamentoStatus, Pericia, PericiaId, PericiaPatch,
};
use crate::error::AppError;
use crate::handlers::Deleted;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

/// Query parameters for listing and exporting perícias
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPericiasQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status_id: Option<Uuid>,
    pub status_codigo: Option<String>,
    pub cidade_id: Option<Uuid>,
    pub tipo_pericia_id: Option<Uuid>,
    pub vara_id: Option<Uuid>,
    pub valor_min: Option<i64>,
    pub valor_max: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl ListPericiasQuery {
    fn filter(&self) -> PericiaFilter {
        PericiaFilter {
            status_id: self.status_id.map(CatalogItemId),
            status_codigo: self.status_codigo.clone(),
            cidade_id: self.cidade_id.map(CatalogItemId),
            tipo_pericia_id: self.tipo_pericia_id.map(CatalogItemId),
            vara_id: self.vara_id.map(CatalogItemId),
            valor_min: self.valor_min,
            valor_max: self.valor_max,
            date_from: self.date_from,
            date_to: self.date_to,
            search: self.search.clone(),
        }
    }
}

/// Request body for creating a perícia (also one row of an import)
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePericiaRequest {
    #[serde(rename = "processoCNJ")]
    #[validate(length(min = 1, message = "obrigatório"))]
    pub processo_cnj: String,
    pub cidade_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub modalidade_id: Option<CatalogItemId>,
    pub status_id: Option<CatalogItemId>,
    pub local_id: Option<CatalogItemId>,
    pub juiz_nome: Option<String>,
    pub autor_nome: Option<String>,
    pub reu_nome: Option<String>,
    pub periciado_nome: Option<String>,
    pub observacoes: Option<String>,
    pub extra_observation: Option<String>,
    #[serde(rename = "honorariosPrevistosJG")]
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub honorarios_previstos_jg: Option<i64>,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub honorarios_previstos_partes: Option<i64>,
    pub pagamento_status: Option<PagamentoStatus>,
    #[serde(default)]
    pub is_urgent: bool,
    pub data_nomeacao: Option<NaiveDate>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
}

impl From<CreatePericiaRequest> for NewPericia {
    fn from(req: CreatePericiaRequest) -> Self {
        NewPericia {
            processo_cnj: req.processo_cnj,
            cidade_id: req.cidade_id,
            vara_id: req.vara_id,
            tipo_pericia_id: req.tipo_pericia_id,
            modalidade_id: req.modalidade_id,
            status_id: req.status_id,
            local_id: req.local_id,
            juiz_nome: req.juiz_nome,
            autor_nome: req.autor_nome,
            reu_nome: req.reu_nome,
            periciado_nome: req.periciado_nome,
            observacoes: req.observacoes,
            extra_observation: req.extra_observation,
            honorarios_previstos_jg: req.honorarios_previstos_jg,
            honorarios_previstos_partes: req.honorarios_previstos_partes,
            pagamento_status: req.pagamento_status.unwrap_or_default(),
            is_urgent: req.is_urgent,
            data_nomeacao: req.data_nomeacao,
            data_agendamento: req.data_agendamento,
            hora_agendamento: req.hora_agendamento,
            origem_importacao: None,
        }
    }
}

/// Partial update; omitted fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePericiaRequest {
    #[serde(rename = "processoCNJ")]
    #[validate(length(min = 1, message = "não pode ser vazio"))]
    pub processo_cnj: Option<String>,
    pub cidade_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub modalidade_id: Option<CatalogItemId>,
    pub status_id: Option<CatalogItemId>,
    pub local_id: Option<CatalogItemId>,
    pub juiz_nome: Option<String>,
    pub autor_nome: Option<String>,
    pub reu_nome: Option<String>,
    pub periciado_nome: Option<String>,
    pub observacoes: Option<String>,
    pub extra_observation: Option<String>,
    #[serde(rename = "honorariosPrevistosJG")]
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub honorarios_previstos_jg: Option<i64>,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub honorarios_previstos_partes: Option<i64>,
    pub pagamento_status: Option<PagamentoStatus>,
    pub agendada: Option<bool>,
    pub laudo_enviado: Option<bool>,
    pub finalizada: Option<bool>,
    pub data_nomeacao: Option<NaiveDate>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub data_realizacao: Option<DateTime<Utc>>,
    pub data_envio_laudo: Option<DateTime<Utc>>,
}

impl From<UpdatePericiaRequest> for PericiaPatch {
    fn from(req: UpdatePericiaRequest) -> Self {
        PericiaPatch {
            processo_cnj: req.processo_cnj,
            cidade_id: req.cidade_id,
            vara_id: req.vara_id,
            tipo_pericia_id: req.tipo_pericia_id,
            modalidade_id: req.modalidade_id,
            status_id: req.status_id,
            local_id: req.local_id,
            juiz_nome: req.juiz_nome,
            autor_nome: req.autor_nome,
            reu_nome: req.reu_nome,
            periciado_nome: req.periciado_nome,
            observacoes: req.observacoes,
            extra_observation: req.extra_observation,
            honorarios_previstos_jg: req.honorarios_previstos_jg,
            honorarios_previstos_partes: req.honorarios_previstos_partes,
            pagamento_status: req.pagamento_status,
            is_urgent: None,
            urgent_checked_at: None,
            agendada: req.agendada,
            laudo_enviado: req.laudo_enviado,
            finalizada: req.finalizada,
            data_nomeacao: req.data_nomeacao,
            data_agendamento: req.data_agendamento,
            hora_agendamento: req.hora_agendamento,
            data_realizacao: req.data_realizacao,
            data_envio_laudo: req.data_envio_laudo,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchUpdateRequest {
    #[validate(length(min = 1, message = "informe ao menos um id"))]
    pub ids: Vec<PericiaId>,
    #[validate(nested)]
    pub data: UpdatePericiaRequest,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    pub updated: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportPericiasRequest {
    #[validate(length(max = 5000, message = "máximo de 5000 linhas"), nested)]
    pub rows: Vec<CreatePericiaRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImportPericiasResponse {
    pub imported: u64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub pericia_id: PericiaId,
    pub status_id: CatalogItemId,
    #[validate(length(max = 1000))]
    pub motivo: Option<String>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub data_realizacao: Option<DateTime<Utc>>,
    pub data_envio_laudo: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgencyRequest {
    pub pericia_id: PericiaId,
    pub is_urgent: bool,
}

/// GET /pericias
pub async fn list_pericias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListPericiasQuery>,
) -> Result<Json<Page<Pericia>>, AppError> {
    let page = state
        .pericia_service
        .list(&ctx.tenant_id, &query.filter(), query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// POST /pericias
pub async fn create_pericia(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreatePericiaRequest>,
) -> Result<(StatusCode, Json<Pericia>), AppError> {
    let pericia = state
        .pericia_service
        .create(&ctx.tenant_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(pericia)))
}

/// GET /pericias/:id
pub async fn get_pericia(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pericia>, AppError> {
    let pericia = state
        .pericia_service
        .get(&ctx.tenant_id, &PericiaId(id))
        .await?;
    Ok(Json(pericia))
}

/// PATCH /pericias/:id
pub async fn update_pericia(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdatePericiaRequest>,
) -> Result<Json<Pericia>, AppError> {
    let pericia = state
        .pericia_service
        .update(&ctx.tenant_id, &PericiaId(id), req.into())
        .await?;
    Ok(Json(pericia))
}

/// DELETE /pericias/:id
pub async fn delete_pericia(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    state
        .pericia_service
        .delete(&ctx.tenant_id, &PericiaId(id))
        .await?;
    Ok(Json(Deleted::yes()))
}

/// POST /pericias/batch-update
///
/// Apply the same patch to many perícias. Ids of other tenants are skipped.
pub async fn batch_update_pericias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<BatchUpdateRequest>,
) -> Result<Json<BatchUpdateResponse>, AppError> {
    let updated = state
        .pericia_service
        .batch_update(&ctx.tenant_id, &req.ids, req.data.into())
        .await?;
    Ok(Json(BatchUpdateResponse { updated }))
}

/// POST /pericias/import
///
/// All-or-nothing bulk insert.
pub async fn import_pericias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<ImportPericiasRequest>,
) -> Result<(StatusCode, Json<ImportPericiasResponse>), AppError> {
    let rows: Vec<NewPericia> = req.rows.into_iter().map(NewPericia::from).collect();
    let imported = state.pericia_service.import(&ctx.tenant_id, rows).await?;
    Ok((StatusCode::CREATED, Json(ImportPericiasResponse { imported })))
}

/// GET /pericias/export
pub async fn export_pericias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListPericiasQuery>,
) -> Result<Json<ExportResult>, AppError> {
    let export = state
        .pericia_service
        .export(&ctx.tenant_id, &query.filter())
        .await?;
    Ok(Json(export))
}

/// POST /pericias/change-status
pub async fn change_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<ChangeStatusRequest>,
) -> Result<Json<Pericia>, AppError> {
    let command = ChangeStatusCommand {
        pericia_id: req.pericia_id,
        status_id: req.status_id,
        motivo: req.motivo,
        data_agendamento: req.data_agendamento,
        hora_agendamento: req.hora_agendamento,
        data_realizacao: req.data_realizacao,
        data_envio_laudo: req.data_envio_laudo,
    };
    let pericia = state
        .pericia_service
        .change_status(&ctx.tenant_id, ctx.user_id.as_deref(), command)
        .await?;
    Ok(Json(pericia))
}

/// POST /pericias/urgency
pub async fn set_urgency(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<UrgencyRequest>,
) -> Result<Json<Pericia>, AppError> {
    let pericia = state
        .pericia_service
        .set_urgency(
            &ctx.tenant_id,
            ctx.user_id.as_deref(),
            &req.pericia_id,
            req.is_urgent,
        )
        .await?;
    Ok(Json(pericia))
}

/// GET /pericias/:id/timeline
pub async fn get_timeline(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEntry>>, AppError> {
    let entries = state
        .pericia_service
        .timeline(&ctx.tenant_id, &PericiaId(id))
        .await?;
    Ok(Json(entries))
}
