//! Lawyer handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::lawyer_service::PericiaLawyer;
use crate::domain::entities::{
    CaseRole, Lawyer, LawyerId, LawyerOnPericia, LawyerPatch, NewLawyer, PericiaId,
};
use crate::error::AppError;
use crate::handlers::Deleted;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLawyerRequest {
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub nome: String,
    #[validate(length(max = 20))]
    pub oab: Option<String>,
    #[validate(length(equal = 2, message = "deve ter 2 letras"))]
    pub uf_oab: Option<String>,
    #[validate(email(message = "e-mail inválido"))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLawyerRequest {
    #[validate(length(min = 1, max = 255))]
    pub nome: Option<String>,
    #[validate(length(max = 20))]
    pub oab: Option<String>,
    #[validate(length(equal = 2, message = "deve ter 2 letras"))]
    pub uf_oab: Option<String>,
    #[validate(email(message = "e-mail inválido"))]
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPericiaRequest {
    pub pericia_id: PericiaId,
    #[serde(default)]
    pub role_in_case: CaseRole,
}

/// GET /lawyers
pub async fn list_lawyers(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<Lawyer>>, AppError> {
    Ok(Json(state.lawyer_service.list(&ctx.tenant_id).await?))
}

/// POST /lawyers
pub async fn create_lawyer(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateLawyerRequest>,
) -> Result<(StatusCode, Json<Lawyer>), AppError> {
    let lawyer = NewLawyer {
        nome: req.nome,
        oab: req.oab,
        uf_oab: req.uf_oab.map(|uf| uf.to_uppercase()),
        email: req.email,
        telefone: req.telefone,
        observacoes: req.observacoes,
    };
    let created = state.lawyer_service.create(&ctx.tenant_id, lawyer).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /lawyers/:id
pub async fn get_lawyer(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lawyer>, AppError> {
    Ok(Json(
        state
            .lawyer_service
            .get(&ctx.tenant_id, &LawyerId(id))
            .await?,
    ))
}

/// PATCH /lawyers/:id
pub async fn update_lawyer(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateLawyerRequest>,
) -> Result<Json<Lawyer>, AppError> {
    let patch = LawyerPatch {
        nome: req.nome,
        oab: req.oab,
        uf_oab: req.uf_oab.map(|uf| uf.to_uppercase()),
        email: req.email,
        telefone: req.telefone,
        observacoes: req.observacoes,
    };
    let lawyer = state
        .lawyer_service
        .update(&ctx.tenant_id, &LawyerId(id), patch)
        .await?;
    Ok(Json(lawyer))
}

/// DELETE /lawyers/:id
pub async fn delete_lawyer(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    state
        .lawyer_service
        .delete(&ctx.tenant_id, &LawyerId(id))
        .await?;
    Ok(Json(Deleted::yes()))
}

/// POST /lawyers/:id/pericias
pub async fn link_pericia(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkPericiaRequest>,
) -> Result<(StatusCode, Json<LawyerOnPericia>), AppError> {
    let link = state
        .lawyer_service
        .link_to_pericia(&ctx.tenant_id, &LawyerId(id), &req.pericia_id, req.role_in_case)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /pericias/:id/lawyers
pub async fn list_pericia_lawyers(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PericiaLawyer>>, AppError> {
    let lawyers = state
        .lawyer_service
        .list_for_pericia(&ctx.tenant_id, &PericiaId(id))
        .await?;
    Ok(Json(lawyers))
}
