//! Tenant handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use validator::Validate;

use crate::domain::entities::Tenant;
use crate::domain::ports::TenantRepository;
use crate::error::AppError;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub nome: String,
}

/// POST /tenants
///
/// Provision a new tenant. Not tenant scoped.
pub async fn create_tenant(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    let tenant = state.tenant_repo.create(req.nome.trim()).await?;
    tracing::info!(tenant_id = %tenant.id, "Tenant created");
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// GET /tenants/current
pub async fn get_current_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Tenant>, AppError> {
    let tenant = state
        .tenant_repo
        .find_by_id(&ctx.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant não encontrado".to_string()))?;
    Ok(Json(tenant))
}
