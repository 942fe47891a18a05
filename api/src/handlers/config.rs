//! Catalog (config) handlers
//!
//! One set of routes serves every lookup table; the table is picked by the
//! `:resource` path segment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::{
    CatalogItem, CatalogItemId, CatalogItemPatch, CatalogResource, NewCatalogItem,
};
use crate::error::AppError;
use crate::handlers::Deleted;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogItemRequest {
    #[validate(length(min = 1, max = 64, message = "obrigatório"))]
    pub codigo: String,
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub nome: String,
    #[validate(length(equal = 2, message = "deve ter 2 letras"))]
    pub uf: Option<String>,
    pub cidade_id: Option<CatalogItemId>,
    pub tribunal_id: Option<CatalogItemId>,
    pub endereco: Option<String>,
    pub cor: Option<String>,
    #[serde(default)]
    pub ordem: i32,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
}

fn default_ativo() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCatalogItemRequest {
    #[validate(length(min = 1, max = 64))]
    pub codigo: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub nome: Option<String>,
    pub cor: Option<String>,
    pub endereco: Option<String>,
    pub ordem: Option<i32>,
    pub ativo: Option<bool>,
}

fn resource(raw: &str) -> Result<CatalogResource, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

/// GET /config/:resource
pub async fn list_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    let items = state
        .catalog_service
        .list(&ctx.tenant_id, resource(&raw)?)
        .await?;
    Ok(Json(items))
}

/// POST /config/:resource
pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(raw): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateCatalogItemRequest>,
) -> Result<(StatusCode, Json<CatalogItem>), AppError> {
    let item = NewCatalogItem {
        resource: resource(&raw)?,
        codigo: req.codigo,
        nome: req.nome,
        uf: req.uf.map(|uf| uf.to_uppercase()),
        cidade_id: req.cidade_id,
        tribunal_id: req.tribunal_id,
        endereco: req.endereco,
        cor: req.cor,
        ordem: req.ordem,
        ativo: req.ativo,
    };
    let created = state.catalog_service.create(&ctx.tenant_id, item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /config/:resource/:id
pub async fn get_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((raw, id)): Path<(String, Uuid)>,
) -> Result<Json<CatalogItem>, AppError> {
    let item = state
        .catalog_service
        .get(&ctx.tenant_id, resource(&raw)?, &CatalogItemId(id))
        .await?;
    Ok(Json(item))
}

/// PATCH /config/:resource/:id
pub async fn update_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((raw, id)): Path<(String, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateCatalogItemRequest>,
) -> Result<Json<CatalogItem>, AppError> {
    let patch = CatalogItemPatch {
        codigo: req.codigo,
        nome: req.nome,
        cor: req.cor,
        endereco: req.endereco,
        ordem: req.ordem,
        ativo: req.ativo,
    };
    let item = state
        .catalog_service
        .update(&ctx.tenant_id, resource(&raw)?, &CatalogItemId(id), patch)
        .await?;
    Ok(Json(item))
}

/// DELETE /config/:resource/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((raw, id)): Path<(String, Uuid)>,
) -> Result<Json<Deleted>, AppError> {
    state
        .catalog_service
        .delete(&ctx.tenant_id, resource(&raw)?, &CatalogItemId(id))
        .await?;
    Ok(Json(Deleted::yes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_resource_is_bad_request() {
        assert!(matches!(resource("usuarios"), Err(AppError::BadRequest(_))));
        assert_eq!(resource("varas").unwrap(), CatalogResource::Varas);
    }

    #[test]
    fn create_defaults_to_active() {
        let req: CreateCatalogItemRequest =
            serde_json::from_str(r#"{"codigo": "SP", "nome": "São Paulo"}"#).unwrap();
        assert!(req.ativo);
        assert_eq!(req.ordem, 0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn uf_must_have_two_letters() {
        let req: CreateCatalogItemRequest =
            serde_json::from_str(r#"{"codigo": "C1", "nome": "Campinas", "uf": "SPX"}"#)
                .unwrap();
        assert!(req.validate().is_err());
    }
}
