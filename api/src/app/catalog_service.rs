//! Catalog service
//!
//! CRUD over the tenant's lookup tables (cities, courts, statuses, ...).

use std::sync::Arc;

use crate::domain::entities::{
    CatalogItem, CatalogItemId, CatalogItemPatch, CatalogResource, NewCatalogItem, TenantId,
};
use crate::domain::ports::CatalogRepository;
use crate::error::{AppError, DomainError};

pub struct CatalogService<C>
where
    C: CatalogRepository,
{
    catalog: Arc<C>,
}

impl<C> CatalogService<C>
where
    C: CatalogRepository,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    pub async fn list(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
    ) -> Result<Vec<CatalogItem>, AppError> {
        Ok(self.catalog.list(tenant, resource).await?)
    }

    pub async fn get(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<CatalogItem, AppError> {
        self.catalog
            .find_by_id(tenant, resource, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item não encontrado".to_string()))
    }

    pub async fn create(
        &self,
        tenant: &TenantId,
        mut item: NewCatalogItem,
    ) -> Result<CatalogItem, AppError> {
        item.codigo = item.codigo.trim().to_string();
        item.nome = item.nome.trim().to_string();
        if item.codigo.is_empty() || item.nome.is_empty() {
            return Err(AppError::BadRequest(
                "Código e nome são obrigatórios".to_string(),
            ));
        }
        if item.resource == CatalogResource::Status {
            item.codigo = item.codigo.to_uppercase();
        }

        if self
            .catalog
            .find_by_codigo(tenant, item.resource, &item.codigo)
            .await?
            .is_some()
        {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Código {} já cadastrado em {}",
                item.codigo, item.resource
            ))));
        }

        let created = self.catalog.create(tenant, &item).await?;
        tracing::info!(
            tenant_id = %tenant,
            resource = %created.resource,
            codigo = %created.codigo,
            "Catalog item created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
        patch: CatalogItemPatch,
    ) -> Result<CatalogItem, AppError> {
        if patch.nome.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest("Nome não pode ser vazio".to_string()));
        }
        self.get(tenant, resource, id).await?;
        Ok(self.catalog.update(tenant, resource, id, patch).await?)
    }

    pub async fn delete(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<(), AppError> {
        self.get(tenant, resource, id).await?;
        self.catalog.delete(tenant, resource, id).await?;
        tracing::info!(tenant_id = %tenant, resource = %resource, id = %id, "Catalog item deleted");
        Ok(())
    }
}
