//! PostgreSQL adapter for CatalogRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::unique_violation;
use crate::domain::entities::{
    CatalogItem, CatalogItemId, CatalogItemPatch, CatalogResource, NewCatalogItem, TenantId,
};
use crate::domain::ports::CatalogRepository;
use crate::entity::catalog_items;
use crate::error::DomainError;

/// PostgreSQL implementation of CatalogRepository
pub struct PostgresCatalogRepository {
    db: DatabaseConnection,
}

impl PostgresCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<Option<catalog_items::Model>, DomainError> {
        catalog_items::Entity::find_by_id(id.0)
            .filter(catalog_items::Column::TenantId.eq(tenant.0))
            .filter(catalog_items::Column::Resource.eq(resource.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn list(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
    ) -> Result<Vec<CatalogItem>, DomainError> {
        let results = catalog_items::Entity::find()
            .filter(catalog_items::Column::TenantId.eq(tenant.0))
            .filter(catalog_items::Column::Resource.eq(resource.as_str()))
            .order_by_asc(catalog_items::Column::Ordem)
            .order_by_asc(catalog_items::Column::Nome)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(CatalogItem::try_from).collect()
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, DomainError> {
        self.find_model(tenant, resource, id)
            .await?
            .map(CatalogItem::try_from)
            .transpose()
    }

    async fn find_by_codigo(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        codigo: &str,
    ) -> Result<Option<CatalogItem>, DomainError> {
        catalog_items::Entity::find()
            .filter(catalog_items::Column::TenantId.eq(tenant.0))
            .filter(catalog_items::Column::Resource.eq(resource.as_str()))
            .filter(catalog_items::Column::Codigo.eq(codigo))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .map(CatalogItem::try_from)
            .transpose()
    }

    async fn find_status_ids_by_codes(
        &self,
        tenant: &TenantId,
        codes: &[&str],
    ) -> Result<HashMap<String, CatalogItemId>, DomainError> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let results = catalog_items::Entity::find()
            .filter(catalog_items::Column::TenantId.eq(tenant.0))
            .filter(catalog_items::Column::Resource.eq(CatalogResource::Status.as_str()))
            .filter(catalog_items::Column::Codigo.is_in(codes.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|m| (m.codigo, CatalogItemId(m.id)))
            .collect())
    }

    async fn create(
        &self,
        tenant: &TenantId,
        item: &NewCatalogItem,
    ) -> Result<CatalogItem, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = catalog_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            resource: Set(item.resource.as_str().to_string()),
            codigo: Set(item.codigo.clone()),
            nome: Set(item.nome.clone()),
            uf: Set(item.uf.clone()),
            cidade_id: Set(item.cidade_id.map(|c| c.0)),
            tribunal_id: Set(item.tribunal_id.map(|t| t.0)),
            endereco: Set(item.endereco.clone()),
            cor: Set(item.cor.clone()),
            ordem: Set(item.ordem),
            ativo: Set(item.ativo),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| unique_violation(e, format!("Código {} já cadastrado", item.codigo)))?;

        result.try_into()
    }

    async fn update(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
        patch: CatalogItemPatch,
    ) -> Result<CatalogItem, DomainError> {
        let existing = self
            .find_model(tenant, resource, id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Item {}", id)))?;

        let mut model: catalog_items::ActiveModel = existing.into();
        let codigo = patch.codigo.clone();
        if let Some(codigo) = patch.codigo {
            model.codigo = Set(codigo);
        }
        if let Some(nome) = patch.nome {
            model.nome = Set(nome);
        }
        if let Some(cor) = patch.cor {
            model.cor = Set(Some(cor));
        }
        if let Some(endereco) = patch.endereco {
            model.endereco = Set(Some(endereco));
        }
        if let Some(ordem) = patch.ordem {
            model.ordem = Set(ordem);
        }
        if let Some(ativo) = patch.ativo {
            model.ativo = Set(ativo);
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        let result = model.update(&self.db).await.map_err(|e| {
            unique_violation(
                e,
                format!("Código {} já cadastrado", codigo.unwrap_or_default()),
            )
        })?;

        result.try_into()
    }

    async fn delete(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<(), DomainError> {
        let result = catalog_items::Entity::delete_many()
            .filter(catalog_items::Column::Id.eq(id.0))
            .filter(catalog_items::Column::TenantId.eq(tenant.0))
            .filter(catalog_items::Column::Resource.eq(resource.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Item {}", id)));
        }
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<catalog_items::Model> for CatalogItem {
    type Error = DomainError;

    fn try_from(model: catalog_items::Model) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: CatalogItemId(model.id),
            tenant_id: TenantId(model.tenant_id),
            resource: model.resource.parse().map_err(DomainError::Internal)?,
            codigo: model.codigo,
            nome: model.nome,
            uf: model.uf,
            cidade_id: model.cidade_id.map(CatalogItemId),
            tribunal_id: model.tribunal_id.map(CatalogItemId),
            endereco: model.endereco,
            cor: model.cor,
            ordem: model.ordem,
            ativo: model.ativo,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
