//! PostgreSQL adapter for TenantRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::domain::entities::{Tenant, TenantId};
use crate::domain::ports::TenantRepository;
use crate::entity::tenants;
use crate::error::DomainError;

/// PostgreSQL implementation of TenantRepository
pub struct PostgresTenantRepository {
    db: DatabaseConnection,
}

impl PostgresTenantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        let result = tenants::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, nome: &str) -> Result<Tenant, DomainError> {
        let model = tenants::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome.to_string()),
            ativo: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }
}

/// Convert SeaORM model to domain entity
impl From<tenants::Model> for Tenant {
    fn from(model: tenants::Model) -> Self {
        Tenant {
            id: TenantId(model.id),
            nome: model.nome,
            ativo: model.ativo,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
