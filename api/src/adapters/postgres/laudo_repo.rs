//! PostgreSQL adapter for LaudoRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{Laudo, LaudoId, NewLaudo, PericiaId, TenantId};
use crate::domain::ports::LaudoRepository;
use crate::entity::laudos;
use crate::error::DomainError;

/// PostgreSQL implementation of LaudoRepository
pub struct PostgresLaudoRepository {
    db: DatabaseConnection,
}

impl PostgresLaudoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LaudoRepository for PostgresLaudoRepository {
    async fn create(&self, tenant: &TenantId, laudo: &NewLaudo) -> Result<Laudo, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = laudos::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            pericia_id: Set(laudo.pericia_id.0),
            title: Set(laudo.title.clone()),
            status: Set(laudo.status.to_string()),
            content: Set(laudo.content.clone()),
            sections: Set(laudo.sections.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Laudo>, DomainError> {
        let mut select = laudos::Entity::find().filter(laudos::Column::TenantId.eq(tenant.0));
        if let Some(pericia_id) = pericia_id {
            select = select.filter(laudos::Column::PericiaId.eq(pericia_id.0));
        }

        let results = select
            .order_by_desc(laudos::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &LaudoId,
    ) -> Result<Option<Laudo>, DomainError> {
        let result = laudos::Entity::find_by_id(id.0)
            .filter(laudos::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn save(&self, laudo: &Laudo) -> Result<Laudo, DomainError> {
        if self.find_by_id(&laudo.tenant_id, &laudo.id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Laudo {}", laudo.id)));
        }

        let result = laudos::ActiveModel {
            id: Set(laudo.id.0),
            tenant_id: Set(laudo.tenant_id.0),
            pericia_id: Set(laudo.pericia_id.0),
            title: Set(laudo.title.clone()),
            status: Set(laudo.status.to_string()),
            content: Set(laudo.content.clone()),
            sections: Set(laudo.sections.clone()),
            created_at: Set(laudo.created_at.fixed_offset()),
            updated_at: Set(Utc::now().fixed_offset()),
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, tenant: &TenantId, id: &LaudoId) -> Result<(), DomainError> {
        let result = laudos::Entity::delete_many()
            .filter(laudos::Column::Id.eq(id.0))
            .filter(laudos::Column::TenantId.eq(tenant.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Laudo {}", id)));
        }
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<laudos::Model> for Laudo {
    fn from(model: laudos::Model) -> Self {
        Laudo {
            id: LaudoId(model.id),
            tenant_id: TenantId(model.tenant_id),
            pericia_id: PericiaId(model.pericia_id),
            title: model.title,
            status: model.status.parse().unwrap_or_default(),
            content: model.content,
            sections: model.sections,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
