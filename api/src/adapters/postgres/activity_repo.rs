//! PostgreSQL adapter for ActivityLogRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{ActivityLog, NewActivityLog, TenantId};
use crate::domain::ports::ActivityLogRepository;
use crate::entity::activity_logs;
use crate::error::DomainError;

/// PostgreSQL implementation of ActivityLogRepository
pub struct PostgresActivityLogRepository {
    db: DatabaseConnection,
}

impl PostgresActivityLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityLogRepository for PostgresActivityLogRepository {
    async fn record(
        &self,
        tenant: &TenantId,
        entry: &NewActivityLog,
    ) -> Result<ActivityLog, DomainError> {
        let model = activity_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            entity_type: Set(entry.entity_type.clone()),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action.clone()),
            payload: Set(entry.payload.clone()),
            created_by: Set(entry.created_by.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_for_entity(
        &self,
        tenant: &TenantId,
        entity_id: &Uuid,
    ) -> Result<Vec<ActivityLog>, DomainError> {
        let results = activity_logs::Entity::find()
            .filter(activity_logs::Column::TenantId.eq(tenant.0))
            .filter(activity_logs::Column::EntityId.eq(*entity_id))
            .order_by_desc(activity_logs::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<activity_logs::Model> for ActivityLog {
    fn from(model: activity_logs::Model) -> Self {
        ActivityLog {
            id: model.id,
            tenant_id: TenantId(model.tenant_id),
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            action: model.action,
            payload: model.payload,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
