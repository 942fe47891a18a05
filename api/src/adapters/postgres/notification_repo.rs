//! PostgreSQL adapter for NotificationRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NotificationChannel, NotificationConfig, NotificationConfigId, TenantId,
};
use crate::domain::ports::NotificationRepository;
use crate::entity::notification_configs;
use crate::error::DomainError;

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    db: DatabaseConnection,
}

impl PostgresNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn upsert(
        &self,
        tenant: &TenantId,
        channel: NotificationChannel,
        enabled: Option<bool>,
        config: Option<serde_json::Value>,
    ) -> Result<NotificationConfig, DomainError> {
        let now = Utc::now().fixed_offset();
        let existing = notification_configs::Entity::find()
            .filter(notification_configs::Column::TenantId.eq(tenant.0))
            .filter(notification_configs::Column::Channel.eq(channel.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = match existing {
            Some(found) => {
                let mut model: notification_configs::ActiveModel = found.into();
                if let Some(enabled) = enabled {
                    model.enabled = Set(enabled);
                }
                if let Some(config) = config {
                    model.config = Set(config);
                }
                model.updated_at = Set(now);
                model.update(&self.db).await
            }
            None => {
                notification_configs::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant.0),
                    channel: Set(channel.to_string()),
                    enabled: Set(enabled.unwrap_or(true)),
                    config: Set(config.unwrap_or_else(|| serde_json::json!({}))),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await
            }
        }
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list(&self, tenant: &TenantId) -> Result<Vec<NotificationConfig>, DomainError> {
        let results = notification_configs::Entity::find()
            .filter(notification_configs::Column::TenantId.eq(tenant.0))
            .order_by_asc(notification_configs::Column::Channel)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<notification_configs::Model> for NotificationConfig {
    fn from(model: notification_configs::Model) -> Self {
        NotificationConfig {
            id: NotificationConfigId(model.id),
            tenant_id: TenantId(model.tenant_id),
            channel: model.channel.parse().unwrap_or_default(),
            enabled: model.enabled,
            config: model.config,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
