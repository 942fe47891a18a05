//! PostgreSQL adapter for AgendaRepository

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{NullOrdering, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    AgendaEvent, AgendaEventId, AgendaTask, AgendaTaskId, CatalogItemId, NewAgendaEvent,
    NewAgendaTask, NewSchedulingBatch, PericiaId, SchedulingBatch, SchedulingBatchId, TenantId,
    DEFAULT_EVENT_MINUTES,
};
use crate::domain::ports::AgendaRepository;
use crate::entity::{agenda_events, agenda_tasks, scheduling_batches};
use crate::error::DomainError;

/// PostgreSQL implementation of AgendaRepository
pub struct PostgresAgendaRepository {
    db: DatabaseConnection,
}

impl PostgresAgendaRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::Internal(e.to_string()))
}

fn new_event_model(tenant: &TenantId, new: &NewAgendaEvent) -> agenda_events::ActiveModel {
    let now = Utc::now().fixed_offset();
    agenda_events::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant.0),
        title: Set(new.title.clone()),
        description: Set(new.description.clone()),
        event_type: Set(new.event_type.to_string()),
        status: Set(new.status.to_string()),
        source: Set(new.source.to_string()),
        ai_suggested: Set(new.ai_suggested),
        start_at: Set(new.start_at.fixed_offset()),
        end_at: Set(new.end_at.map(|d| d.fixed_offset())),
        location: Set(new.location.clone()),
        pericia_id: Set(new.pericia_id.map(|p| p.0)),
        cnj_id: Set(new.cnj_id.clone()),
        city_id: Set(new.city_id.map(|c| c.0)),
        city: Set(new.city.clone()),
        status_history: Set(serde_json::json!([])),
        metadata: Set(new.metadata.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

async fn insert_events<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    events: &[NewAgendaEvent],
) -> Result<Vec<AgendaEvent>, DomainError> {
    let mut created = Vec::with_capacity(events.len());
    for event in events {
        let model = new_event_model(tenant, event)
            .insert(conn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        created.push(model.into());
    }
    Ok(created)
}

#[async_trait]
impl AgendaRepository for PostgresAgendaRepository {
    async fn create_event(
        &self,
        tenant: &TenantId,
        event: &NewAgendaEvent,
    ) -> Result<AgendaEvent, DomainError> {
        let result = new_event_model(tenant, event)
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn find_event(
        &self,
        tenant: &TenantId,
        id: &AgendaEventId,
    ) -> Result<Option<AgendaEvent>, DomainError> {
        let result = agenda_events::Entity::find_by_id(id.0)
            .filter(agenda_events::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_events(
        &self,
        tenant: &TenantId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        let mut select =
            agenda_events::Entity::find().filter(agenda_events::Column::TenantId.eq(tenant.0));
        if let Some((from, to)) = window {
            select = select
                .filter(agenda_events::Column::StartAt.gte(from.fixed_offset()))
                .filter(agenda_events::Column::StartAt.lt(to.fixed_offset()));
        }

        let results = select
            .order_by_asc(agenda_events::Column::StartAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn overlapping_events(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        // open-ended events end DEFAULT_EVENT_MINUTES after they start
        let open_ended_from = from - Duration::minutes(DEFAULT_EVENT_MINUTES);
        let still_running = Condition::any()
            .add(agenda_events::Column::EndAt.gt(from.fixed_offset()))
            .add(
                Condition::all()
                    .add(agenda_events::Column::EndAt.is_null())
                    .add(agenda_events::Column::StartAt.gt(open_ended_from.fixed_offset())),
            );

        let results = agenda_events::Entity::find()
            .filter(agenda_events::Column::TenantId.eq(tenant.0))
            .filter(agenda_events::Column::StartAt.lt(to.fixed_offset()))
            .filter(still_running)
            .order_by_asc(agenda_events::Column::StartAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn save_event(&self, event: &AgendaEvent) -> Result<AgendaEvent, DomainError> {
        if self.find_event(&event.tenant_id, &event.id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Evento {}", event.id)));
        }

        let result = agenda_events::ActiveModel {
            id: Set(event.id.0),
            tenant_id: Set(event.tenant_id.0),
            title: Set(event.title.clone()),
            description: Set(event.description.clone()),
            event_type: Set(event.event_type.to_string()),
            status: Set(event.status.to_string()),
            source: Set(event.source.to_string()),
            ai_suggested: Set(event.ai_suggested),
            start_at: Set(event.start_at.fixed_offset()),
            end_at: Set(event.end_at.map(|d| d.fixed_offset())),
            location: Set(event.location.clone()),
            pericia_id: Set(event.pericia_id.map(|p| p.0)),
            cnj_id: Set(event.cnj_id.clone()),
            city_id: Set(event.city_id.map(|c| c.0)),
            city: Set(event.city.clone()),
            status_history: Set(to_json(&event.status_history)?),
            metadata: Set(event.metadata.clone()),
            created_at: Set(event.created_at.fixed_offset()),
            updated_at: Set(Utc::now().fixed_offset()),
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn create_events(
        &self,
        tenant: &TenantId,
        events: &[NewAgendaEvent],
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created = insert_events(&txn, tenant, events).await?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(created)
    }

    async fn create_batch(
        &self,
        tenant: &TenantId,
        events: &[NewAgendaEvent],
        batch: &NewSchedulingBatch,
    ) -> Result<SchedulingBatch, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        insert_events(&txn, tenant, events).await?;

        let result = scheduling_batches::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            date_ref: Set(batch.date_ref.fixed_offset()),
            criteria_json: Set(batch.criteria.clone()),
            result_json: Set(to_json(&batch.result)?),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.try_into()
    }

    async fn list_batches(&self, tenant: &TenantId) -> Result<Vec<SchedulingBatch>, DomainError> {
        let results = scheduling_batches::Entity::find()
            .filter(scheduling_batches::Column::TenantId.eq(tenant.0))
            .order_by_desc(scheduling_batches::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(SchedulingBatch::try_from).collect()
    }

    async fn create_task(
        &self,
        tenant: &TenantId,
        task: &NewAgendaTask,
    ) -> Result<AgendaTask, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = agenda_tasks::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            title: Set(task.title.clone()),
            description: Set(task.description.clone()),
            status: Set(task.status.to_string()),
            due_at: Set(task.due_at.map(|d| d.fixed_offset())),
            priority: Set(task.priority),
            pericia_id: Set(task.pericia_id.map(|p| p.0)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn find_task(
        &self,
        tenant: &TenantId,
        id: &AgendaTaskId,
    ) -> Result<Option<AgendaTask>, DomainError> {
        let result = agenda_tasks::Entity::find_by_id(id.0)
            .filter(agenda_tasks::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_tasks(&self, tenant: &TenantId) -> Result<Vec<AgendaTask>, DomainError> {
        let results = agenda_tasks::Entity::find()
            .filter(agenda_tasks::Column::TenantId.eq(tenant.0))
            .order_by_with_nulls(agenda_tasks::Column::DueAt, Order::Asc, NullOrdering::Last)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn save_task(&self, task: &AgendaTask) -> Result<AgendaTask, DomainError> {
        if self.find_task(&task.tenant_id, &task.id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Tarefa {}", task.id)));
        }

        let result = agenda_tasks::ActiveModel {
            id: Set(task.id.0),
            tenant_id: Set(task.tenant_id.0),
            title: Set(task.title.clone()),
            description: Set(task.description.clone()),
            status: Set(task.status.to_string()),
            due_at: Set(task.due_at.map(|d| d.fixed_offset())),
            priority: Set(task.priority),
            pericia_id: Set(task.pericia_id.map(|p| p.0)),
            created_at: Set(task.created_at.fixed_offset()),
            updated_at: Set(Utc::now().fixed_offset()),
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }
}

/// Convert SeaORM model to domain entity
impl From<agenda_events::Model> for AgendaEvent {
    fn from(model: agenda_events::Model) -> Self {
        AgendaEvent {
            id: AgendaEventId(model.id),
            tenant_id: TenantId(model.tenant_id),
            title: model.title,
            description: model.description,
            event_type: model.event_type.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            source: model.source.parse().unwrap_or_default(),
            ai_suggested: model.ai_suggested,
            start_at: model.start_at.with_timezone(&Utc),
            end_at: model.end_at.map(|dt| dt.with_timezone(&Utc)),
            location: model.location,
            pericia_id: model.pericia_id.map(PericiaId),
            cnj_id: model.cnj_id,
            city_id: model.city_id.map(CatalogItemId),
            city: model.city,
            status_history: serde_json::from_value(model.status_history).unwrap_or_default(),
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<agenda_tasks::Model> for AgendaTask {
    fn from(model: agenda_tasks::Model) -> Self {
        AgendaTask {
            id: AgendaTaskId(model.id),
            tenant_id: TenantId(model.tenant_id),
            title: model.title,
            description: model.description,
            status: model.status.parse().unwrap_or_default(),
            due_at: model.due_at.map(|dt| dt.with_timezone(&Utc)),
            priority: model.priority,
            pericia_id: model.pericia_id.map(PericiaId),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity; fails on a malformed result document
impl TryFrom<scheduling_batches::Model> for SchedulingBatch {
    type Error = DomainError;

    fn try_from(model: scheduling_batches::Model) -> Result<Self, Self::Error> {
        Ok(SchedulingBatch {
            id: SchedulingBatchId(model.id),
            tenant_id: TenantId(model.tenant_id),
            date_ref: model.date_ref.with_timezone(&Utc),
            criteria: model.criteria_json,
            result: serde_json::from_value(model.result_json)
                .map_err(|e| DomainError::Internal(format!("Lote {}: {}", model.id, e)))?,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
