//! PostgreSQL adapter for TelepericiaRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::unique_violation;
use crate::domain::entities::{
    NewTeleSlot, PericiaId, TeleSlot, TeleSlotId, TeleSlotItem, TeleSlotItemId, TenantId,
};
use crate::domain::ports::TelepericiaRepository;
use crate::entity::{tele_slot_items, tele_slots};
use crate::error::DomainError;

/// PostgreSQL implementation of TelepericiaRepository
pub struct PostgresTelepericiaRepository {
    db: DatabaseConnection,
}

impl PostgresTelepericiaRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_slot_model<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    id: &TeleSlotId,
) -> Result<Option<tele_slots::Model>, DomainError> {
    tele_slots::Entity::find_by_id(id.0)
        .filter(tele_slots::Column::TenantId.eq(tenant.0))
        .one(conn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))
}

async fn items_of<C: ConnectionTrait>(
    conn: &C,
    slot_ids: Vec<Uuid>,
) -> Result<Vec<tele_slot_items::Model>, DomainError> {
    tele_slot_items::Entity::find()
        .filter(tele_slot_items::Column::SlotId.is_in(slot_ids))
        .order_by_asc(tele_slot_items::Column::OrderIndex)
        .all(conn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))
}

/// Write `order_index = position` for every listed item of the slot
async fn renumber<C: ConnectionTrait>(
    conn: &C,
    slot_id: &TeleSlotId,
    ordered: impl IntoIterator<Item = Uuid>,
) -> Result<(), DomainError> {
    for (index, id) in ordered.into_iter().enumerate() {
        let order_index = i32::try_from(index)
            .map_err(|_| DomainError::Validation("Slot com itens demais".to_string()))?;
        tele_slot_items::Entity::update_many()
            .col_expr(tele_slot_items::Column::OrderIndex, Expr::value(order_index))
            .filter(tele_slot_items::Column::Id.eq(id))
            .filter(tele_slot_items::Column::SlotId.eq(slot_id.0))
            .exec(conn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
    }
    Ok(())
}

fn slot_model(tenant: &TenantId, id: Uuid, slot: &NewTeleSlot) -> tele_slots::ActiveModel {
    tele_slots::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant.0),
        date: Set(slot.date),
        start_time: Set(slot.start_time.clone()),
        duration_minutes: Set(slot.duration_minutes),
        slot_type: Set(slot.slot_type.clone()),
        appointment_duration_minutes: Set(slot.appointment_duration_minutes),
        gap_minutes: Set(slot.gap_minutes),
        capacity: Set(slot.capacity),
        timezone: Set(slot.timezone.clone()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
}

#[async_trait]
impl TelepericiaRepository for PostgresTelepericiaRepository {
    async fn create_slot(
        &self,
        tenant: &TenantId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError> {
        let mut model = slot_model(tenant, Uuid::new_v4(), slot);
        model.created_at = Set(Utc::now().fixed_offset());

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(to_slot(result, Vec::new()))
    }

    async fn list_slots(&self, tenant: &TenantId) -> Result<Vec<TeleSlot>, DomainError> {
        let slots = tele_slots::Entity::find()
            .filter(tele_slots::Column::TenantId.eq(tenant.0))
            .order_by_asc(tele_slots::Column::Date)
            .order_by_asc(tele_slots::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut items: HashMap<Uuid, Vec<tele_slot_items::Model>> = HashMap::new();
        for item in items_of(&self.db, slots.iter().map(|s| s.id).collect()).await? {
            items.entry(item.slot_id).or_default().push(item);
        }

        Ok(slots
            .into_iter()
            .map(|slot| {
                let own = items.remove(&slot.id).unwrap_or_default();
                to_slot(slot, own)
            })
            .collect())
    }

    async fn find_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
    ) -> Result<Option<TeleSlot>, DomainError> {
        let Some(slot) = find_slot_model(&self.db, tenant, id).await? else {
            return Ok(None);
        };
        let items = items_of(&self.db, vec![slot.id]).await?;
        Ok(Some(to_slot(slot, items)))
    }

    async fn update_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError> {
        if find_slot_model(&self.db, tenant, id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Slot {}", id)));
        }

        let result = slot_model(tenant, id.0, slot)
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let items = items_of(&self.db, vec![result.id]).await?;

        Ok(to_slot(result, items))
    }

    async fn delete_slot(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<(), DomainError> {
        let result = tele_slots::Entity::delete_many()
            .filter(tele_slots::Column::Id.eq(id.0))
            .filter(tele_slots::Column::TenantId.eq(tenant.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Slot {}", id)));
        }
        Ok(())
    }

    async fn add_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        pericia_id: &PericiaId,
        order_index: i32,
    ) -> Result<TeleSlotItem, DomainError> {
        if find_slot_model(&self.db, tenant, slot_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Slot {}", slot_id)));
        }

        let result = tele_slot_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            slot_id: Set(slot_id.0),
            pericia_id: Set(pericia_id.0),
            order_index: Set(order_index),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, format!("Perícia {} já atribuída ao slot", pericia_id)))?;

        Ok(result.into())
    }

    async fn set_item_order(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        ordered: &[TeleSlotItemId],
    ) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if find_slot_model(&txn, tenant, slot_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Slot {}", slot_id)));
        }
        renumber(&txn, slot_id, ordered.iter().map(|id| id.0).collect::<Vec<Uuid>>()).await?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn remove_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        item_id: &TeleSlotItemId,
    ) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if find_slot_model(&txn, tenant, slot_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Slot {}", slot_id)));
        }
        let deleted = tele_slot_items::Entity::delete_many()
            .filter(tele_slot_items::Column::Id.eq(item_id.0))
            .filter(tele_slot_items::Column::SlotId.eq(slot_id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        if deleted.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Item {}", item_id)));
        }

        let remaining = items_of(&txn, vec![slot_id.0]).await?;
        renumber(&txn, slot_id, remaining.into_iter().map(|i| i.id)).await?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

fn to_slot(model: tele_slots::Model, items: Vec<tele_slot_items::Model>) -> TeleSlot {
    TeleSlot {
        id: TeleSlotId(model.id),
        tenant_id: TenantId(model.tenant_id),
        date: model.date,
        start_time: model.start_time,
        duration_minutes: model.duration_minutes,
        slot_type: model.slot_type,
        appointment_duration_minutes: model.appointment_duration_minutes,
        gap_minutes: model.gap_minutes,
        capacity: model.capacity,
        timezone: model.timezone,
        items: items.into_iter().map(TeleSlotItem::from).collect(),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Convert SeaORM model to domain entity
impl From<tele_slot_items::Model> for TeleSlotItem {
    fn from(model: tele_slot_items::Model) -> Self {
        TeleSlotItem {
            id: TeleSlotItemId(model.id),
            tenant_id: TenantId(model.tenant_id),
            slot_id: TeleSlotId(model.slot_id),
            pericia_id: PericiaId(model.pericia_id),
            order_index: model.order_index,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
