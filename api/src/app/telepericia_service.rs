//! Telepericia service
//!
//! Remote appointment slots. A slot covers one window of a day; the perícias
//! assigned to it are called one after another, each taking
//! `appointment_duration_minutes` followed by `gap_minutes`. Every change to a
//! slot rewrites the scheduled date of its perícias.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::app::scheduling::{check_planning_date, local_instant, parse_hhmm, MAX_SLOT_MINUTES};
use crate::domain::entities::{
    NewTeleSlot, PericiaId, ScheduleUpdate, TeleSlot, TeleSlotId, TeleSlotItem, TeleSlotItemId,
    TenantId, DEFAULT_SLOT_TIMEZONE,
};
use crate::domain::ports::{PericiaRepository, TelepericiaRepository};
use crate::error::{AppError, DomainError};

/// Slot configuration as submitted by the client
#[derive(Debug, Clone)]
pub struct TeleSlotInput {
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: i32,
    pub slot_type: Option<String>,
    pub appointment_duration_minutes: i32,
    pub gap_minutes: i32,
    /// Defaults to the number of appointments that fit the window
    pub capacity: Option<i32>,
    pub timezone: Option<String>,
}

/// Partial slot update; absent fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct TeleSlotPatch {
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub slot_type: Option<String>,
    pub appointment_duration_minutes: Option<i32>,
    pub gap_minutes: Option<i32>,
    pub capacity: Option<i32>,
    pub timezone: Option<String>,
}

impl TeleSlotPatch {
    fn merge(self, slot: &TeleSlot) -> TeleSlotInput {
        TeleSlotInput {
            date: self.date.unwrap_or(slot.date),
            start_time: self.start_time.unwrap_or_else(|| slot.start_time.clone()),
            duration_minutes: self.duration_minutes.unwrap_or(slot.duration_minutes),
            slot_type: self.slot_type.or_else(|| slot.slot_type.clone()),
            appointment_duration_minutes: self
                .appointment_duration_minutes
                .unwrap_or(slot.appointment_duration_minutes),
            gap_minutes: self.gap_minutes.unwrap_or(slot.gap_minutes),
            capacity: Some(self.capacity.unwrap_or(slot.capacity)),
            timezone: Some(self.timezone.unwrap_or_else(|| slot.timezone.clone())),
        }
    }
}

/// New position requested for one item
#[derive(Debug, Clone, Copy)]
pub struct ItemMove {
    pub item_id: TeleSlotItemId,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    #[serde(flatten)]
    pub item: TeleSlotItem,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    #[serde(flatten)]
    pub slot: TeleSlot,
    /// Appointments that fit the window
    pub available_capacity: i32,
    pub items: Vec<ScheduledItem>,
}

// ============================================================================
// Slot arithmetic
// ============================================================================

/// Appointments of `appointment` minutes, separated by `gap`, that fit in
/// `duration` minutes
pub fn available_capacity(duration: i32, appointment: i32, gap: i32) -> i32 {
    let step = appointment + gap;
    if step <= 0 {
        return 0;
    }
    ((duration + gap) / step).max(0)
}

fn check_minutes(field: &str, value: i32, min: i32) -> Result<(), DomainError> {
    if (min..=MAX_SLOT_MINUTES as i32).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "{} deve estar entre {} e {}",
            field, min, MAX_SLOT_MINUTES
        )))
    }
}

/// Validate a slot configuration and fill its defaults
pub fn resolve_slot(input: TeleSlotInput) -> Result<NewTeleSlot, DomainError> {
    check_planning_date(input.date)?;
    let start = parse_hhmm(&input.start_time).ok_or_else(|| {
        DomainError::Validation(format!("Horário inválido: {}", input.start_time))
    })?;
    check_minutes("durationMinutes", input.duration_minutes, 1)?;
    check_minutes(
        "appointmentDurationMinutes",
        input.appointment_duration_minutes,
        1,
    )?;
    check_minutes("gapMinutes", input.gap_minutes, 0)?;
    if input.appointment_duration_minutes > input.duration_minutes {
        return Err(DomainError::Validation(
            "Duração do atendimento maior que a do slot".to_string(),
        ));
    }

    let max = available_capacity(
        input.duration_minutes,
        input.appointment_duration_minutes,
        input.gap_minutes,
    );
    if max < 1 {
        return Err(DomainError::Validation(
            "Nenhum atendimento cabe no slot".to_string(),
        ));
    }
    let capacity = input.capacity.unwrap_or(max);
    if !(1..=max).contains(&capacity) {
        return Err(DomainError::Validation(format!(
            "Capacidade deve estar entre 1 e {}",
            max
        )));
    }

    let timezone = input
        .timezone
        .map(|tz| tz.trim().to_string())
        .filter(|tz| !tz.is_empty())
        .unwrap_or_else(|| DEFAULT_SLOT_TIMEZONE.to_string());

    Ok(NewTeleSlot {
        date: input.date,
        start_time: start.format("%H:%M").to_string(),
        duration_minutes: input.duration_minutes,
        slot_type: input
            .slot_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        appointment_duration_minutes: input.appointment_duration_minutes,
        gap_minutes: input.gap_minutes,
        capacity,
        timezone,
    })
}

/// Start and end of the appointment at position `order_index`
pub fn item_window(
    slot: &TeleSlot,
    order_index: i32,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DomainError> {
    let start_time = parse_hhmm(&slot.start_time).ok_or_else(|| {
        DomainError::Validation(format!("Horário inválido: {}", slot.start_time))
    })?;
    let base = local_instant(slot.date, start_time, offset);
    let step = i64::from(slot.appointment_duration_minutes) + i64::from(slot.gap_minutes);
    let start = step
        .checked_mul(i64::from(order_index))
        .and_then(Duration::try_minutes)
        .and_then(|d| base.checked_add_signed(d))
        .ok_or_else(out_of_calendar)?;
    let end = Duration::try_minutes(i64::from(slot.appointment_duration_minutes))
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(out_of_calendar)?;
    Ok((start, end))
}

fn out_of_calendar() -> DomainError {
    DomainError::Validation("Horário calculado fora do intervalo suportado".to_string())
}

/// Item ids ordered by the requested positions; unmoved items keep theirs
pub fn reordered(
    items: &[TeleSlotItem],
    moves: &[ItemMove],
) -> Result<Vec<TeleSlotItemId>, AppError> {
    let requested: HashMap<TeleSlotItemId, i32> =
        moves.iter().map(|m| (m.item_id, m.order_index)).collect();
    if let Some(unknown) = requested
        .keys()
        .find(|id| !items.iter().any(|item| item.id == **id))
    {
        return Err(AppError::NotFound(format!("Item {} não pertence ao slot", unknown)));
    }

    let mut keyed: Vec<(i32, i32, TeleSlotItemId)> = items
        .iter()
        .map(|item| {
            let target = requested.get(&item.id).copied().unwrap_or(item.order_index);
            (target, item.order_index, item.id)
        })
        .collect();
    keyed.sort_by_key(|(target, current, _)| (*target, *current));
    Ok(keyed.into_iter().map(|(_, _, id)| id).collect())
}

// ============================================================================
// Service
// ============================================================================

pub struct TelepericiaService<T, P>
where
    T: TelepericiaRepository,
    P: PericiaRepository,
{
    slots: Arc<T>,
    pericias: Arc<P>,
    offset: FixedOffset,
}

impl<T, P> TelepericiaService<T, P>
where
    T: TelepericiaRepository,
    P: PericiaRepository,
{
    pub fn new(slots: Arc<T>, pericias: Arc<P>, offset: FixedOffset) -> Self {
        Self {
            slots,
            pericias,
            offset,
        }
    }

    fn view(&self, slot: TeleSlot) -> Result<SlotView, AppError> {
        let items = slot
            .items
            .iter()
            .map(|item| -> Result<ScheduledItem, DomainError> {
                let (start_at, end_at) = item_window(&slot, item.order_index, self.offset)?;
                Ok(ScheduledItem {
                    item: item.clone(),
                    start_at,
                    end_at,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(SlotView {
            available_capacity: available_capacity(
                slot.duration_minutes,
                slot.appointment_duration_minutes,
                slot.gap_minutes,
            ),
            slot,
            items,
        })
    }

    async fn find(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<TeleSlot, AppError> {
        self.slots
            .find_slot(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Slot não encontrado.".to_string()))
    }

    /// Rewrite the scheduled date of every perícia in the slot and return
    /// the refreshed view
    async fn sync(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<SlotView, AppError> {
        let view = self.view(self.find(tenant, id).await?)?;
        let updates: Vec<ScheduleUpdate> = view
            .items
            .iter()
            .map(|scheduled| ScheduleUpdate {
                pericia_id: scheduled.item.pericia_id,
                data_agendamento: Some(scheduled.start_at),
                hora_agendamento: Some(
                    scheduled
                        .start_at
                        .with_timezone(&self.offset)
                        .format("%H:%M")
                        .to_string(),
                ),
            })
            .collect();
        if !updates.is_empty() {
            let written = self.pericias.set_schedules(tenant, &updates).await?;
            tracing::debug!(tenant_id = %tenant, slot_id = %id, written, "Slot schedules synced");
        }
        Ok(view)
    }

    async fn clear(&self, tenant: &TenantId, pericia_ids: &[PericiaId]) -> Result<(), AppError> {
        if pericia_ids.is_empty() {
            return Ok(());
        }
        let updates: Vec<ScheduleUpdate> = pericia_ids
            .iter()
            .copied()
            .map(ScheduleUpdate::clear)
            .collect();
        self.pericias.set_schedules(tenant, &updates).await?;
        Ok(())
    }

    pub async fn create_slot(
        &self,
        tenant: &TenantId,
        input: TeleSlotInput,
    ) -> Result<SlotView, AppError> {
        let slot = resolve_slot(input)?;
        let created = self.slots.create_slot(tenant, &slot).await?;
        tracing::info!(
            tenant_id = %tenant,
            slot_id = %created.id,
            date = %created.date,
            capacity = created.capacity,
            "Telepericia slot created"
        );
        self.view(created)
    }

    /// Ordered by date and start time
    pub async fn list_slots(&self, tenant: &TenantId) -> Result<Vec<SlotView>, AppError> {
        self.slots
            .list_slots(tenant)
            .await?
            .into_iter()
            .map(|slot| self.view(slot))
            .collect()
    }

    pub async fn get_slot(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<SlotView, AppError> {
        let slot = self.find(tenant, id).await?;
        self.view(slot)
    }

    pub async fn update_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        patch: TeleSlotPatch,
    ) -> Result<SlotView, AppError> {
        let current = self.find(tenant, id).await?;
        let slot = resolve_slot(patch.merge(&current))?;
        if current.items.len() > slot.capacity as usize {
            return Err(AppError::BadRequest(format!(
                "Slot possui {} perícias; capacidade {} insuficiente",
                current.items.len(),
                slot.capacity
            )));
        }
        self.slots.update_slot(tenant, id, &slot).await?;
        tracing::info!(tenant_id = %tenant, slot_id = %id, "Telepericia slot updated");
        self.sync(tenant, id).await
    }

    /// Deleting a slot unschedules its perícias
    pub async fn delete_slot(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<(), AppError> {
        let slot = self.find(tenant, id).await?;
        let pericia_ids: Vec<PericiaId> = slot.items.iter().map(|i| i.pericia_id).collect();
        self.slots.delete_slot(tenant, id).await?;
        self.clear(tenant, &pericia_ids).await?;
        tracing::info!(
            tenant_id = %tenant,
            slot_id = %id,
            unscheduled = pericia_ids.len(),
            "Telepericia slot deleted"
        );
        Ok(())
    }

    /// Append a perícia to the end of the slot
    pub async fn assign(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        pericia_id: &PericiaId,
    ) -> Result<SlotView, AppError> {
        let slot = self.find(tenant, id).await?;
        if self.pericias.find_by_id(tenant, pericia_id).await?.is_none() {
            return Err(AppError::NotFound("Perícia não encontrada.".to_string()));
        }
        if slot.items.iter().any(|i| i.pericia_id == *pericia_id) {
            return Err(AppError::BadRequest(
                "Perícia já atribuída a este slot".to_string(),
            ));
        }
        let limit = slot.capacity.min(available_capacity(
            slot.duration_minutes,
            slot.appointment_duration_minutes,
            slot.gap_minutes,
        ));
        let order_index = i32::try_from(slot.items.len())
            .map_err(|_| AppError::BadRequest("Slot lotado".to_string()))?;
        if order_index >= limit {
            return Err(AppError::BadRequest("Slot lotado".to_string()));
        }

        let item = self
            .slots
            .add_item(tenant, id, pericia_id, order_index)
            .await?;
        tracing::info!(
            tenant_id = %tenant,
            slot_id = %id,
            pericia_id = %pericia_id,
            order_index = item.order_index,
            "Perícia assigned to telepericia slot"
        );
        self.sync(tenant, id).await
    }

    pub async fn reorder(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        moves: &[ItemMove],
    ) -> Result<SlotView, AppError> {
        let slot = self.find(tenant, id).await?;
        let ordered = reordered(&slot.items, moves)?;
        self.slots.set_item_order(tenant, id, &ordered).await?;
        tracing::info!(tenant_id = %tenant, slot_id = %id, "Telepericia slot reordered");
        self.sync(tenant, id).await
    }

    /// Remove one item, close the gap it leaves and unschedule its perícia
    pub async fn delete_item(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        item_id: &TeleSlotItemId,
    ) -> Result<SlotView, AppError> {
        let slot = self.find(tenant, id).await?;
        let item = slot
            .items
            .iter()
            .find(|i| i.id == *item_id)
            .ok_or_else(|| AppError::NotFound("Item não encontrado.".to_string()))?;
        let pericia_id = item.pericia_id;

        self.slots.remove_item(tenant, id, item_id).await?;
        self.clear(tenant, &[pericia_id]).await?;
        tracing::info!(
            tenant_id = %tenant,
            slot_id = %id,
            pericia_id = %pericia_id,
            "Perícia removed from telepericia slot"
        );
        self.sync(tenant, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use crate::test_utils::{
        test_pericia, InMemoryPericiaRepository, InMemoryTelepericiaRepository,
    };

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn input() -> TeleSlotInput {
        TeleSlotInput {
            date: day(),
            start_time: "09:00".to_string(),
            duration_minutes: 60,
            slot_type: Some("INSS".to_string()),
            appointment_duration_minutes: 15,
            gap_minutes: 5,
            capacity: None,
            timezone: None,
        }
    }

    type Service = TelepericiaService<InMemoryTelepericiaRepository, InMemoryPericiaRepository>;

    fn service(pericias: InMemoryPericiaRepository) -> (Service, Arc<InMemoryPericiaRepository>) {
        let pericias = Arc::new(pericias);
        let service = TelepericiaService::new(
            Arc::new(InMemoryTelepericiaRepository::new()),
            pericias.clone(),
            offset(),
        );
        (service, pericias)
    }

    #[test]
    fn capacity_counts_the_trailing_gap_once() {
        assert_eq!(available_capacity(60, 15, 5), 3);
        assert_eq!(available_capacity(60, 20, 0), 3);
        assert_eq!(available_capacity(55, 15, 5), 3);
        assert_eq!(available_capacity(10, 15, 5), 0);
        assert_eq!(available_capacity(60, 0, 0), 0);
    }

    #[test]
    fn resolve_slot_defaults_and_rejections() {
        let slot = resolve_slot(input()).unwrap();
        assert_eq!(slot.capacity, 3);
        assert_eq!(slot.timezone, DEFAULT_SLOT_TIMEZONE);

        let too_long = TeleSlotInput {
            appointment_duration_minutes: 90,
            ..input()
        };
        assert!(matches!(
            resolve_slot(too_long),
            Err(DomainError::Validation(_))
        ));

        let over_capacity = TeleSlotInput {
            capacity: Some(4),
            ..input()
        };
        assert!(resolve_slot(over_capacity).is_err());

        let bad_time = TeleSlotInput {
            start_time: "25:00".to_string(),
            ..input()
        };
        assert!(resolve_slot(bad_time).is_err());

        let huge = TeleSlotInput {
            duration_minutes: i32::MAX,
            ..input()
        };
        assert!(resolve_slot(huge).is_err());
    }

    #[test]
    fn reordered_falls_back_to_current_position() {
        let slot_id = TeleSlotId::new();
        let tenant = TenantId::new();
        let items: Vec<TeleSlotItem> = (0..3)
            .map(|i| TeleSlotItem {
                id: TeleSlotItemId::new(),
                tenant_id: tenant,
                slot_id,
                pericia_id: PericiaId::new(),
                order_index: i,
                created_at: Utc::now(),
            })
            .collect();

        let moves = [ItemMove {
            item_id: items[0].id,
            order_index: 5,
        }];
        let ordered = reordered(&items, &moves).unwrap();
        assert_eq!(ordered, vec![items[1].id, items[2].id, items[0].id]);

        let unknown = [ItemMove {
            item_id: TeleSlotItemId::new(),
            order_index: 0,
        }];
        assert!(matches!(
            reordered(&items, &unknown),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn assign_schedules_pericias_in_call_order() {
        let tenant = TenantId::new();
        let first = test_pericia(tenant);
        let second = test_pericia(tenant);
        let (first_id, second_id) = (first.id, second.id);
        let (service, pericias) = service(
            InMemoryPericiaRepository::new()
                .with_pericia(first)
                .with_pericia(second),
        );

        let slot = service.create_slot(&tenant, input()).await.unwrap();
        service.assign(&tenant, &slot.slot.id, &first_id).await.unwrap();
        let view = service.assign(&tenant, &slot.slot.id, &second_id).await.unwrap();

        assert_eq!(view.items.len(), 2);
        let nine = offset()
            .from_local_datetime(&day().and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()))
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(view.items[0].start_at, nine);
        assert_eq!(view.items[1].start_at, nine + Duration::minutes(20));
        assert_eq!(view.items[1].end_at, nine + Duration::minutes(35));

        let stored = pericias.find_by_id(&tenant, &second_id).await.unwrap().unwrap();
        assert!(stored.agendada);
        assert_eq!(stored.data_agendamento, Some(nine + Duration::minutes(20)));
        assert_eq!(stored.hora_agendamento.as_deref(), Some("09:20"));
    }

    #[tokio::test]
    async fn assign_rejects_duplicates_unknown_and_full_slots() {
        let tenant = TenantId::new();
        let pericias: Vec<_> = (0..3).map(|_| test_pericia(tenant)).collect();
        let ids: Vec<PericiaId> = pericias.iter().map(|p| p.id).collect();
        let repo = pericias
            .into_iter()
            .fold(InMemoryPericiaRepository::new(), |repo, p| repo.with_pericia(p));
        let (service, _) = service(repo);

        let slot = service
            .create_slot(
                &tenant,
                TeleSlotInput {
                    capacity: Some(2),
                    ..input()
                },
            )
            .await
            .unwrap();
        let id = slot.slot.id;

        service.assign(&tenant, &id, &ids[0]).await.unwrap();
        assert!(matches!(
            service.assign(&tenant, &id, &ids[0]).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.assign(&tenant, &id, &PericiaId::new()).await,
            Err(AppError::NotFound(_))
        ));
        service.assign(&tenant, &id, &ids[1]).await.unwrap();
        assert!(matches!(
            service.assign(&tenant, &id, &ids[2]).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn slots_are_tenant_scoped() {
        let tenant = TenantId::new();
        let (service, _) = service(InMemoryPericiaRepository::new());
        let slot = service.create_slot(&tenant, input()).await.unwrap();

        let other = TenantId::new();
        assert!(matches!(
            service.get_slot(&other, &slot.slot.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list_slots(&other).await.unwrap().is_empty());
        assert_eq!(service.list_slots(&tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reorder_moves_schedules_with_items() {
        let tenant = TenantId::new();
        let first = test_pericia(tenant);
        let second = test_pericia(tenant);
        let (first_id, second_id) = (first.id, second.id);
        let (service, pericias) = service(
            InMemoryPericiaRepository::new()
                .with_pericia(first)
                .with_pericia(second),
        );
        let slot = service.create_slot(&tenant, input()).await.unwrap();
        let id = slot.slot.id;
        service.assign(&tenant, &id, &first_id).await.unwrap();
        let view = service.assign(&tenant, &id, &second_id).await.unwrap();

        let moves = [ItemMove {
            item_id: view.items[1].item.id,
            order_index: 0,
        }];
        let view = service.reorder(&tenant, &id, &moves).await.unwrap();
        assert_eq!(view.items[0].item.pericia_id, second_id);
        assert_eq!(view.items[0].item.order_index, 0);
        assert_eq!(view.items[1].item.order_index, 1);

        let moved = pericias.find_by_id(&tenant, &first_id).await.unwrap().unwrap();
        assert_eq!(moved.hora_agendamento.as_deref(), Some("09:20"));
    }

    #[tokio::test]
    async fn delete_item_closes_the_gap_and_unschedules() {
        let tenant = TenantId::new();
        let first = test_pericia(tenant);
        let second = test_pericia(tenant);
        let (first_id, second_id) = (first.id, second.id);
        let (service, pericias) = service(
            InMemoryPericiaRepository::new()
                .with_pericia(first)
                .with_pericia(second),
        );
        let slot = service.create_slot(&tenant, input()).await.unwrap();
        let id = slot.slot.id;
        service.assign(&tenant, &id, &first_id).await.unwrap();
        let view = service.assign(&tenant, &id, &second_id).await.unwrap();

        let view = service
            .delete_item(&tenant, &id, &view.items[0].item.id)
            .await
            .unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].item.order_index, 0);

        let removed = pericias.find_by_id(&tenant, &first_id).await.unwrap().unwrap();
        assert!(!removed.agendada);
        assert!(removed.data_agendamento.is_none());
        let kept = pericias.find_by_id(&tenant, &second_id).await.unwrap().unwrap();
        assert_eq!(kept.hora_agendamento.as_deref(), Some("09:00"));

        assert!(matches!(
            service.delete_item(&tenant, &id, &TeleSlotItemId::new()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_cannot_shrink_below_assigned_items() {
        let tenant = TenantId::new();
        let first = test_pericia(tenant);
        let second = test_pericia(tenant);
        let (first_id, second_id) = (first.id, second.id);
        let (service, pericias) = service(
            InMemoryPericiaRepository::new()
                .with_pericia(first)
                .with_pericia(second),
        );
        let slot = service.create_slot(&tenant, input()).await.unwrap();
        let id = slot.slot.id;
        service.assign(&tenant, &id, &first_id).await.unwrap();
        service.assign(&tenant, &id, &second_id).await.unwrap();

        let shrink = TeleSlotPatch {
            capacity: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            service.update_slot(&tenant, &id, shrink).await,
            Err(AppError::BadRequest(_))
        ));

        let later = TeleSlotPatch {
            start_time: Some("14:00".to_string()),
            ..Default::default()
        };
        let view = service.update_slot(&tenant, &id, later).await.unwrap();
        assert_eq!(view.slot.start_time, "14:00");
        let moved = pericias.find_by_id(&tenant, &second_id).await.unwrap().unwrap();
        assert_eq!(moved.hora_agendamento.as_deref(), Some("14:20"));
    }

    #[tokio::test]
    async fn delete_slot_unschedules_its_pericias() {
        let tenant = TenantId::new();
        let pericia = test_pericia(tenant);
        let pericia_id = pericia.id;
        let (service, pericias) = service(InMemoryPericiaRepository::new().with_pericia(pericia));
        let slot = service.create_slot(&tenant, input()).await.unwrap();
        service.assign(&tenant, &slot.slot.id, &pericia_id).await.unwrap();

        service.delete_slot(&tenant, &slot.slot.id).await.unwrap();

        let stored = pericias.find_by_id(&tenant, &pericia_id).await.unwrap().unwrap();
        assert!(!stored.agendada);
        assert!(matches!(
            service.get_slot(&tenant, &slot.slot.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
