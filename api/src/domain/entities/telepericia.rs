//! Telepericia domain entities
//!
//! A slot is a window of remote appointments on one day; its items are the
//! perícias assigned to it, in call order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{PericiaId, TenantId};

entity_id!(
    /// Unique identifier for a telepericia slot
    TeleSlotId
);

entity_id!(
    /// Unique identifier for a perícia placed in a slot
    TeleSlotItemId
);

/// Timezone recorded on slots created without one
pub const DEFAULT_SLOT_TIMEZONE: &str = "America/Sao_Paulo";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeleSlot {
    pub id: TeleSlotId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    /// Local start of the first appointment, `HH:MM`
    pub start_time: String,
    pub duration_minutes: i32,
    pub slot_type: Option<String>,
    pub appointment_duration_minutes: i32,
    pub gap_minutes: i32,
    pub capacity: i32,
    pub timezone: String,
    /// Items ordered by `order_index`
    #[serde(skip)]
    pub items: Vec<TeleSlotItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeleSlotItem {
    pub id: TeleSlotItemId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub slot_id: TeleSlotId,
    pub pericia_id: PericiaId,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// Slot configuration, used both to create a slot and to replace one
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeleSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: i32,
    pub slot_type: Option<String>,
    pub appointment_duration_minutes: i32,
    pub gap_minutes: i32,
    pub capacity: i32,
    pub timezone: String,
}
