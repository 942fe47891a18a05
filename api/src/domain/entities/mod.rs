//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

/// Declare a UUID-backed identifier newtype
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Declare a SCREAMING_SNAKE_CASE string enum with Display/FromStr
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => write!(f, $text)),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(concat!("Unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

pub mod activity;
pub mod agenda;
pub mod catalog;
pub mod financial;
pub mod laudo;
pub mod lawyer;
pub mod notification;
pub mod pericia;
pub mod telepericia;
pub mod tenant;

pub use activity::{ActivityLog, NewActivityLog, NewStatusLog, StatusLog};
pub use agenda::{
    AgendaEvent, AgendaEventId, AgendaEventPatch, AgendaTask, AgendaTaskId, AgendaTaskPatch,
    BatchItemResult, BatchResult, BatchStatus, EventSource, EventStatus, EventType,
    NewAgendaEvent, NewAgendaTask, NewSchedulingBatch, SchedulingBatch, SchedulingBatchId,
    StatusHistoryEntry, TaskStatus, DEFAULT_EVENT_MINUTES, MIN_EVENT_MINUTES,
};
pub use catalog::{CatalogItem, CatalogItemId, CatalogItemPatch, CatalogResource, NewCatalogItem};
pub use financial::{
    Despesa, DespesaId, FontePagamento, ImportBatch, ImportBatchId, ImportStatus, MatchStatus,
    NewDespesa, NewRecebimento, NewUnmatchedPayment, Recebimento, RecebimentoId,
    UnmatchedPayment, UnmatchedPaymentId,
};
pub use laudo::{Laudo, LaudoId, LaudoPatch, LaudoStatus, NewLaudo};
pub use lawyer::{CaseRole, Lawyer, LawyerId, LawyerOnPericia, LawyerPatch, NewLawyer};
pub use notification::{
    NotificationChannel, NotificationConfig, NotificationConfigId, RealtimeNotification,
};
pub use pericia::{
    normalize_cnj, NewPericia, PagamentoStatus, Pericia, PericiaId, PericiaPatch, ScheduleUpdate,
    StatusChange,
};
pub use telepericia::{
    NewTeleSlot, TeleSlot, TeleSlotId, TeleSlotItem, TeleSlotItemId, DEFAULT_SLOT_TIMEZONE,
};
pub use tenant::{Tenant, TenantId};
