//! Audit trail entities
//!
//! `StatusLog` records every workflow status transition of a perícia.
//! `ActivityLog` records other notable actions (urgency flag, imports).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{CatalogItemId, PericiaId, TenantId};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLog {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub pericia_id: PericiaId,
    pub status_anterior_id: Option<CatalogItemId>,
    pub status_novo_id: CatalogItemId,
    pub motivo: Option<String>,
    pub metadata: serde_json::Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStatusLog {
    pub status_anterior_id: Option<CatalogItemId>,
    pub status_novo_id: CatalogItemId,
    pub motivo: Option<String>,
    pub metadata: serde_json::Value,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub payload: serde_json::Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub payload: serde_json::Value,
    pub created_by: Option<String>,
}
