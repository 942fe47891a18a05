//! Tenant domain entity
//!
//! Every record in the system belongs to exactly one tenant. Repositories
//! scope all reads and writes by `TenantId`.

use chrono::{DateTime, Utc};
use serde::Serialize;

entity_id!(
    /// Unique identifier for a tenant
    TenantId
);

/// An isolated customer partition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub nome: String,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
}
