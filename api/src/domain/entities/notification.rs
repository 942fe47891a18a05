//! Notification entities
//!
//! Per-tenant channel rules and the realtime message broadcast to
//! connected clients.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TenantId;

entity_id!(
    /// Unique identifier for a notification rule
    NotificationConfigId
);

wire_enum!(
    NotificationChannel {
        Email => "EMAIL",
        Whatsapp => "WHATSAPP",
        Push => "PUSH",
        InApp => "IN_APP",
    } default InApp
);

/// Delivery rule for one channel of a tenant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    pub id: NotificationConfigId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub channel: NotificationChannel,
    pub enabled: bool,
    pub config: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Message pushed to a tenant's live connections
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeNotification {
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub event: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
