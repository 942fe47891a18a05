//! Laudo (expert report) domain entity

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PericiaId, TenantId};

entity_id!(
    /// Unique identifier for a laudo
    LaudoId
);

wire_enum!(
    LaudoStatus {
        NotStarted => "NOT_STARTED",
        InProgress => "IN_PROGRESS",
        Done => "DONE",
    } default NotStarted
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Laudo {
    pub id: LaudoId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub pericia_id: PericiaId,
    pub title: String,
    pub status: LaudoStatus,
    pub content: Option<String>,
    /// Structured report sections as edited by the frontend
    pub sections: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLaudo {
    pub pericia_id: PericiaId,
    pub title: String,
    pub status: LaudoStatus,
    pub content: Option<String>,
    pub sections: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct LaudoPatch {
    pub title: Option<String>,
    pub status: Option<LaudoStatus>,
    pub content: Option<String>,
    pub sections: Option<serde_json::Value>,
}

impl LaudoPatch {
    pub fn apply(self, laudo: &mut Laudo) {
        if let Some(title) = self.title {
            laudo.title = title;
        }
        if let Some(status) = self.status {
            laudo.status = status;
        }
        if let Some(content) = self.content {
            laudo.content = Some(content);
        }
        if let Some(sections) = self.sections {
            laudo.sections = sections;
        }
    }
}
