//! Lawyer domain entity

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PericiaId, TenantId};

entity_id!(
    /// Unique identifier for a lawyer
    LawyerId
);

wire_enum!(
    /// Side the lawyer represents in a case
    CaseRole {
        Autor => "AUTOR",
        Reu => "REU",
        Outro => "OUTRO",
    } default Outro
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lawyer {
    pub id: LawyerId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub nome: String,
    pub oab: Option<String>,
    pub uf_oab: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLawyer {
    pub nome: String,
    pub oab: Option<String>,
    pub uf_oab: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LawyerPatch {
    pub nome: Option<String>,
    pub oab: Option<String>,
    pub uf_oab: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
}

impl LawyerPatch {
    pub fn apply(self, lawyer: &mut Lawyer) {
        if let Some(nome) = self.nome {
            lawyer.nome = nome;
        }
        lawyer.oab = self.oab.or(lawyer.oab.take());
        lawyer.uf_oab = self.uf_oab.or(lawyer.uf_oab.take());
        lawyer.email = self.email.or(lawyer.email.take());
        lawyer.telefone = self.telefone.or(lawyer.telefone.take());
        lawyer.observacoes = self.observacoes.or(lawyer.observacoes.take());
    }
}

/// Link between a lawyer and a perícia
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LawyerOnPericia {
    pub lawyer_id: LawyerId,
    pub pericia_id: PericiaId,
    pub role_in_case: CaseRole,
}
