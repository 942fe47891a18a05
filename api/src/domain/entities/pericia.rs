//! Perícia domain entity
//!
//! A court-appointed expert examination tracked from appointment
//! (nomeação) through scheduling, report delivery and payment.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{CatalogItemId, NewStatusLog, TenantId};
use crate::error::DomainError;

entity_id!(
    /// Unique identifier for a perícia
    PericiaId
);

/// Payment situation of the expert's fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PagamentoStatus {
    #[default]
    Pendente,
    Parcial,
    Pago,
    Atrasado,
}

impl std::fmt::Display for PagamentoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PagamentoStatus::Pendente => write!(f, "PENDENTE"),
            PagamentoStatus::Parcial => write!(f, "PARCIAL"),
            PagamentoStatus::Pago => write!(f, "PAGO"),
            PagamentoStatus::Atrasado => write!(f, "ATRASADO"),
        }
    }
}

impl std::str::FromStr for PagamentoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDENTE" => Ok(PagamentoStatus::Pendente),
            "PARCIAL" => Ok(PagamentoStatus::Parcial),
            "PAGO" => Ok(PagamentoStatus::Pago),
            "ATRASADO" => Ok(PagamentoStatus::Atrasado),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

/// A perícia as stored
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pericia {
    pub id: PericiaId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    #[serde(rename = "processoCNJ")]
    pub processo_cnj: String,
    pub cidade_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub modalidade_id: Option<CatalogItemId>,
    pub status_id: Option<CatalogItemId>,
    pub local_id: Option<CatalogItemId>,
    pub juiz_nome: Option<String>,
    pub autor_nome: Option<String>,
    pub reu_nome: Option<String>,
    pub periciado_nome: Option<String>,
    pub observacoes: Option<String>,
    /// Clarification request text; presence means the court asked for one
    pub extra_observation: Option<String>,
    /// Expected fees paid by the court (justiça gratuita), in centavos
    #[serde(rename = "honorariosPrevistosJG")]
    pub honorarios_previstos_jg: Option<i64>,
    /// Expected fees paid by the parties, in centavos
    pub honorarios_previstos_partes: Option<i64>,
    pub pagamento_status: PagamentoStatus,
    pub is_urgent: bool,
    pub urgent_checked_at: Option<DateTime<Utc>>,
    pub agendada: bool,
    pub laudo_enviado: bool,
    pub finalizada: bool,
    pub data_nomeacao: Option<NaiveDate>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub data_realizacao: Option<DateTime<Utc>>,
    pub data_envio_laudo: Option<DateTime<Utc>>,
    pub origem_importacao: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create a perícia
#[derive(Debug, Clone, Default)]
pub struct NewPericia {
    pub processo_cnj: String,
    pub cidade_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub modalidade_id: Option<CatalogItemId>,
    pub status_id: Option<CatalogItemId>,
    pub local_id: Option<CatalogItemId>,
    pub juiz_nome: Option<String>,
    pub autor_nome: Option<String>,
    pub reu_nome: Option<String>,
    pub periciado_nome: Option<String>,
    pub observacoes: Option<String>,
    pub extra_observation: Option<String>,
    pub honorarios_previstos_jg: Option<i64>,
    pub honorarios_previstos_partes: Option<i64>,
    pub pagamento_status: PagamentoStatus,
    pub is_urgent: bool,
    pub data_nomeacao: Option<NaiveDate>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub origem_importacao: Option<String>,
}

/// Partial update of a perícia; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct PericiaPatch {
    pub processo_cnj: Option<String>,
    pub cidade_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub modalidade_id: Option<CatalogItemId>,
    pub status_id: Option<CatalogItemId>,
    pub local_id: Option<CatalogItemId>,
    pub juiz_nome: Option<String>,
    pub autor_nome: Option<String>,
    pub reu_nome: Option<String>,
    pub periciado_nome: Option<String>,
    pub observacoes: Option<String>,
    pub extra_observation: Option<String>,
    pub honorarios_previstos_jg: Option<i64>,
    pub honorarios_previstos_partes: Option<i64>,
    pub pagamento_status: Option<PagamentoStatus>,
    pub is_urgent: Option<bool>,
    pub urgent_checked_at: Option<DateTime<Utc>>,
    pub agendada: Option<bool>,
    pub laudo_enviado: Option<bool>,
    pub finalizada: Option<bool>,
    pub data_nomeacao: Option<NaiveDate>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub data_realizacao: Option<DateTime<Utc>>,
    pub data_envio_laudo: Option<DateTime<Utc>>,
}

impl PericiaPatch {
    /// Apply the patch in place
    pub fn apply(&self, p: &mut Pericia) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    p.$field = v.clone();
                }
            };
            ($field:ident, opt) => {
                if let Some(v) = &self.$field {
                    p.$field = Some(v.clone());
                }
            };
        }

        set!(processo_cnj);
        set!(cidade_id, opt);
        set!(vara_id, opt);
        set!(tipo_pericia_id, opt);
        set!(modalidade_id, opt);
        set!(status_id, opt);
        set!(local_id, opt);
        set!(juiz_nome, opt);
        set!(autor_nome, opt);
        set!(reu_nome, opt);
        set!(periciado_nome, opt);
        set!(observacoes, opt);
        set!(extra_observation, opt);
        set!(honorarios_previstos_jg, opt);
        set!(honorarios_previstos_partes, opt);
        set!(pagamento_status);
        set!(is_urgent);
        set!(urgent_checked_at, opt);
        set!(agendada);
        set!(laudo_enviado);
        set!(finalizada);
        set!(data_nomeacao, opt);
        set!(data_agendamento, opt);
        set!(hora_agendamento, opt);
        set!(data_realizacao, opt);
        set!(data_envio_laudo, opt);
    }
}

/// Scheduled date of a perícia set from outside the status workflow;
/// `agendada` follows whether a date is present
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleUpdate {
    pub pericia_id: PericiaId,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
}

impl ScheduleUpdate {
    pub fn clear(pericia_id: PericiaId) -> Self {
        Self {
            pericia_id,
            data_agendamento: None,
            hora_agendamento: None,
        }
    }

    pub fn apply(&self, p: &mut Pericia) {
        p.data_agendamento = self.data_agendamento;
        p.hora_agendamento = self.hora_agendamento.clone();
        p.agendada = self.data_agendamento.is_some();
    }
}

/// A status transition ready to be persisted atomically with its log entry
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub pericia_id: PericiaId,
    pub patch: PericiaPatch,
    pub log: NewStatusLog,
}

fn cnj_formatted() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}$").expect("valid CNJ regex")
    })
}

/// Validate a CNJ process number and return its canonical
/// `NNNNNNN-DD.AAAA.J.TR.OOOO` form. Bare 20-digit numbers are formatted.
pub fn normalize_cnj(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if cnj_formatted().is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let only_separators = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '));
    if digits.len() != 20 || !only_separators {
        return Err(DomainError::Validation(format!(
            "Número CNJ inválido: {}",
            raw
        )));
    }

    Ok(format!(
        "{}-{}.{}.{}.{}.{}",
        &digits[0..7],
        &digits[7..9],
        &digits[9..13],
        &digits[13..14],
        &digits[14..16],
        &digits[16..20]
    ))
}
