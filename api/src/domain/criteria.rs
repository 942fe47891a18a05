//! Perícia query criteria
//!
//! Dashboard buckets, operational stages and list filters are all expressed
//! as data. The in-memory repository evaluates them with [`PericiaCriterion::matches`];
//! the PostgreSQL adapter translates them into SQL conditions.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entities::{CatalogItemId, PagamentoStatus, Pericia};

#[derive(Debug, Clone, PartialEq)]
pub enum PericiaCriterion {
    Finalizada(bool),
    Agendada(bool),
    LaudoEnviado(bool),
    Urgent(bool),
    /// Status is one of the ids; an empty list matches nothing
    StatusIn(Vec<CatalogItemId>),
    Cidade(CatalogItemId),
    TipoPericia(CatalogItemId),
    Vara(CatalogItemId),
    PagamentoStatus(PagamentoStatus),
    HasDataAgendamento(bool),
    HasDataRealizacao(bool),
    HasExtraObservation(bool),
    /// Scheduled date within `[from, to]`
    ScheduledBetween(DateTime<Utc>, DateTime<Utc>),
    /// Appointment date within the optional inclusive bounds
    NomeacaoBetween(Option<NaiveDate>, Option<NaiveDate>),
    /// JG fee within the optional inclusive bounds (centavos)
    HonorariosBetween(Option<i64>, Option<i64>),
    /// Case-insensitive substring over CNJ, periciado and observations
    Search(String),
    /// At least one nested criterion holds; empty matches nothing
    AnyOf(Vec<PericiaCriterion>),
}

impl PericiaCriterion {
    pub fn matches(&self, p: &Pericia) -> bool {
        match self {
            PericiaCriterion::Finalizada(v) => p.finalizada == *v,
            PericiaCriterion::Agendada(v) => p.agendada == *v,
            PericiaCriterion::LaudoEnviado(v) => p.laudo_enviado == *v,
            PericiaCriterion::Urgent(v) => p.is_urgent == *v,
            PericiaCriterion::StatusIn(ids) => p.status_id.is_some_and(|s| ids.contains(&s)),
            PericiaCriterion::Cidade(id) => p.cidade_id == Some(*id),
            PericiaCriterion::TipoPericia(id) => p.tipo_pericia_id == Some(*id),
            PericiaCriterion::Vara(id) => p.vara_id == Some(*id),
            PericiaCriterion::PagamentoStatus(s) => p.pagamento_status == *s,
            PericiaCriterion::HasDataAgendamento(v) => p.data_agendamento.is_some() == *v,
            PericiaCriterion::HasDataRealizacao(v) => p.data_realizacao.is_some() == *v,
            PericiaCriterion::HasExtraObservation(v) => {
                p.extra_observation
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty())
                    == *v
            }
            PericiaCriterion::ScheduledBetween(from, to) => p
                .data_agendamento
                .is_some_and(|d| d >= *from && d <= *to),
            PericiaCriterion::NomeacaoBetween(from, to) => match p.data_nomeacao {
                Some(d) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
                None => from.is_none() && to.is_none(),
            },
            PericiaCriterion::HonorariosBetween(min, max) => match p.honorarios_previstos_jg {
                Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
                None => min.is_none() && max.is_none(),
            },
            PericiaCriterion::Search(term) => {
                let needle = term.to_lowercase();
                let hit = |s: Option<&str>| s.is_some_and(|s| s.to_lowercase().contains(&needle));
                hit(Some(&p.processo_cnj))
                    || hit(p.periciado_nome.as_deref())
                    || hit(p.observacoes.as_deref())
            }
            PericiaCriterion::AnyOf(inner) => inner.iter().any(|c| c.matches(p)),
        }
    }
}

/// Every criterion must hold
pub fn matches_all(criteria: &[PericiaCriterion], p: &Pericia) -> bool {
    criteria.iter().all(|c| c.matches(p))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PericiaOrder {
    #[default]
    CreatedDesc,
    ScheduledAsc,
    NomeacaoDesc,
}

/// A filtered, ordered, optionally windowed perícia query
#[derive(Debug, Clone, Default)]
pub struct PericiaQuery {
    pub criteria: Vec<PericiaCriterion>,
    pub order: PericiaOrder,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl PericiaQuery {
    pub fn new(criteria: Vec<PericiaCriterion>) -> Self {
        Self {
            criteria,
            ..Default::default()
        }
    }

    pub fn order(mut self, order: PericiaOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Window of the 1-based `page`; the offset saturates instead of wrapping
    pub fn page(mut self, page: u64, limit: u64) -> Self {
        self.offset = page.saturating_sub(1).saturating_mul(limit);
        self.limit = Some(limit);
        self
    }
}
