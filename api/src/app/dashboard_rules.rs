//! Dashboard bucket rules
//!
//! Each bucket is an exclusive queue selected by official status codes.
//! Codes are resolved against the tenant's status catalog at query time;
//! codes the tenant has not registered are dropped, and a bucket left with
//! no ids matches nothing.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::app::status_engine::WorkflowStatus::{self, *};
use crate::domain::criteria::PericiaCriterion;
use crate::domain::entities::CatalogItemId;

/// Length of the "próximas perícias" look-ahead window
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardBucket {
    Nomeacoes,
    AgendarData,
    ProximasPericias,
    EnviarLaudos,
    Esclarecimentos,
    AReceber,
    AusenciasPendentes,
}

impl DashboardBucket {
    pub const ALL: [DashboardBucket; 7] = [
        DashboardBucket::Nomeacoes,
        DashboardBucket::AgendarData,
        DashboardBucket::ProximasPericias,
        DashboardBucket::EnviarLaudos,
        DashboardBucket::Esclarecimentos,
        DashboardBucket::AReceber,
        DashboardBucket::AusenciasPendentes,
    ];

    /// Wire key, as used in URLs
    pub fn key(&self) -> &'static str {
        match self {
            DashboardBucket::Nomeacoes => "nomeacoes",
            DashboardBucket::AgendarData => "agendarData",
            DashboardBucket::ProximasPericias => "proximasPericias",
            DashboardBucket::EnviarLaudos => "enviarLaudos",
            DashboardBucket::Esclarecimentos => "esclarecimentos",
            DashboardBucket::AReceber => "aReceber",
            DashboardBucket::AusenciasPendentes => "ausenciasPendentes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DashboardBucket::Nomeacoes => "Nomeações",
            DashboardBucket::AgendarData => "Agendar Data",
            DashboardBucket::ProximasPericias => "Próximas Perícias",
            DashboardBucket::EnviarLaudos => "Enviar Laudos",
            DashboardBucket::Esclarecimentos => "Esclarecimentos",
            DashboardBucket::AReceber => "A Receber",
            DashboardBucket::AusenciasPendentes => "Ausências Pendentes",
        }
    }

    pub fn status_codes(&self) -> &'static [WorkflowStatus] {
        match self {
            DashboardBucket::Nomeacoes => {
                &[Avaliar, Majorar, AguardandoAceiteHonorarios, FazerIndireta]
            }
            DashboardBucket::AgendarData => &[AgendarData, Telepericia],
            DashboardBucket::ProximasPericias => &[DataAgendada],
            DashboardBucket::EnviarLaudos => &[EnviarLaudo],
            DashboardBucket::Esclarecimentos => &[Esclarecimentos],
            DashboardBucket::AReceber => &[AguardandoPag, RecebidoParcialmente],
            DashboardBucket::AusenciasPendentes => &[Ausente, AusenciaInformada],
        }
    }

    /// Payment queues stay visible after a perícia is closed
    fn excludes_finalized(&self) -> bool {
        !matches!(self, DashboardBucket::AReceber)
    }
}

impl std::fmt::Display for DashboardBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for DashboardBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DashboardBucket::ALL
            .into_iter()
            .find(|b| b.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown dashboard bucket: {}", s))
    }
}

/// Every status code referenced by some bucket
pub fn all_bucket_codes() -> Vec<&'static str> {
    DashboardBucket::ALL
        .iter()
        .flat_map(|b| b.status_codes().iter().map(|c| c.as_str()))
        .collect()
}

/// Criteria selecting the perícias of `bucket`.
///
/// `today` is the start of the current local day, in UTC.
pub fn bucket_criteria(
    bucket: DashboardBucket,
    status_ids: &HashMap<String, CatalogItemId>,
    today: DateTime<Utc>,
) -> Vec<PericiaCriterion> {
    let ids: Vec<CatalogItemId> = bucket
        .status_codes()
        .iter()
        .filter_map(|code| status_ids.get(code.as_str()).copied())
        .collect();

    let mut criteria = vec![PericiaCriterion::StatusIn(ids)];
    if bucket.excludes_finalized() {
        criteria.push(PericiaCriterion::Finalizada(false));
    }
    if bucket == DashboardBucket::ProximasPericias {
        criteria.push(PericiaCriterion::ScheduledBetween(
            today,
            today + Duration::days(UPCOMING_WINDOW_DAYS),
        ));
    }
    criteria
}
