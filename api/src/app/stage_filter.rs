//! Operational stage filters
//!
//! Stages are the working lists of the experts' daily routine. Unlike the
//! dashboard buckets they are driven mostly by workflow flags and dates,
//! with status codes as a fallback signal.

use std::collections::HashMap;

use crate::app::status_engine::WorkflowStatus::{self, *};
use crate::domain::criteria::PericiaCriterion;
use crate::domain::entities::CatalogItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Nomeacoes,
    AgendarData,
    ProximasPericias,
    EnviarLaudos,
}

impl Stage {
    /// Status codes that put a perícia in this stage regardless of flags
    pub fn status_codes(&self) -> &'static [WorkflowStatus] {
        match self {
            Stage::Nomeacoes => &[
                NovaNomeacao,
                Avaliar,
                Majorar,
                AguardandoAceiteHonorarios,
                FazerIndireta,
            ],
            Stage::EnviarLaudos => &[EnviarLaudo, EmLaudo],
            Stage::AgendarData | Stage::ProximasPericias => &[],
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NOMEACOES" => Ok(Stage::Nomeacoes),
            "AGENDAR_DATA" => Ok(Stage::AgendarData),
            "PROXIMAS_PERICIAS" => Ok(Stage::ProximasPericias),
            "ENVIAR_LAUDOS" => Ok(Stage::EnviarLaudos),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

pub fn stage_criteria(
    stage: Stage,
    status_ids: &HashMap<String, CatalogItemId>,
) -> Vec<PericiaCriterion> {
    let ids: Vec<CatalogItemId> = stage
        .status_codes()
        .iter()
        .filter_map(|code| status_ids.get(code.as_str()).copied())
        .collect();

    match stage {
        Stage::Nomeacoes => vec![
            PericiaCriterion::Finalizada(false),
            PericiaCriterion::HasDataAgendamento(false),
            PericiaCriterion::AnyOf(vec![
                PericiaCriterion::StatusIn(ids),
                PericiaCriterion::Agendada(false),
            ]),
        ],
        Stage::AgendarData => vec![
            PericiaCriterion::HasDataAgendamento(false),
            PericiaCriterion::Finalizada(false),
            PericiaCriterion::LaudoEnviado(false),
        ],
        Stage::ProximasPericias => vec![
            PericiaCriterion::HasDataAgendamento(true),
            PericiaCriterion::Finalizada(false),
        ],
        Stage::EnviarLaudos => vec![
            PericiaCriterion::Finalizada(false),
            PericiaCriterion::LaudoEnviado(false),
            PericiaCriterion::AnyOf(vec![
                PericiaCriterion::HasDataRealizacao(true),
                PericiaCriterion::StatusIn(ids),
            ]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::criteria::matches_all;
    use crate::domain::entities::TenantId;
    use crate::test_utils::test_pericia;
    use chrono::Utc;

    fn ids() -> HashMap<String, CatalogItemId> {
        WorkflowStatus::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), CatalogItemId::new()))
            .collect()
    }

    #[test]
    fn unscheduled_new_case_is_a_nomeacao() {
        let p = test_pericia(TenantId::new());
        assert!(matches_all(&stage_criteria(Stage::Nomeacoes, &ids()), &p));
    }

    #[test]
    fn agendada_flag_without_intake_status_leaves_nomeacoes() {
        let ids = ids();
        let mut p = test_pericia(TenantId::new());
        p.agendada = true;
        p.status_id = ids.get("AGENDAR_DATA").copied();
        assert!(!matches_all(&stage_criteria(Stage::Nomeacoes, &ids), &p));

        p.status_id = ids.get("AVALIAR").copied();
        assert!(matches_all(&stage_criteria(Stage::Nomeacoes, &ids), &p));
    }

    #[test]
    fn scheduled_case_moves_to_proximas() {
        let ids = ids();
        let mut p = test_pericia(TenantId::new());
        p.data_agendamento = Some(Utc::now());

        assert!(!matches_all(&stage_criteria(Stage::AgendarData, &ids), &p));
        assert!(matches_all(&stage_criteria(Stage::ProximasPericias, &ids), &p));
    }

    #[test]
    fn realized_case_needs_report() {
        let ids = ids();
        let mut p = test_pericia(TenantId::new());
        assert!(!matches_all(&stage_criteria(Stage::EnviarLaudos, &ids), &p));

        p.data_realizacao = Some(Utc::now());
        assert!(matches_all(&stage_criteria(Stage::EnviarLaudos, &ids), &p));

        p.laudo_enviado = true;
        assert!(!matches_all(&stage_criteria(Stage::EnviarLaudos, &ids), &p));
    }

    #[test]
    fn em_laudo_status_counts_without_realization_date() {
        let ids = ids();
        let mut p = test_pericia(TenantId::new());
        p.status_id = ids.get("EM_LAUDO").copied();
        assert!(matches_all(&stage_criteria(Stage::EnviarLaudos, &ids), &p));
    }

    #[test]
    fn stage_parse() {
        assert_eq!("agendar_data".parse::<Stage>().unwrap(), Stage::AgendarData);
        assert!("FINALIZADAS".parse::<Stage>().is_err());
    }
}
