//! Translation of perícia criteria into SQL conditions

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, Condition};

use crate::domain::criteria::PericiaCriterion;
use crate::entity::pericias::Column;

/// Condition that holds for every criterion
pub fn all_of(criteria: &[PericiaCriterion]) -> Condition {
    criteria
        .iter()
        .fold(Condition::all(), |cond, c| cond.add(to_condition(c)))
}

fn never() -> Condition {
    Condition::all().add(Expr::cust("FALSE"))
}

fn flag(column: Column, value: bool) -> Condition {
    Condition::all().add(column.eq(value))
}

fn presence(column: Column, present: bool) -> Condition {
    if present {
        Condition::all().add(column.is_not_null())
    } else {
        Condition::all().add(column.is_null())
    }
}

/// Escape LIKE wildcards in user input
fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn to_condition(criterion: &PericiaCriterion) -> Condition {
    match criterion {
        PericiaCriterion::Finalizada(v) => flag(Column::Finalizada, *v),
        PericiaCriterion::Agendada(v) => flag(Column::Agendada, *v),
        PericiaCriterion::LaudoEnviado(v) => flag(Column::LaudoEnviado, *v),
        PericiaCriterion::Urgent(v) => flag(Column::IsUrgent, *v),
        PericiaCriterion::StatusIn(ids) if ids.is_empty() => never(),
        PericiaCriterion::StatusIn(ids) => {
            Condition::all().add(Column::StatusId.is_in(ids.iter().map(|id| id.0)))
        }
        PericiaCriterion::Cidade(id) => Condition::all().add(Column::CidadeId.eq(id.0)),
        PericiaCriterion::TipoPericia(id) => Condition::all().add(Column::TipoPericiaId.eq(id.0)),
        PericiaCriterion::Vara(id) => Condition::all().add(Column::VaraId.eq(id.0)),
        PericiaCriterion::PagamentoStatus(s) => {
            Condition::all().add(Column::PagamentoStatus.eq(s.to_string()))
        }
        PericiaCriterion::HasDataAgendamento(v) => presence(Column::DataAgendamento, *v),
        PericiaCriterion::HasDataRealizacao(v) => presence(Column::DataRealizacao, *v),
        PericiaCriterion::HasExtraObservation(v) => {
            let filled = Condition::all()
                .add(Expr::cust("btrim(coalesce(extra_observation, '')) <> ''"));
            if *v {
                filled
            } else {
                filled.not()
            }
        }
        PericiaCriterion::ScheduledBetween(from, to) => Condition::all().add(
            Column::DataAgendamento.between(from.fixed_offset(), to.fixed_offset()),
        ),
        PericiaCriterion::NomeacaoBetween(from, to) => {
            let mut cond = Condition::all();
            if let Some(from) = from {
                cond = cond.add(Column::DataNomeacao.gte(*from));
            }
            if let Some(to) = to {
                cond = cond.add(Column::DataNomeacao.lte(*to));
            }
            cond
        }
        PericiaCriterion::HonorariosBetween(min, max) => {
            let mut cond = Condition::all();
            if let Some(min) = min {
                cond = cond.add(Column::HonorariosPrevistosJg.gte(*min));
            }
            if let Some(max) = max {
                cond = cond.add(Column::HonorariosPrevistosJg.lte(*max));
            }
            cond
        }
        PericiaCriterion::Search(term) => {
            let pattern = like_pattern(term);
            [
                Column::ProcessoCnj,
                Column::PericiadoNome,
                Column::Observacoes,
            ]
            .into_iter()
            .fold(Condition::any(), |cond, column| {
                cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone()))
            })
        }
        PericiaCriterion::AnyOf(inner) if inner.is_empty() => never(),
        PericiaCriterion::AnyOf(inner) => inner
            .iter()
            .fold(Condition::any(), |cond, c| cond.add(to_condition(c))),
    }
}
