//! Analytics calendar
//!
//! One overview per layer of the workflow: three KPIs for the chosen layer,
//! a timeline of milestones (nomeação, agendamento, realização, laudo,
//! recebimento) and a per-day heatmap of produced and received value.
//! All days are local days in the configured offset; money is in centavos.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::app::financial_service::MAX_PERIOD_DAYS;
use crate::app::scheduling::{check_planning_date, local_date, local_midnight};
use crate::domain::criteria::PericiaQuery;
use crate::domain::entities::{
    CatalogItemId, CatalogResource, PagamentoStatus, Pericia, PericiaId, Recebimento, TenantId,
};
use crate::domain::ports::{CatalogRepository, FinancialRepository, PericiaRepository};
use crate::error::AppError;

pub const DEFAULT_TIMELINE_LIMIT: usize = 200;
pub const MAX_TIMELINE_LIMIT: usize = 1000;
/// City shown for milestones of perícias without one
pub const NO_CITY: &str = "Sem cidade";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarLayer {
    #[default]
    Operacional,
    Producao,
    Laudos,
    Esclarecimentos,
    FinanceiroProducaoRecebimento,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneKind {
    Nomeacao,
    Agendamento,
    Realizacao,
    LaudoEnviado,
    Recebimento,
}

#[derive(Debug, Clone, Default)]
pub struct CalendarQuery {
    pub layer: Option<CalendarLayer>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub timeline_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub key: &'static str,
    pub label: &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[serde(rename = "type")]
    pub kind: MilestoneKind,
    pub cnj_id: Option<String>,
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub value: Option<i64>,
    /// Next milestone of the same perícia, when already known
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<PagamentoStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub received_value: i64,
    pub production_value: i64,
    pub total_events: u64,
    /// Day value over the busiest day's value, four decimals
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodBounds {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarOverview {
    pub layer: CalendarLayer,
    pub period: PeriodBounds,
    pub kpis: Vec<Kpi>,
    pub timeline: Vec<Milestone>,
    pub heatmap: Vec<HeatmapDay>,
}

/// Local days `[from, to]` and the instants bounding them
#[derive(Debug, Clone, Copy)]
pub struct CalendarPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl CalendarPeriod {
    pub fn new(from: NaiveDate, to: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            from,
            to,
            start: local_midnight(from, offset),
            end: local_midnight(to + Duration::days(1), offset),
        }
    }

    fn has_day(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    fn has(&self, instant: Option<DateTime<Utc>>) -> bool {
        instant.is_some_and(|i| i >= self.start && i < self.end)
    }
}

/// Validate the requested days; missing bounds default to `today`'s month
pub fn resolve_calendar_period(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let month_start = today.with_day(1).unwrap_or(today);
    let month_end = month_start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    let from = from.unwrap_or(month_start);
    let to = to.unwrap_or(month_end);

    check_planning_date(from)?;
    check_planning_date(to)?;
    if from > to {
        return Err(AppError::BadRequest(
            "from não pode ser maior que to.".to_string(),
        ));
    }
    if (to - from).num_days() > MAX_PERIOD_DAYS {
        return Err(AppError::BadRequest(format!(
            "Período limitado a {} dias.",
            MAX_PERIOD_DAYS
        )));
    }
    Ok((from, to))
}

fn has_clarification(p: &Pericia) -> bool {
    p.extra_observation
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty())
}

fn count(pericias: &[Pericia], predicate: impl Fn(&Pericia) -> bool) -> i64 {
    pericias.iter().filter(|p| predicate(p)).count() as i64
}

fn sent_laudos<'a>(
    pericias: &'a [Pericia],
    period: &'a CalendarPeriod,
) -> impl Iterator<Item = &'a Pericia> + 'a {
    pericias.iter().filter(|p| period.has(p.data_envio_laudo))
}

/// Whole days from realização to laudo, averaged and rounded
fn average_laudo_days(sent: &[&Pericia]) -> i64 {
    let days: Vec<i64> = sent
        .iter()
        .filter_map(|p| Some((p.data_realizacao?, p.data_envio_laudo?)))
        .map(|(done, sent)| {
            let hours = (sent - done).num_minutes() as f64 / 60.0;
            ((hours / 24.0).round() as i64).max(0)
        })
        .collect();
    if days.is_empty() {
        return 0;
    }
    (days.iter().sum::<i64>() as f64 / days.len() as f64).round() as i64
}

pub fn build_kpis(
    layer: CalendarLayer,
    period: &CalendarPeriod,
    pericias: &[Pericia],
    receipts: &[Recebimento],
) -> Vec<Kpi> {
    let kpi = |key, label, value| Kpi { key, label, value };
    match layer {
        CalendarLayer::Operacional => vec![
            kpi(
                "nomeacoes",
                "Nomeações no período",
                count(pericias, |p| p.data_nomeacao.is_some_and(|d| period.has_day(d))),
            ),
            kpi(
                "agendadas",
                "Perícias agendadas",
                count(pericias, |p| period.has(p.data_agendamento)),
            ),
            kpi(
                "pendentes_agendamento",
                "Pendentes de agendamento",
                count(pericias, |p| p.data_agendamento.is_none() && !p.finalizada),
            ),
        ],
        CalendarLayer::Producao => vec![
            kpi(
                "realizadas",
                "Perícias realizadas",
                count(pericias, |p| period.has(p.data_realizacao)),
            ),
            kpi(
                "finalizadas",
                "Perícias finalizadas",
                count(pericias, |p| p.finalizada && period.has(Some(p.updated_at))),
            ),
            kpi(
                "pendentes_execucao",
                "Pendentes de execução",
                count(pericias, |p| {
                    p.data_agendamento.is_some() && p.data_realizacao.is_none()
                }),
            ),
        ],
        CalendarLayer::Laudos => {
            let sent: Vec<&Pericia> = sent_laudos(pericias, period).collect();
            vec![
                kpi(
                    "laudos_enviados",
                    "Laudos enviados no período",
                    sent.len() as i64,
                ),
                kpi(
                    "aguardando_laudo",
                    "Aguardando emissão de laudo",
                    count(pericias, |p| {
                        p.data_realizacao.is_some() && p.data_envio_laudo.is_none() && !p.finalizada
                    }),
                ),
                kpi(
                    "tempo_medio_laudo",
                    "Tempo médio (dias) para envio",
                    average_laudo_days(&sent),
                ),
            ]
        }
        CalendarLayer::Esclarecimentos => vec![
            kpi(
                "total_com_esclarecimento",
                "Processos com esclarecimentos",
                count(pericias, has_clarification),
            ),
            kpi(
                "movimento_periodo",
                "Movimento no período",
                count(pericias, |p| has_clarification(p) && period.has(p.data_realizacao)),
            ),
            kpi(
                "pendentes",
                "Pendentes de encerramento",
                count(pericias, |p| has_clarification(p) && !p.finalizada),
            ),
        ],
        CalendarLayer::FinanceiroProducaoRecebimento => {
            let received: Vec<i64> = receipts
                .iter()
                .filter(|r| period.has_day(r.data_recebimento))
                .map(Recebimento::effective_value)
                .collect();
            let total_received: i64 = received.iter().sum();
            let produced: i64 = sent_laudos(pericias, period)
                .map(|p| p.honorarios_previstos_jg.unwrap_or(0))
                .sum();
            let ticket = if received.is_empty() {
                0
            } else {
                (total_received as f64 / received.len() as f64).round() as i64
            };
            vec![
                kpi("valor_produzido", "Valor produzido (laudos)", produced),
                kpi("valor_recebido", "Valor recebido", total_received),
                kpi("ticket_medio", "Ticket médio recebimentos", ticket),
            ]
        }
    }
}

/// Newest first, at most `limit` entries
pub fn build_timeline(
    period: &CalendarPeriod,
    pericias: &[Pericia],
    receipts: &[Recebimento],
    cities: &HashMap<CatalogItemId, String>,
    offset: FixedOffset,
    limit: usize,
) -> Vec<Milestone> {
    let city_of = |p: &Pericia| {
        p.cidade_id
            .and_then(|id| cities.get(&id).cloned())
            .unwrap_or_else(|| NO_CITY.to_string())
    };
    let mut items = Vec::new();

    for p in pericias {
        let nomeacao = p.data_nomeacao.map(|d| local_midnight(d, offset));
        let in_period = period.has(nomeacao)
            || period.has(p.data_agendamento)
            || period.has(p.data_realizacao)
            || period.has(p.data_envio_laudo);
        if !in_period {
            continue;
        }
        let milestones = [
            (MilestoneKind::Nomeacao, nomeacao, p.data_agendamento),
            (MilestoneKind::Agendamento, p.data_agendamento, p.data_realizacao),
            (MilestoneKind::Realizacao, p.data_realizacao, p.data_envio_laudo),
            (MilestoneKind::LaudoEnviado, p.data_envio_laudo, None),
        ];
        for (kind, at, deadline) in milestones {
            let Some(timestamp) = at else { continue };
            items.push(Milestone {
                kind,
                cnj_id: Some(p.processo_cnj.clone()),
                city: city_of(p),
                timestamp,
                value: p.honorarios_previstos_jg.filter(|v| *v != 0),
                deadline,
                status: Some(p.pagamento_status),
            });
        }
    }

    let by_id: HashMap<PericiaId, &Pericia> = pericias.iter().map(|p| (p.id, p)).collect();
    for r in receipts.iter().filter(|r| period.has_day(r.data_recebimento)) {
        let pericia = r.pericia_id.and_then(|id| by_id.get(&id).copied());
        items.push(Milestone {
            kind: MilestoneKind::Recebimento,
            cnj_id: pericia.map(|p| p.processo_cnj.clone()),
            city: pericia.map(city_of).unwrap_or_else(|| NO_CITY.to_string()),
            timestamp: local_midnight(r.data_recebimento, offset),
            value: Some(r.effective_value()),
            deadline: None,
            status: pericia.map(|p| p.pagamento_status),
        });
    }

    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(limit);
    items
}

/// One entry per local day of the period
pub fn build_heatmap(
    period: &CalendarPeriod,
    pericias: &[Pericia],
    receipts: &[Recebimento],
    offset: FixedOffset,
) -> Vec<HeatmapDay> {
    #[derive(Default)]
    struct Day {
        received: i64,
        produced: i64,
        events: u64,
    }

    let mut by_day: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for r in receipts.iter().filter(|r| period.has_day(r.data_recebimento)) {
        let day = by_day.entry(r.data_recebimento).or_default();
        day.received += r.effective_value();
        day.events += 1;
    }
    for p in sent_laudos(pericias, period) {
        let Some(sent) = p.data_envio_laudo else { continue };
        let day = by_day.entry(local_date(sent, offset)).or_default();
        day.produced += p.honorarios_previstos_jg.unwrap_or(0);
        day.events += 1;
    }

    let busiest = by_day
        .values()
        .map(|d| d.received + d.produced)
        .max()
        .unwrap_or(0)
        .max(1);

    period
        .from
        .iter_days()
        .take_while(|date| *date <= period.to)
        .map(|date| {
            let day = by_day.remove(&date).unwrap_or_default();
            let intensity = (day.received + day.produced) as f64 / busiest as f64;
            HeatmapDay {
                date,
                received_value: day.received,
                production_value: day.produced,
                total_events: day.events,
                intensity: (intensity * 10_000.0).round() / 10_000.0,
            }
        })
        .collect()
}

pub struct AnalyticsCalendarService<P, F, C>
where
    P: PericiaRepository,
    F: FinancialRepository,
    C: CatalogRepository,
{
    pericias: Arc<P>,
    financial: Arc<F>,
    catalog: Arc<C>,
    offset: FixedOffset,
}

impl<P, F, C> AnalyticsCalendarService<P, F, C>
where
    P: PericiaRepository,
    F: FinancialRepository,
    C: CatalogRepository,
{
    pub fn new(pericias: Arc<P>, financial: Arc<F>, catalog: Arc<C>, offset: FixedOffset) -> Self {
        Self {
            pericias,
            financial,
            catalog,
            offset,
        }
    }

    pub async fn overview(
        &self,
        tenant: &TenantId,
        query: CalendarQuery,
    ) -> Result<CalendarOverview, AppError> {
        let layer = query.layer.unwrap_or_default();
        let limit = query.timeline_limit.unwrap_or(DEFAULT_TIMELINE_LIMIT);
        if !(1..=MAX_TIMELINE_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "timelineLimit deve estar entre 1 e {}",
                MAX_TIMELINE_LIMIT
            )));
        }
        let today = local_date(Utc::now(), self.offset);
        let (from, to) = resolve_calendar_period(query.from, query.to, today)?;
        let period = CalendarPeriod::new(from, to, self.offset);

        let pericias = self
            .pericias
            .query(tenant, &PericiaQuery::new(Vec::new()))
            .await?;
        let receipts = self.financial.list_receipts(tenant, None).await?;
        let cities: HashMap<CatalogItemId, String> = self
            .catalog
            .list(tenant, CatalogResource::Cidades)
            .await?
            .into_iter()
            .map(|c| (c.id, c.nome))
            .collect();

        let overview = CalendarOverview {
            layer,
            period: PeriodBounds {
                from: period.start,
                to: period.end - Duration::milliseconds(1),
            },
            kpis: build_kpis(layer, &period, &pericias, &receipts),
            timeline: build_timeline(&period, &pericias, &receipts, &cities, self.offset, limit),
            heatmap: build_heatmap(&period, &pericias, &receipts, self.offset),
        };
        tracing::debug!(
            tenant_id = %tenant,
            layer = ?layer,
            %from,
            %to,
            timeline = overview.timeline.len(),
            "Analytics calendar built"
        );
        Ok(overview)
    }
}
