//! Financial service
//!
//! Receipts, expenses, bank statement imports with reconciliation, the
//! financial score and the period timeline.
//!
//! Amounts are centavos throughout.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::app::scheduling::{check_planning_date, local_date, local_midnight, week_start};
use crate::domain::criteria::{PericiaCriterion, PericiaQuery};
use crate::domain::entities::{
    normalize_cnj, CatalogItemId, CatalogResource, Despesa, FontePagamento, ImportBatchId,
    NewDespesa, NewRecebimento, NewUnmatchedPayment, PagamentoStatus, PericiaId, Recebimento,
    TenantId, UnmatchedPayment, UnmatchedPaymentId,
};
use crate::domain::ports::{CatalogRepository, FinancialRepository, PericiaRepository};
use crate::error::AppError;

/// Longest CUSTOM analytics period, in days
pub const MAX_PERIOD_DAYS: i64 = 3660;

const MONTHS_PT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// One line of a bank statement import
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub pericia_id: Option<PericiaId>,
    /// CNJ found on the statement, used when no perícia id is given
    pub cnj: Option<String>,
    pub fonte_pagamento: FontePagamento,
    pub data_recebimento: NaiveDate,
    pub valor_bruto: i64,
    pub valor_liquido: Option<i64>,
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub batch_id: ImportBatchId,
    pub imported: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciled {
    pub reconciled: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialTotals {
    pub recebido: i64,
    pub despesas: i64,
    pub resultado: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgingBuckets {
    pub atrasados: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalytics {
    pub totals: FinancialTotals,
    pub aging_buckets: AgingBuckets,
    pub financial_score: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsPeriod {
    #[serde(rename = "LAST_30")]
    Last30,
    #[serde(rename = "LAST_90")]
    Last90,
    #[default]
    Year,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsGranularity {
    Day,
    Week,
    #[default]
    Month,
}

/// Which chart the client shows; echoed back untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsViewMode {
    #[default]
    Finance,
    Production,
    Workflow,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    pub period: Option<AnalyticsPeriod>,
    pub granularity: Option<AnalyticsGranularity>,
    pub view_mode: Option<AnalyticsViewMode>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cidade_ids: Vec<CatalogItemId>,
    pub status_ids: Vec<CatalogItemId>,
    pub include_unlinked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancePoint {
    pub gross_revenue: i64,
    pub expenses: i64,
    pub forecast_by_entry: i64,
    pub unlinked_revenue: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionPoint {
    pub entries: u64,
    pub exits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPoint {
    pub clarification_requests: u64,
    pub clarification_responses: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub bucket_start: NaiveDate,
    pub label: String,
    pub finance: FinancePoint,
    pub production: ProductionPoint,
    pub workflow: WorkflowPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTotals {
    pub gross_revenue: i64,
    pub expenses: i64,
    pub forecast_by_entry: i64,
    pub unlinked_revenue: i64,
    pub entries: u64,
    pub exits: u64,
    pub clarification_requests: u64,
    pub clarification_responses: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersApplied {
    pub view_mode: AnalyticsViewMode,
    pub period: AnalyticsPeriod,
    pub granularity: AnalyticsGranularity,
    pub include_unlinked: bool,
    pub cidade_ids: Vec<CatalogItemId>,
    pub status_ids: Vec<CatalogItemId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTimeline {
    pub filters_applied: FiltersApplied,
    pub series: Vec<TimelinePoint>,
    pub totals: TimelineTotals,
}

/// `clamp(round((received - expenses) / received * 100), 0, 100)`, or 0
/// when nothing was received
pub fn financial_score(received: i64, expenses: i64) -> i64 {
    if received <= 0 {
        return 0;
    }
    let ratio = (received - expenses) as f64 / received as f64 * 100.0;
    (ratio.round() as i64).clamp(0, 100)
}

fn bucket_of(date: NaiveDate, granularity: AnalyticsGranularity) -> NaiveDate {
    match granularity {
        AnalyticsGranularity::Day => date,
        AnalyticsGranularity::Week => week_start(date),
        AnalyticsGranularity::Month => date.with_day(1).unwrap_or(date),
    }
}

fn next_bucket(bucket: NaiveDate, granularity: AnalyticsGranularity) -> NaiveDate {
    match granularity {
        AnalyticsGranularity::Day => bucket + Duration::days(1),
        AnalyticsGranularity::Week => bucket + Duration::days(7),
        AnalyticsGranularity::Month => {
            let (year, month) = if bucket.month() == 12 {
                (bucket.year() + 1, 1)
            } else {
                (bucket.year(), bucket.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(bucket + Duration::days(31))
        }
    }
}

fn bucket_label(bucket: NaiveDate, granularity: AnalyticsGranularity) -> String {
    match granularity {
        AnalyticsGranularity::Day => bucket.format("%d/%m/%Y").to_string(),
        AnalyticsGranularity::Week => {
            format!("Sem {}/{}", bucket.iso_week().week(), bucket.year())
        }
        AnalyticsGranularity::Month => {
            format!("{}/{}", MONTHS_PT[bucket.month0() as usize], bucket.year())
        }
    }
}

/// Bucketed series covering `[start, end]`
struct Series {
    granularity: AnalyticsGranularity,
    start: NaiveDate,
    end: NaiveDate,
    points: BTreeMap<NaiveDate, TimelinePoint>,
}

impl Series {
    fn new(start: NaiveDate, end: NaiveDate, granularity: AnalyticsGranularity) -> Self {
        let mut points = BTreeMap::new();
        let mut cursor = bucket_of(start, granularity);
        while cursor <= end {
            points.insert(
                cursor,
                TimelinePoint {
                    bucket_start: cursor,
                    label: bucket_label(cursor, granularity),
                    finance: FinancePoint::default(),
                    production: ProductionPoint::default(),
                    workflow: WorkflowPoint::default(),
                },
            );
            cursor = next_bucket(cursor, granularity);
        }
        Self {
            granularity,
            start,
            end,
            points,
        }
    }

    /// Point for `date`, if the date falls inside the period
    fn at(&mut self, date: Option<NaiveDate>) -> Option<&mut TimelinePoint> {
        let date = date.filter(|d| *d >= self.start && *d <= self.end)?;
        self.points.get_mut(&bucket_of(date, self.granularity))
    }

    fn finish(self) -> (Vec<TimelinePoint>, TimelineTotals) {
        let series: Vec<TimelinePoint> = self.points.into_values().collect();
        let totals = series.iter().fold(TimelineTotals::default(), |mut acc, p| {
            acc.gross_revenue += p.finance.gross_revenue;
            acc.expenses += p.finance.expenses;
            acc.forecast_by_entry += p.finance.forecast_by_entry;
            acc.unlinked_revenue += p.finance.unlinked_revenue;
            acc.entries += p.production.entries;
            acc.exits += p.production.exits;
            acc.clarification_requests += p.workflow.clarification_requests;
            acc.clarification_responses += p.workflow.clarification_responses;
            acc
        });
        (series, totals)
    }
}

pub struct FinancialService<F, P, C>
where
    F: FinancialRepository,
    P: PericiaRepository,
    C: CatalogRepository,
{
    financial: Arc<F>,
    pericias: Arc<P>,
    catalog: Arc<C>,
    offset: FixedOffset,
}

impl<F, P, C> FinancialService<F, P, C>
where
    F: FinancialRepository,
    P: PericiaRepository,
    C: CatalogRepository,
{
    pub fn new(financial: Arc<F>, pericias: Arc<P>, catalog: Arc<C>, offset: FixedOffset) -> Self {
        Self {
            financial,
            pericias,
            catalog,
            offset,
        }
    }

    async fn check_pericia(
        &self,
        tenant: &TenantId,
        id: Option<&PericiaId>,
    ) -> Result<(), AppError> {
        if let Some(id) = id {
            if self.pericias.find_by_id(tenant, id).await?.is_none() {
                return Err(AppError::NotFound("Perícia não encontrada.".to_string()));
            }
        }
        Ok(())
    }

    pub async fn create_receipt(
        &self,
        tenant: &TenantId,
        receipt: NewRecebimento,
    ) -> Result<Recebimento, AppError> {
        if receipt.valor_bruto < 0 || receipt.valor_liquido.is_some_and(|v| v < 0) {
            return Err(AppError::BadRequest("Valores não podem ser negativos".to_string()));
        }
        self.check_pericia(tenant, receipt.pericia_id.as_ref()).await?;

        let created = self.financial.create_receipt(tenant, &receipt).await?;
        tracing::info!(
            tenant_id = %tenant,
            receipt_id = %created.id,
            valor_bruto = created.valor_bruto,
            "Receipt recorded"
        );
        Ok(created)
    }

    /// Receipts, newest first
    pub async fn list_receipts(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Recebimento>, AppError> {
        Ok(self.financial.list_receipts(tenant, pericia_id).await?)
    }

    pub async fn create_expense(
        &self,
        tenant: &TenantId,
        mut expense: NewDespesa,
    ) -> Result<Despesa, AppError> {
        expense.categoria = expense.categoria.trim().to_string();
        if expense.categoria.is_empty() {
            return Err(AppError::BadRequest("Categoria é obrigatória".to_string()));
        }
        if expense.valor < 0 {
            return Err(AppError::BadRequest("Valor não pode ser negativo".to_string()));
        }
        self.check_pericia(tenant, expense.pericia_id.as_ref()).await?;

        let created = self.financial.create_expense(tenant, &expense).await?;
        tracing::info!(
            tenant_id = %tenant,
            expense_id = %created.id,
            valor = created.valor,
            "Expense recorded"
        );
        Ok(created)
    }

    pub async fn list_expenses(&self, tenant: &TenantId) -> Result<Vec<Despesa>, AppError> {
        Ok(self.financial.list_expenses(tenant).await?)
    }

    /// Resolve the perícia of an import line: explicit id first, then CNJ
    async fn resolve_row(
        &self,
        tenant: &TenantId,
        row: &ImportRow,
    ) -> Result<Option<PericiaId>, AppError> {
        if let Some(id) = row.pericia_id {
            if self.pericias.find_by_id(tenant, &id).await?.is_some() {
                return Ok(Some(id));
            }
        }
        if let Some(cnj) = row.cnj.as_deref().and_then(|c| normalize_cnj(c).ok()) {
            if let Some(p) = self.pericias.find_by_cnj(tenant, &cnj).await? {
                return Ok(Some(p.id));
            }
        }
        Ok(None)
    }

    /// Import statement lines; unresolvable lines wait for reconciliation
    pub async fn import_batch(
        &self,
        tenant: &TenantId,
        rows: Vec<ImportRow>,
        source_file_name: Option<&str>,
    ) -> Result<ImportSummary, AppError> {
        if rows.is_empty() {
            return Err(AppError::BadRequest("Nenhuma linha para importar".to_string()));
        }
        if let Some(row) = rows.iter().position(|r| r.valor_bruto < 0) {
            return Err(AppError::BadRequest(format!(
                "Linha {}: valor não pode ser negativo",
                row + 1
            )));
        }

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for row in rows {
            match self.resolve_row(tenant, &row).await? {
                Some(pericia_id) => matched.push(NewRecebimento {
                    pericia_id: Some(pericia_id),
                    fonte_pagamento: row.fonte_pagamento,
                    data_recebimento: row.data_recebimento,
                    valor_bruto: row.valor_bruto,
                    valor_liquido: row.valor_liquido,
                    descricao: row.descricao,
                }),
                None => unmatched.push(NewUnmatchedPayment {
                    valor: row.valor_liquido.unwrap_or(row.valor_bruto),
                    data_pagamento: Some(row.data_recebimento),
                    descricao: row.descricao,
                    cnj_hint: row.cnj,
                }),
            }
        }

        let batch = self
            .financial
            .import_batch(tenant, source_file_name, &matched, &unmatched)
            .await?;
        tracing::info!(
            tenant_id = %tenant,
            batch_id = %batch.id,
            imported = matched.len(),
            unmatched = unmatched.len(),
            "Financial import finished"
        );
        Ok(ImportSummary {
            batch_id: batch.id,
            imported: matched.len(),
            unmatched: unmatched.len(),
        })
    }

    pub async fn unmatched(&self, tenant: &TenantId) -> Result<Vec<UnmatchedPayment>, AppError> {
        Ok(self.financial.list_unmatched(tenant).await?)
    }

    pub async fn reconcile(
        &self,
        tenant: &TenantId,
        ids: &[UnmatchedPaymentId],
        note: Option<&str>,
    ) -> Result<Reconciled, AppError> {
        if ids.is_empty() {
            return Err(AppError::BadRequest("Nenhum pagamento informado".to_string()));
        }
        let reconciled = self.financial.reconcile(tenant, ids, note).await?;
        tracing::info!(tenant_id = %tenant, reconciled, "Payments reconciled");
        Ok(Reconciled { reconciled })
    }

    pub async fn analytics(&self, tenant: &TenantId) -> Result<FinancialAnalytics, AppError> {
        let recebido: i64 = self
            .financial
            .list_receipts(tenant, None)
            .await?
            .iter()
            .map(Recebimento::effective_value)
            .sum();
        let despesas: i64 = self
            .financial
            .list_expenses(tenant)
            .await?
            .iter()
            .map(|d| d.valor)
            .sum();
        let atrasados = self
            .pericias
            .count(
                tenant,
                &[PericiaCriterion::PagamentoStatus(PagamentoStatus::Atrasado)],
            )
            .await?;

        Ok(FinancialAnalytics {
            totals: FinancialTotals {
                recebido,
                despesas,
                resultado: recebido - despesas,
            },
            aging_buckets: AgingBuckets { atrasados },
            financial_score: financial_score(recebido, despesas),
        })
    }

    fn resolve_period(
        &self,
        period: AnalyticsPeriod,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate), AppError> {
        let today = local_date(Utc::now(), self.offset);
        match period {
            AnalyticsPeriod::Custom => {
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(AppError::BadRequest(
                        "Para período CUSTOM, startDate e endDate são obrigatórios.".to_string(),
                    ));
                };
                if start > end {
                    return Err(AppError::BadRequest(
                        "startDate não pode ser maior que endDate.".to_string(),
                    ));
                }
                check_planning_date(start)?;
                check_planning_date(end)?;
                if (end - start).num_days() > MAX_PERIOD_DAYS {
                    return Err(AppError::BadRequest(format!(
                        "Período CUSTOM limitado a {} dias.",
                        MAX_PERIOD_DAYS
                    )));
                }
                Ok((start, end))
            }
            AnalyticsPeriod::Last30 => Ok((today - Duration::days(29), today)),
            AnalyticsPeriod::Last90 => Ok((today - Duration::days(89), today)),
            AnalyticsPeriod::Year => Ok((today.with_ordinal(1).unwrap_or(today), today)),
        }
    }

    pub async fn analytics_timeline(
        &self,
        tenant: &TenantId,
        query: TimelineQuery,
    ) -> Result<FinancialTimeline, AppError> {
        let period = query.period.unwrap_or_default();
        let granularity = query.granularity.unwrap_or_default();
        let (start, end) = self.resolve_period(period, query.start_date, query.end_date)?;

        let mut criteria = Vec::new();
        if !query.cidade_ids.is_empty() {
            criteria.push(PericiaCriterion::AnyOf(
                query.cidade_ids.iter().map(|id| PericiaCriterion::Cidade(*id)).collect(),
            ));
        }
        if !query.status_ids.is_empty() {
            criteria.push(PericiaCriterion::StatusIn(query.status_ids.clone()));
        }
        let pericias = self
            .pericias
            .query(tenant, &PericiaQuery::new(criteria))
            .await?;
        let allowed: HashSet<PericiaId> = pericias.iter().map(|p| p.id).collect();

        let mut series = Series::new(start, end, granularity);

        for p in &pericias {
            if let Some(point) = series.at(p.data_nomeacao) {
                point.production.entries += 1;
            }
            let sent = p.data_envio_laudo.map(|d| local_date(d, self.offset));
            if let Some(point) = series.at(sent) {
                point.production.exits += 1;
            }
            let forecast = p.honorarios_previstos_jg.unwrap_or(0)
                + p.honorarios_previstos_partes.unwrap_or(0);
            if let Some(point) = series.at(p.data_nomeacao.or(sent)) {
                point.finance.forecast_by_entry += forecast;
            }
        }

        for r in self.financial.list_receipts(tenant, None).await? {
            let Some(point) = series.at(Some(r.data_recebimento)) else {
                continue;
            };
            match r.pericia_id {
                Some(pid) if allowed.contains(&pid) => point.finance.gross_revenue += r.valor_bruto,
                None if query.include_unlinked => point.finance.unlinked_revenue += r.valor_bruto,
                _ => {}
            }
        }

        for d in self.financial.list_expenses(tenant).await? {
            if d.pericia_id.is_some_and(|pid| !allowed.contains(&pid)) {
                continue;
            }
            if let Some(point) = series.at(Some(d.data_competencia)) {
                point.finance.expenses += d.valor;
            }
        }

        let status_codes: HashMap<CatalogItemId, String> = self
            .catalog
            .list(tenant, CatalogResource::Status)
            .await?
            .into_iter()
            .map(|s| (s.id, s.codigo.to_uppercase()))
            .collect();
        let logs = self
            .pericias
            .status_logs_between(
                tenant,
                local_midnight(start, self.offset),
                local_midnight(end + Duration::days(1), self.offset) - Duration::milliseconds(1),
            )
            .await?;
        for log in logs.iter().filter(|l| allowed.contains(&l.pericia_id)) {
            let Some(code) = status_codes.get(&log.status_novo_id) else {
                continue;
            };
            if !code.contains("ESCLAREC") {
                continue;
            }
            if let Some(point) = series.at(Some(local_date(log.created_at, self.offset))) {
                if code.contains("RESPOST") || code.contains("RESPOND") {
                    point.workflow.clarification_responses += 1;
                } else {
                    point.workflow.clarification_requests += 1;
                }
            }
        }

        let (series, totals) = series.finish();
        Ok(FinancialTimeline {
            filters_applied: FiltersApplied {
                view_mode: query.view_mode.unwrap_or_default(),
                period,
                granularity,
                include_unlinked: query.include_unlinked,
                cidade_ids: query.cidade_ids,
                status_ids: query.status_ids,
                start_date: start,
                end_date: end,
            },
            series,
            totals,
        })
    }
}
