//! Financial handlers
//!
//! Receipts, expenses, bank-statement imports, reconciliation and
//! analytics. Amounts are integer cents.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::financial_service::{
    AnalyticsGranularity, AnalyticsPeriod, AnalyticsViewMode, FinancialAnalytics,
    FinancialTimeline, ImportRow, ImportSummary, Reconciled, TimelineQuery,
};
use crate::domain::entities::{
    CatalogItemId, Despesa, FontePagamento, NewDespesa, NewRecebimento, PericiaId, Recebimento,
    UnmatchedPayment, UnmatchedPaymentId,
};
use crate::error::AppError;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReceiptsQuery {
    pub pericia_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptRequest {
    pub pericia_id: Option<PericiaId>,
    #[serde(default)]
    pub fonte_pagamento: FontePagamento,
    pub data_recebimento: NaiveDate,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub valor_bruto: i64,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub valor_liquido: Option<i64>,
    pub descricao: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 100, message = "obrigatória"))]
    pub categoria: String,
    pub descricao: Option<String>,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub valor: i64,
    pub data_competencia: NaiveDate,
    pub pericia_id: Option<PericiaId>,
}

/// One line of an imported statement
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowRequest {
    pub pericia_id: Option<PericiaId>,
    /// Process number used when `periciaId` is absent
    pub cnj: Option<String>,
    #[serde(default)]
    pub fonte_pagamento: FontePagamento,
    pub data_recebimento: NaiveDate,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub valor_bruto: i64,
    #[validate(range(min = 0, message = "não pode ser negativo"))]
    pub valor_liquido: Option<i64>,
    pub descricao: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub source_file_name: Option<String>,
    #[validate(nested)]
    pub rows: Vec<ImportRowRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReconcileRequest {
    #[validate(length(min = 1, message = "nenhum pagamento informado"))]
    pub ids: Vec<UnmatchedPaymentId>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Timeline query. City and status filters are comma-separated id lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
    pub period: Option<AnalyticsPeriod>,
    pub granularity: Option<AnalyticsGranularity>,
    pub view_mode: Option<AnalyticsViewMode>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cidade_ids: Option<String>,
    pub status_ids: Option<String>,
    #[serde(default)]
    pub include_unlinked: bool,
}

fn parse_ids(name: &str, raw: Option<&str>) -> Result<Vec<CatalogItemId>, AppError> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map(CatalogItemId)
                .map_err(|_| AppError::BadRequest(format!("{} inválido: {}", name, s)))
        })
        .collect()
}

impl TimelineParams {
    fn into_query(self) -> Result<TimelineQuery, AppError> {
        Ok(TimelineQuery {
            cidade_ids: parse_ids("cidadeIds", self.cidade_ids.as_deref())?,
            status_ids: parse_ids("statusIds", self.status_ids.as_deref())?,
            period: self.period,
            granularity: self.granularity,
            view_mode: self.view_mode,
            start_date: self.start_date,
            end_date: self.end_date,
            include_unlinked: self.include_unlinked,
        })
    }
}

/// GET /financial/receipts
pub async fn list_receipts(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListReceiptsQuery>,
) -> Result<Json<Vec<Recebimento>>, AppError> {
    let pericia = query.pericia_id.map(PericiaId);
    let receipts = state
        .financial_service
        .list_receipts(&ctx.tenant_id, pericia.as_ref())
        .await?;
    Ok(Json(receipts))
}

/// POST /financial/receipts
pub async fn create_receipt(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateReceiptRequest>,
) -> Result<(StatusCode, Json<Recebimento>), AppError> {
    let receipt = NewRecebimento {
        pericia_id: req.pericia_id,
        fonte_pagamento: req.fonte_pagamento,
        data_recebimento: req.data_recebimento,
        valor_bruto: req.valor_bruto,
        valor_liquido: req.valor_liquido,
        descricao: req.descricao,
    };
    let created = state
        .financial_service
        .create_receipt(&ctx.tenant_id, receipt)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /financial/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<Despesa>>, AppError> {
    Ok(Json(
        state.financial_service.list_expenses(&ctx.tenant_id).await?,
    ))
}

/// POST /financial/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Despesa>), AppError> {
    let expense = NewDespesa {
        categoria: req.categoria,
        descricao: req.descricao,
        valor: req.valor,
        data_competencia: req.data_competencia,
        pericia_id: req.pericia_id,
    };
    let created = state
        .financial_service
        .create_expense(&ctx.tenant_id, expense)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /financial/import
///
/// Lines that match no perícia are kept as unmatched payments.
pub async fn import_statement(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<ImportRequest>,
) -> Result<(StatusCode, Json<ImportSummary>), AppError> {
    let rows = req
        .rows
        .into_iter()
        .map(|r| ImportRow {
            pericia_id: r.pericia_id,
            cnj: r.cnj,
            fonte_pagamento: r.fonte_pagamento,
            data_recebimento: r.data_recebimento,
            valor_bruto: r.valor_bruto,
            valor_liquido: r.valor_liquido,
            descricao: r.descricao,
        })
        .collect();
    let summary = state
        .financial_service
        .import_batch(&ctx.tenant_id, rows, req.source_file_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /financial/unmatched
pub async fn list_unmatched(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<UnmatchedPayment>>, AppError> {
    Ok(Json(state.financial_service.unmatched(&ctx.tenant_id).await?))
}

/// POST /financial/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<ReconcileRequest>,
) -> Result<Json<Reconciled>, AppError> {
    let reconciled = state
        .financial_service
        .reconcile(&ctx.tenant_id, &req.ids, req.note.as_deref())
        .await?;
    Ok(Json(reconciled))
}

/// GET /financial/analytics
pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<FinancialAnalytics>, AppError> {
    Ok(Json(state.financial_service.analytics(&ctx.tenant_id).await?))
}

/// GET /financial/analytics/timeline
pub async fn get_analytics_timeline(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<FinancialTimeline>, AppError> {
    let timeline = state
        .financial_service
        .analytics_timeline(&ctx.tenant_id, params.into_query()?)
        .await?;
    Ok(Json(timeline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_splits_comma_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!("{}, {},", a, b);
        let ids = parse_ids("cidadeIds", Some(&raw)).unwrap();
        assert_eq!(ids, vec![CatalogItemId(a), CatalogItemId(b)]);
        assert!(parse_ids("cidadeIds", None).unwrap().is_empty());
    }

    #[test]
    fn parse_ids_rejects_garbage() {
        let err = parse_ids("statusIds", Some("abc")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("statusIds")));
    }

    #[test]
    fn timeline_params_read_wire_enums() {
        let params: TimelineParams = serde_json::from_str(
            r#"{"period": "LAST_30", "granularity": "WEEK", "includeUnlinked": true}"#,
        )
        .unwrap();
        let query = params.into_query().unwrap();
        assert_eq!(query.period, Some(AnalyticsPeriod::Last30));
        assert_eq!(query.granularity, Some(AnalyticsGranularity::Week));
        assert!(query.include_unlinked);
    }

    #[test]
    fn receipt_rejects_negative_gross() {
        let req: CreateReceiptRequest = serde_json::from_str(
            r#"{"dataRecebimento": "2025-02-01", "valorBruto": -10}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
        assert_eq!(req.fonte_pagamento, FontePagamento::Outro);
    }
}
