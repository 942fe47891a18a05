//! Analytics calendar handler

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::app::analytics_calendar::{CalendarLayer, CalendarOverview, CalendarQuery};
use crate::error::AppError;
use crate::tenancy::RequestContext;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewParams {
    pub layer: Option<CalendarLayer>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub timeline_limit: Option<usize>,
}

impl From<OverviewParams> for CalendarQuery {
    fn from(params: OverviewParams) -> Self {
        CalendarQuery {
            layer: params.layer,
            from: params.from,
            to: params.to,
            timeline_limit: params.timeline_limit,
        }
    }
}

/// GET /analytics-calendar/overview
pub async fn get_calendar_overview(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<OverviewParams>,
) -> Result<Json<CalendarOverview>, AppError> {
    let overview = state
        .analytics_calendar_service
        .overview(&ctx.tenant_id, params.into())
        .await?;
    Ok(Json(overview))
}
