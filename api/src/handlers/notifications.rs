//! Notification handlers
//!
//! Channel rules, digest scheduling and the realtime SSE stream.

use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use validator::Validate;

use crate::app::notification_service::{DigestPeriod, DigestScheduled, RealtimeDelivery};
use crate::domain::entities::{NotificationChannel, NotificationConfig};
use crate::error::AppError;
use crate::tenancy::RequestContext;
use crate::validation::ValidatedJson;
use crate::AppState;

const KEEP_ALIVE_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
pub struct UpsertRuleRequest {
    pub channel: NotificationChannel,
    pub enabled: Option<bool>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DigestRequest {
    pub period: Option<DigestPeriod>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RealtimeRequest {
    #[validate(length(min = 1, max = 255, message = "obrigatório"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub message: String,
}

/// GET /notifications/rules
pub async fn list_rules(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<NotificationConfig>>, AppError> {
    Ok(Json(
        state.notification_service.list_rules(&ctx.tenant_id).await?,
    ))
}

/// POST /notifications/rules
///
/// Create or update the rule of one channel.
pub async fn upsert_rule(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<UpsertRuleRequest>,
) -> Result<Json<NotificationConfig>, AppError> {
    let rule = state
        .notification_service
        .upsert_rule(&ctx.tenant_id, req.channel, req.enabled, req.config)
        .await?;
    Ok(Json(rule))
}

/// POST /notifications/digest
///
/// The body is optional; without one the daily digest is scheduled.
pub async fn schedule_digest(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Option<Json<DigestRequest>>,
) -> Result<Json<DigestScheduled>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let scheduled = state
        .notification_service
        .digest(&ctx.tenant_id, req.period)
        .await?;
    Ok(Json(scheduled))
}

/// POST /notifications/realtime
pub async fn push_realtime(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedJson(req): ValidatedJson<RealtimeRequest>,
) -> Result<Json<RealtimeDelivery>, AppError> {
    let delivery = state
        .notification_service
        .realtime(&ctx.tenant_id, req.title, req.message)?;
    Ok(Json(delivery))
}

/// GET /notifications/stream
///
/// Server-Sent Events stream of the tenant's realtime notifications.
pub async fn stream_notifications(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(tenant_id = %ctx.tenant_id, "Realtime subscriber connected");
    let stream = state
        .notification_hub
        .subscribe(ctx.tenant_id)
        .map(|n| Event::default().event(n.event.clone()).json_data(&n));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_request_reads_channel() {
        let req: UpsertRuleRequest =
            serde_json::from_str(r#"{"channel": "WHATSAPP", "enabled": false}"#).unwrap();
        assert_eq!(req.channel, NotificationChannel::Whatsapp);
        assert_eq!(req.enabled, Some(false));
        assert!(req.config.is_none());
    }

    #[test]
    fn digest_period_is_lowercase() {
        let req: DigestRequest = serde_json::from_str(r#"{"period": "weekly"}"#).unwrap();
        assert_eq!(req.period, Some(DigestPeriod::Weekly));
    }

    #[test]
    fn realtime_requires_title() {
        let req: RealtimeRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
