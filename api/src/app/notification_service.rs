//! Notification service
//!
//! Per-channel delivery rules, digest scheduling and realtime pushes to the
//! tenant's live connections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    NotificationChannel, NotificationConfig, RealtimeNotification, TenantId,
};
use crate::domain::ports::{NotificationPublisher, NotificationRepository};
use crate::error::AppError;

/// Event name of realtime notifications
pub const NOTIFICATION_EVENT: &str = "notification:new";
/// Transport realtime notifications go out on
pub const REALTIME_CHANNEL: &str = "sse";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestPeriod {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestScheduled {
    pub scheduled: bool,
    pub period: DigestPeriod,
    pub active_channels: Vec<NotificationChannel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RealtimePayload {
    pub title: String,
    pub message: String,
}

/// What was pushed, echoed back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeDelivery {
    pub delivered: bool,
    pub channel: String,
    pub event: String,
    pub receivers: usize,
    pub payload: RealtimePayload,
    pub timestamp: DateTime<Utc>,
}

pub struct NotificationService<N, H>
where
    N: NotificationRepository,
    H: NotificationPublisher,
{
    rules: Arc<N>,
    publisher: Arc<H>,
}

impl<N, H> NotificationService<N, H>
where
    N: NotificationRepository,
    H: NotificationPublisher,
{
    pub fn new(rules: Arc<N>, publisher: Arc<H>) -> Self {
        Self { rules, publisher }
    }

    /// Create or update the rule of one channel; omitted fields keep
    /// their current value
    pub async fn upsert_rule(
        &self,
        tenant: &TenantId,
        channel: NotificationChannel,
        enabled: Option<bool>,
        config: Option<serde_json::Value>,
    ) -> Result<NotificationConfig, AppError> {
        if config.as_ref().is_some_and(|c| !c.is_object()) {
            return Err(AppError::BadRequest(
                "config deve ser um objeto JSON".to_string(),
            ));
        }
        let rule = self.rules.upsert(tenant, channel, enabled, config).await?;
        tracing::info!(
            tenant_id = %tenant,
            channel = %rule.channel,
            enabled = rule.enabled,
            "Notification rule saved"
        );
        Ok(rule)
    }

    pub async fn list_rules(&self, tenant: &TenantId) -> Result<Vec<NotificationConfig>, AppError> {
        Ok(self.rules.list(tenant).await?)
    }

    pub async fn digest(
        &self,
        tenant: &TenantId,
        period: Option<DigestPeriod>,
    ) -> Result<DigestScheduled, AppError> {
        let active_channels = self
            .rules
            .list(tenant)
            .await?
            .into_iter()
            .filter(|r| r.enabled)
            .map(|r| r.channel)
            .collect();
        Ok(DigestScheduled {
            scheduled: true,
            period: period.unwrap_or_default(),
            active_channels,
        })
    }

    /// Push a notification to everyone connected for the tenant
    pub fn realtime(
        &self,
        tenant: &TenantId,
        title: String,
        message: String,
    ) -> Result<RealtimeDelivery, AppError> {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Título é obrigatório".to_string()));
        }
        let timestamp = Utc::now();
        let receivers = self.publisher.publish(RealtimeNotification {
            tenant_id: *tenant,
            event: NOTIFICATION_EVENT.to_string(),
            title: title.clone(),
            message: message.clone(),
            timestamp,
        });
        tracing::debug!(tenant_id = %tenant, receivers, "Realtime notification published");

        Ok(RealtimeDelivery {
            delivered: true,
            channel: REALTIME_CHANNEL.to_string(),
            event: NOTIFICATION_EVENT.to_string(),
            receivers,
            payload: RealtimePayload { title, message },
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{InMemoryNotificationRepository, RecordingPublisher};

    fn create_service() -> (
        NotificationService<InMemoryNotificationRepository, RecordingPublisher>,
        Arc<RecordingPublisher>,
    ) {
        let publisher = Arc::new(RecordingPublisher::new());
        let service = NotificationService::new(
            Arc::new(InMemoryNotificationRepository::new()),
            publisher.clone(),
        );
        (service, publisher)
    }

    #[tokio::test]
    async fn upsert_keeps_one_rule_per_channel() {
        let (service, _) = create_service();
        let tenant = TenantId::new();

        let created = service
            .upsert_rule(&tenant, NotificationChannel::Email, None, None)
            .await
            .unwrap();
        assert!(created.enabled);

        let updated = service
            .upsert_rule(
                &tenant,
                NotificationChannel::Email,
                Some(false),
                Some(serde_json::json!({"to": "perito@exemplo.com"})),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert!(!updated.enabled);
        assert_eq!(service.list_rules(&tenant).await.unwrap().len(), 1);
        assert!(service.list_rules(&TenantId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_object_config_is_rejected() {
        let (service, _) = create_service();
        let result = service
            .upsert_rule(
                &TenantId::new(),
                NotificationChannel::Push,
                None,
                Some(serde_json::json!(["x"])),
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn digest_lists_enabled_channels() {
        let (service, _) = create_service();
        let tenant = TenantId::new();
        service
            .upsert_rule(&tenant, NotificationChannel::Email, Some(true), None)
            .await
            .unwrap();
        service
            .upsert_rule(&tenant, NotificationChannel::Whatsapp, Some(false), None)
            .await
            .unwrap();

        let digest = service.digest(&tenant, None).await.unwrap();
        assert_eq!(digest.period, DigestPeriod::Daily);
        assert_eq!(digest.active_channels, vec![NotificationChannel::Email]);
    }

    #[tokio::test]
    async fn realtime_publishes_for_the_tenant() {
        let (service, publisher) = create_service();
        let tenant = TenantId::new();

        let delivery = service
            .realtime(&tenant, "Prazo".to_string(), "Laudo vence amanhã".to_string())
            .unwrap();
        assert!(delivery.delivered);
        assert_eq!(delivery.event, NOTIFICATION_EVENT);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].tenant_id, tenant);
        assert_eq!(published[0].title, "Prazo");

        assert!(matches!(
            service.realtime(&tenant, " ".to_string(), String::new()),
            Err(AppError::BadRequest(_))
        ));
    }
}
