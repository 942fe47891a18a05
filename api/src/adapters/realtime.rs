//! In-process realtime gateway
//!
//! Fans notifications out to every open SSE connection over a tokio
//! broadcast channel. Each subscriber only sees its own tenant's messages;
//! a subscriber that falls behind loses the oldest messages.

use futures::{stream, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::entities::{RealtimeNotification, TenantId};
use crate::domain::ports::NotificationPublisher;

/// Messages buffered per subscriber before the oldest are dropped
const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<RealtimeNotification>,
}

impl NotificationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Stream of the tenant's notifications published from now on
    pub fn subscribe(
        &self,
        tenant: TenantId,
    ) -> impl Stream<Item = RealtimeNotification> + Send + 'static {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(n) if n.tenant_id == tenant => return Some((n, receiver)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(tenant_id = %tenant, skipped, "Realtime subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPublisher for NotificationHub {
    fn publish(&self, notification: RealtimeNotification) -> usize {
        let tenant = notification.tenant_id;
        // receivers of other tenants are counted too; the stream filters them out
        match self.sender.send(notification) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!(tenant_id = %tenant, "No realtime subscribers connected");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    fn notification(tenant: TenantId, title: &str) -> RealtimeNotification {
        RealtimeNotification {
            tenant_id: tenant,
            event: "notification:new".to_string(),
            title: title.to_string(),
            message: "corpo".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_reaches_nobody() {
        let hub = NotificationHub::new();
        assert_eq!(hub.publish(notification(TenantId::new(), "x")), 0);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_tenant() {
        let hub = NotificationHub::new();
        let mine = TenantId::new();
        let other = TenantId::new();
        let stream = hub.subscribe(mine);
        tokio::pin!(stream);

        hub.publish(notification(other, "alheia"));
        hub.publish(notification(mine, "minha"));

        let received = stream.next().await.unwrap();
        assert_eq!(received.title, "minha");
        assert_eq!(received.tenant_id, mine);
    }
}
