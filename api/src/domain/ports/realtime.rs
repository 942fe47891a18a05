//! Realtime delivery port

use crate::domain::entities::RealtimeNotification;

/// Pushes notifications to clients connected right now
pub trait NotificationPublisher: Send + Sync {
    /// Returns how many live subscribers received the message
    fn publish(&self, notification: RealtimeNotification) -> usize;
}
