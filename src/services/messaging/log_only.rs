use async_trait::async_trait;

use super::{DeliveryResult, DeliveryStatus, NotificationGateway};
use crate::errors::DeliveryError;

/// Logs messages instead of sending them. Used when no Twilio credentials
/// are configured.
pub struct LogOnlyGateway;

#[async_trait]
impl NotificationGateway for LogOnlyGateway {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResult, DeliveryError> {
        tracing::info!(to = %to, chars = text.chars().count(), "outbound message (not sent, log-only gateway)");
        tracing::debug!(to = %to, body = %text, "outbound message body");
        Ok(DeliveryResult {
            sid: "MOCK_SID".to_string(),
            status: DeliveryStatus::Sent,
        })
    }
}
