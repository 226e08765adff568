pub mod log_only;
pub mod twilio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DeliveryError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Queued,
    Accepted,
    Sending,
    Sent,
    Delivered,
    Failed,
    Undelivered,
    Unknown,
}

impl DeliveryStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => DeliveryStatus::Queued,
            "accepted" => DeliveryStatus::Accepted,
            "sending" => DeliveryStatus::Sending,
            "sent" => DeliveryStatus::Sent,
            "delivered" => DeliveryStatus::Delivered,
            "failed" => DeliveryStatus::Failed,
            "undelivered" => DeliveryStatus::Undelivered,
            _ => DeliveryStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryResult {
    pub sid: String,
    pub status: DeliveryStatus,
}

/// Outbound message delivery.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResult, DeliveryError>;
}
