use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{BookingRepository, ConversationStore};
use crate::services::clock::Clock;
use crate::services::locks::KeyedLocks;
use crate::services::messaging::NotificationGateway;
use crate::services::pricing::PricingHandle;

pub struct AppState {
    pub config: AppConfig,
    pub conversations: Arc<dyn ConversationStore>,
    pub bookings: Arc<dyn BookingRepository>,
    pub messaging: Box<dyn NotificationGateway>,
    pub pricing: PricingHandle,
    pub clock: Box<dyn Clock>,
    /// Serializes message handling per phone number.
    pub locks: KeyedLocks,
}
