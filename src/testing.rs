//! Shared fixtures for unit tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};

use crate::config::{AppConfig, InMemoryPricingSource, PricingConfig};
use crate::db::{self, BookingRepository, SqliteStore};
use crate::errors::DeliveryError;
use crate::services::clock::FixedClock;
use crate::services::locks::KeyedLocks;
use crate::services::messaging::{DeliveryResult, DeliveryStatus, NotificationGateway};
use crate::services::pricing::PricingHandle;
use crate::state::AppState;

pub type SentMessages = Arc<Mutex<Vec<(String, String)>>>;

#[derive(Default)]
pub struct MockMessaging {
    pub sent: SentMessages,
    fail: bool,
}

impl MockMessaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl NotificationGateway for MockMessaging {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResult, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 503,
                message: "gateway unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
        Ok(DeliveryResult {
            sid: format!("SM{}", self.sent.lock().unwrap().len()),
            status: DeliveryStatus::Queued,
        })
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_whatsapp_number: "+14155238886".to_string(),
        operations_phone: "+255799000000".to_string(),
        pricing_config_path: PathBuf::from("unused.json"),
        booking_code_prefix: "MNZ".to_string(),
        conversation_ttl_hours: 24,
        utc_offset_hours: 3,
        payment_mobile_number: "0765 111 131".to_string(),
    }
}

/// Saturday 2026-10-17, 09:00 East Africa Time.
pub fn test_clock() -> FixedClock {
    let eat = FixedOffset::east_opt(3 * 3600).unwrap();
    FixedClock(eat.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap())
}

pub fn test_state() -> (AppState, SentMessages) {
    test_state_with(None, MockMessaging::new())
}

/// State over an in-memory database. `bookings` replaces the SQLite
/// booking repository when given.
pub fn test_state_with(
    bookings: Option<Arc<dyn BookingRepository>>,
    messaging: MockMessaging,
) -> (AppState, SentMessages) {
    let store = Arc::new(SqliteStore::new(db::init_db(":memory:").unwrap(), 24));
    let pricing = PricingHandle::load(Box::new(InMemoryPricingSource::new(PricingConfig::default()))).unwrap();
    let sent = Arc::clone(&messaging.sent);

    let state = AppState {
        config: test_config(),
        conversations: store.clone(),
        bookings: bookings.unwrap_or_else(|| store as Arc<dyn BookingRepository>),
        messaging: Box::new(messaging),
        pricing,
        clock: Box::new(test_clock()),
        locks: KeyedLocks::new(),
    };
    (state, sent)
}
