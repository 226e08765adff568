use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    CollectingPickup,
    CollectingDestination,
    CollectingVehicle,
    CollectingDate,
    ConfirmingDetails,
    AwaitingPayment,
    BookingConfirmed,
}

impl ConversationState {
    pub const ALL: [ConversationState; 8] = [
        ConversationState::Idle,
        ConversationState::CollectingPickup,
        ConversationState::CollectingDestination,
        ConversationState::CollectingVehicle,
        ConversationState::CollectingDate,
        ConversationState::ConfirmingDetails,
        ConversationState::AwaitingPayment,
        ConversationState::BookingConfirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::CollectingPickup => "collecting_pickup",
            ConversationState::CollectingDestination => "collecting_destination",
            ConversationState::CollectingVehicle => "collecting_vehicle",
            ConversationState::CollectingDate => "collecting_date",
            ConversationState::ConfirmingDetails => "confirming_details",
            ConversationState::AwaitingPayment => "awaiting_payment",
            ConversationState::BookingConfirmed => "booking_confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }

    /// True while a partial booking is being collected or confirmed.
    pub fn is_collecting(&self) -> bool {
        matches!(
            self,
            ConversationState::CollectingPickup
                | ConversationState::CollectingDestination
                | ConversationState::CollectingVehicle
                | ConversationState::CollectingDate
                | ConversationState::ConfirmingDetails
        )
    }
}

/// Booking fields gathered across conversational turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialBooking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corridor_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nights: Option<i32>,
    /// Set when the distance is the configured default rather than known.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub distance_estimated: bool,
}

impl PartialBooking {
    pub fn is_empty(&self) -> bool {
        *self == PartialBooking::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationContext {
    pub phone: String,
    pub state: ConversationState,
    pub partial_booking: PartialBooking,
    pub current_booking_id: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl ConversationContext {
    pub fn new(phone: &str, now: NaiveDateTime) -> Self {
        Self {
            phone: phone.to_string(),
            state: ConversationState::Idle,
            partial_booking: PartialBooking::default(),
            current_booking_id: None,
            updated_at: now,
        }
    }

    /// Drop collected fields and return to Idle.
    pub fn reset(&mut self) {
        self.state = ConversationState::Idle;
        self.partial_booking = PartialBooking::default();
    }
}

/// One message received from a client.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
    pub media_url: Option<String>,
    pub message_sid: Option<String>,
}

impl InboundMessage {
    pub fn text(from: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            body: body.to_string(),
            ..Self::default()
        }
    }
}
