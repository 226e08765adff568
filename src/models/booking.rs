use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{PricingResult, VehicleType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub booking_code: String,
    pub client_phone: String,
    pub pickup_location: String,
    pub destination: String,
    pub vehicle_type: VehicleType,
    pub pickup_date: NaiveDate,
    pub corridor_key: Option<String>,
    pub distance_km: f64,
    pub nights: i32,
    pub pricing: PricingResult,
    pub status: BookingStatus,
    pub payment_proof_url: Option<String>,
    pub payment_notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    PaymentSubmitted,
    Confirmed,
    Assigned,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::PendingPayment,
        BookingStatus::PaymentSubmitted,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::InTransit,
        BookingStatus::Delivered,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::PaymentSubmitted => "payment_submitted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::InTransit => "in_transit",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "Awaiting payment",
            BookingStatus::PaymentSubmitted => "Payment received, verification in progress",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Assigned => "Driver assigned",
            BookingStatus::InTransit => "Vehicle in transit",
            BookingStatus::Delivered => "Delivered",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}
