use serde::{Deserialize, Serialize};

use super::{Money, VehicleType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingInput {
    pub distance_km: f64,
    #[serde(default)]
    pub nights: i32,
    #[serde(default)]
    pub corridor_key: Option<String>,
    #[serde(default)]
    pub waiting_hours: f64,
    #[serde(default)]
    pub after_hours: bool,
    pub platform_commission_rate: f64,
    #[serde(default)]
    pub vehicle_type: VehicleType,
}

/// Cost breakdown for one trip. Derived once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingResult {
    pub base_distance_fee: Money,
    pub per_diem_fee: Money,
    pub return_travel_fee: Money,
    pub waiting_fee: Money,
    pub after_hours_fee: Money,
    pub subtotal: Money,
    pub commission_amount: Money,
    pub customer_total: Money,
    pub driver_payout: Money,
    pub commission_rate: f64,
}

impl PricingResult {
    pub fn components(&self) -> [Money; 5] {
        [
            self.base_distance_fee,
            self.per_diem_fee,
            self.return_travel_fee,
            self.waiting_fee,
            self.after_hours_fee,
        ]
    }
}
