use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Pickup,
    Van,
    Truck,
    Saloon,
    Suv,
    Bus,
    Lorry,
    Motorcycle,
}

impl VehicleType {
    pub const ALL: [VehicleType; 8] = [
        VehicleType::Pickup,
        VehicleType::Van,
        VehicleType::Truck,
        VehicleType::Saloon,
        VehicleType::Suv,
        VehicleType::Bus,
        VehicleType::Lorry,
        VehicleType::Motorcycle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Pickup => "pickup",
            VehicleType::Van => "van",
            VehicleType::Truck => "truck",
            VehicleType::Saloon => "saloon",
            VehicleType::Suv => "suv",
            VehicleType::Bus => "bus",
            VehicleType::Lorry => "lorry",
            VehicleType::Motorcycle => "motorcycle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            VehicleType::Pickup => "Small cargo transport",
            VehicleType::Van => "Medium goods/passengers",
            VehicleType::Truck => "Large cargo",
            VehicleType::Saloon => "4-5 passengers",
            VehicleType::Suv => "7+ passengers",
            VehicleType::Bus => "Large groups",
            VehicleType::Lorry => "Heavy goods",
            VehicleType::Motorcycle => "Quick delivery",
        }
    }
}
