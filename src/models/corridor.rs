use serde::{Deserialize, Serialize};

use super::Money;

/// A predefined long-haul route with fixed distance, nights and return allowance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorridorDefinition {
    pub key: String,
    pub display_name: String,
    pub distance_km: f64,
    pub nights: i32,
    pub return_allowance: Money,
    /// Words that identify either end of the route in free text.
    pub origin_keywords: Vec<String>,
    pub destination_keywords: Vec<String>,
}

const DAR_KEYWORDS: &[&str] = &["dar", "dsm", "daressalaam"];

/// Catalog entries used when no override is configured.
pub fn builtin_corridors() -> Vec<CorridorDefinition> {
    [
        ("dar-tunduma", "Dar es Salaam → Tunduma", 932.0, 1, 65_000, &["tunduma"][..]),
        ("dar-rusumo", "Dar es Salaam → Rusumo", 1300.0, 2, 90_000, &["rusumo"][..]),
        ("dar-mutukula", "Dar es Salaam → Mutukula", 1480.0, 2, 95_000, &["mutukula"][..]),
        (
            "dar-kabanga",
            "Dar es Salaam → Kabanga/Kobero",
            1200.0,
            2,
            85_000,
            &["kabanga", "kobero"][..],
        ),
        ("dar-kasumulu", "Dar es Salaam → Kasumulu", 1100.0, 2, 70_000, &["kasumulu"][..]),
    ]
    .into_iter()
    .map(
        |(key, name, distance_km, nights, allowance, destination)| CorridorDefinition {
            key: key.to_string(),
            display_name: name.to_string(),
            distance_km,
            nights,
            return_allowance: Money::tzs(allowance),
            origin_keywords: DAR_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            destination_keywords: destination.iter().map(|s| s.to_string()).collect(),
        },
    )
    .collect()
}
