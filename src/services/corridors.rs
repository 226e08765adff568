use std::collections::BTreeMap;

use crate::errors::{CatalogError, CorridorNotFound};
use crate::models::{CorridorDefinition, Money};
use crate::services::intent::tokens;

/// Closed set of named routes, immutable once built.
#[derive(Debug, Clone)]
pub struct CorridorCatalog {
    corridors: Vec<CorridorDefinition>,
}

impl CorridorCatalog {
    pub fn new(corridors: Vec<CorridorDefinition>) -> Result<Self, CatalogError> {
        for (i, corridor) in corridors.iter().enumerate() {
            if corridors[..i].iter().any(|c| c.key == corridor.key) {
                return Err(CatalogError::DuplicateKey(corridor.key.clone()));
            }
            if !(corridor.distance_km.is_finite() && corridor.distance_km > 0.0) {
                return Err(CatalogError::InvalidDistance(corridor.key.clone()));
            }
            if corridor.nights < 0 {
                return Err(CatalogError::InvalidNights(corridor.key.clone()));
            }
        }
        Ok(Self { corridors })
    }

    /// Build from definitions, replacing return allowances with configured overrides.
    pub fn with_allowances(
        mut corridors: Vec<CorridorDefinition>,
        allowances: &BTreeMap<String, i64>,
    ) -> Result<Self, CatalogError> {
        for corridor in &mut corridors {
            if let Some(amount) = allowances.get(&corridor.key) {
                corridor.return_allowance = Money::tzs(*amount);
            }
        }
        for key in allowances.keys() {
            if !corridors.iter().any(|c| &c.key == key) {
                tracing::warn!(corridor = %key, "allowance configured for unknown corridor, ignoring");
            }
        }
        Self::new(corridors)
    }

    pub fn lookup(&self, key: &str) -> Result<&CorridorDefinition, CorridorNotFound> {
        self.corridors
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| CorridorNotFound(key.to_string()))
    }

    /// Classify free-text endpoints as a known corridor, in either direction.
    ///
    /// Heuristic keyword match; `None` means a custom route.
    pub fn detect_corridor(&self, pickup: &str, destination: &str) -> Option<&CorridorDefinition> {
        let pickup = tokens(pickup);
        let destination = tokens(destination);

        self.corridors.iter().find(|c| {
            let forward = mentions_any(&pickup, &c.origin_keywords)
                && mentions_any(&destination, &c.destination_keywords);
            let reverse = mentions_any(&pickup, &c.destination_keywords)
                && mentions_any(&destination, &c.origin_keywords);
            forward || reverse
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorridorDefinition> {
        self.corridors.iter()
    }

    pub fn len(&self) -> usize {
        self.corridors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corridors.is_empty()
    }
}

fn mentions_any(words: &[String], keywords: &[String]) -> bool {
    words
        .iter()
        .any(|w| keywords.iter().any(|k| w.starts_with(k.as_str())))
}
