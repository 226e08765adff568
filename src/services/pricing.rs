use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{CustomReturnPolicy, PricingConfig, PricingConfigSource, MAX_DISTANCE_KM};
use crate::errors::{ConfigError, PricingError};
use crate::models::corridor::builtin_corridors;
use crate::models::{Money, PricingInput, PricingResult};
use crate::services::corridors::CorridorCatalog;

pub const MAX_NIGHTS: i32 = 10;
pub const MAX_WAITING_HOURS: f64 = 24.0;

/// Stateless per call: maps a trip description to a cost breakdown.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
    catalog: CorridorCatalog,
}

impl PricingEngine {
    pub fn new(config: PricingConfig, catalog: CorridorCatalog) -> Self {
        Self { config, catalog }
    }

    /// Validate `config` and build the built-in catalog with its allowance overrides.
    pub fn from_config(config: PricingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = CorridorCatalog::with_allowances(builtin_corridors(), &config.corridor_allowances)?;
        Ok(Self::new(config, catalog))
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CorridorCatalog {
        &self.catalog
    }

    pub fn default_commission_rate(&self) -> f64 {
        self.config.platform_commission_default
    }

    pub fn calculate(&self, input: &PricingInput) -> Result<PricingResult, PricingError> {
        validate(input)?;

        let rate_per_km = Money::tzs(self.config.rate_per_km).minor;
        let distance_m = (input.distance_km * 1000.0).round() as i64;
        let base_distance_fee = Money::from_minor(div_round(distance_m * rate_per_km, 1000));

        let per_diem_fee =
            Money::from_minor(i64::from(input.nights) * Money::tzs(self.config.per_diem_rate).minor);

        let return_travel_fee = self.return_allowance(input.corridor_key.as_deref(), base_distance_fee);

        let waited_minutes = (input.waiting_hours * 60.0).round() as i64;
        let free_minutes = (self.config.free_waiting_hours * 60.0).round() as i64;
        let billable_minutes = (waited_minutes - free_minutes).max(0);
        let waiting_fee = Money::from_minor(div_round(
            billable_minutes * Money::tzs(self.config.waiting_fee_per_hour).minor,
            60,
        ));

        let after_hours_fee = if input.after_hours {
            Money::tzs(self.config.after_hours_surcharge)
        } else {
            Money::zero()
        };

        let subtotal: Money = [
            base_distance_fee,
            per_diem_fee,
            return_travel_fee,
            waiting_fee,
            after_hours_fee,
        ]
        .into_iter()
        .sum();

        let basis_points = (input.platform_commission_rate * 10_000.0).round() as i64;
        let commission_amount = Money::from_minor(div_round(subtotal.minor * basis_points, 10_000));

        Ok(PricingResult {
            base_distance_fee,
            per_diem_fee,
            return_travel_fee,
            waiting_fee,
            after_hours_fee,
            subtotal,
            commission_amount,
            customer_total: subtotal + commission_amount,
            driver_payout: subtotal,
            commission_rate: input.platform_commission_rate,
        })
    }

    /// Corridor allowance when the key is in the catalog, otherwise the custom-route policy.
    pub fn return_allowance(&self, corridor_key: Option<&str>, base_distance_fee: Money) -> Money {
        if let Some(key) = corridor_key {
            match self.catalog.lookup(key) {
                Ok(corridor) => return corridor.return_allowance,
                Err(e) => tracing::debug!(error = %e, "pricing as custom route"),
            }
        }

        match self.config.custom_route_return_policy {
            CustomReturnPolicy::None => Money::zero(),
            CustomReturnPolicy::HalfDistanceCapped => {
                let cap = Money::tzs(self.config.default_return_allowance).minor;
                Money::from_minor(cap.min(div_round(base_distance_fee.minor, 2)))
            }
        }
    }
}

fn validate(input: &PricingInput) -> Result<(), PricingError> {
    let invalid = |msg: &str| Err(PricingError::InvalidInput(msg.to_string()));

    if !(input.distance_km.is_finite() && input.distance_km > 0.0) {
        return invalid("distance must be greater than 0");
    }
    if input.distance_km > MAX_DISTANCE_KM {
        return invalid("distance exceeds maximum supported range (3000 km)");
    }
    if !(0..=MAX_NIGHTS).contains(&input.nights) {
        return invalid("nights must be between 0 and 10");
    }
    if !(input.waiting_hours.is_finite() && (0.0..=MAX_WAITING_HOURS).contains(&input.waiting_hours)) {
        return invalid("waiting hours must be between 0 and 24");
    }
    if !(0.0..=1.0).contains(&input.platform_commission_rate) {
        return invalid("commission rate must be between 0 and 1");
    }
    Ok(())
}

/// Integer division rounding half-up, for non-negative operands.
fn div_round(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

/// Current engine, swappable when the pricing config is reloaded.
pub struct PricingHandle {
    source: Box<dyn PricingConfigSource>,
    current: RwLock<Arc<PricingEngine>>,
}

impl PricingHandle {
    pub fn load(source: Box<dyn PricingConfigSource>) -> Result<Self, ConfigError> {
        let engine = PricingEngine::from_config(source.load()?)?;
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(engine)),
        })
    }

    pub fn engine(&self) -> Arc<PricingEngine> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Re-read the source. The running engine is kept if the new config is invalid.
    pub fn reload(&self) -> Result<Arc<PricingEngine>, ConfigError> {
        let engine = Arc::new(PricingEngine::from_config(self.source.load()?)?);
        self.swap(Arc::clone(&engine));
        tracing::info!(
            rate_per_km = engine.config().rate_per_km,
            corridors = engine.catalog().len(),
            "pricing config reloaded"
        );
        Ok(engine)
    }

    /// Persist `config` through the source and start using it.
    pub fn update(&self, config: PricingConfig) -> Result<Arc<PricingEngine>, ConfigError> {
        let engine = Arc::new(PricingEngine::from_config(config)?);
        self.source.store(engine.config())?;
        self.swap(Arc::clone(&engine));
        tracing::info!(
            rate_per_km = engine.config().rate_per_km,
            updated_by = engine.config().updated_by.as_deref().unwrap_or("unknown"),
            "pricing config updated"
        );
        Ok(engine)
    }

    fn swap(&self, engine: Arc<PricingEngine>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = engine;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryPricingSource;
    use crate::models::VehicleType;

    fn engine() -> PricingEngine {
        PricingEngine::from_config(PricingConfig::default()).unwrap()
    }

    fn input(distance_km: f64) -> PricingInput {
        PricingInput {
            distance_km,
            nights: 0,
            corridor_key: None,
            waiting_hours: 0.0,
            after_hours: false,
            platform_commission_rate: 0.18,
            vehicle_type: VehicleType::Pickup,
        }
    }

    #[test]
    fn test_custom_route_with_waiting_time() {
        let result = engine()
            .calculate(&PricingInput {
                waiting_hours: 3.0,
                ..input(100.0)
            })
            .unwrap();

        assert_eq!(result.base_distance_fee, Money::tzs(150_000));
        assert_eq!(result.per_diem_fee, Money::zero());
        // min(50,000 cap, half of 150,000)
        assert_eq!(result.return_travel_fee, Money::tzs(50_000));
        assert_eq!(result.waiting_fee, Money::tzs(15_000));
        assert_eq!(result.after_hours_fee, Money::zero());
        assert_eq!(result.subtotal, Money::tzs(215_000));
        assert_eq!(result.commission_amount, Money::tzs(38_700));
        assert_eq!(result.customer_total, Money::tzs(253_700));
        assert_eq!(result.driver_payout, Money::tzs(215_000));
    }

    #[test]
    fn test_custom_route_zero_return_policy() {
        let config = PricingConfig {
            custom_route_return_policy: CustomReturnPolicy::None,
            ..PricingConfig::default()
        };
        let engine = PricingEngine::from_config(config).unwrap();
        let result = engine.calculate(&input(100.0)).unwrap();
        assert_eq!(result.return_travel_fee, Money::zero());
        assert_eq!(result.subtotal, Money::tzs(150_000));
    }

    #[test]
    fn test_short_custom_route_return_is_half_distance() {
        let result = engine().calculate(&input(40.0)).unwrap();
        assert_eq!(result.base_distance_fee, Money::tzs(60_000));
        assert_eq!(result.return_travel_fee, Money::tzs(30_000));
    }

    #[test]
    fn test_dar_tunduma_corridor() {
        let result = engine()
            .calculate(&PricingInput {
                nights: 1,
                corridor_key: Some("dar-tunduma".to_string()),
                ..input(932.0)
            })
            .unwrap();

        assert_eq!(result.base_distance_fee, Money::tzs(1_398_000));
        assert_eq!(result.per_diem_fee, Money::tzs(50_000));
        assert_eq!(result.return_travel_fee, Money::tzs(65_000));
        assert_eq!(result.subtotal, Money::tzs(1_513_000));
        assert_eq!(result.commission_amount, Money::tzs(272_340));
        assert_eq!(result.customer_total, Money::tzs(1_785_340));
    }

    #[test]
    fn test_unknown_corridor_falls_back_to_custom() {
        let result = engine()
            .calculate(&PricingInput {
                corridor_key: Some("dar-mwanza".to_string()),
                ..input(100.0)
            })
            .unwrap();
        assert_eq!(result.return_travel_fee, Money::tzs(50_000));
    }

    #[test]
    fn test_after_hours_surcharge() {
        let result = engine()
            .calculate(&PricingInput {
                after_hours: true,
                ..input(10.0)
            })
            .unwrap();
        assert_eq!(result.after_hours_fee, Money::tzs(25_000));
    }

    #[test]
    fn test_free_waiting_hours() {
        let result = engine()
            .calculate(&PricingInput {
                waiting_hours: 2.0,
                ..input(10.0)
            })
            .unwrap();
        assert_eq!(result.waiting_fee, Money::zero());

        let result = engine()
            .calculate(&PricingInput {
                waiting_hours: 2.5,
                ..input(10.0)
            })
            .unwrap();
        assert_eq!(result.waiting_fee, Money::tzs(7_500));
    }

    #[test]
    fn test_fractional_distance() {
        let result = engine().calculate(&input(12.345)).unwrap();
        // 12.345 km * 1500 = 18,517.50
        assert_eq!(result.base_distance_fee, Money::from_minor(1_851_750));
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = engine();
        let cases = [
            input(0.0),
            input(-5.0),
            input(f64::NAN),
            input(3000.5),
            PricingInput { nights: -1, ..input(10.0) },
            PricingInput { nights: 11, ..input(10.0) },
            PricingInput { waiting_hours: -0.5, ..input(10.0) },
            PricingInput { platform_commission_rate: 1.01, ..input(10.0) },
            PricingInput { platform_commission_rate: -0.1, ..input(10.0) },
        ];
        for case in cases {
            assert!(
                matches!(engine.calculate(&case), Err(PricingError::InvalidInput(_))),
                "expected rejection for {case:?}"
            );
        }
    }

    #[test]
    fn test_handle_update_and_reload() {
        let source = InMemoryPricingSource::new(PricingConfig::default());
        let handle = PricingHandle::load(Box::new(source)).unwrap();
        assert_eq!(handle.engine().config().rate_per_km, 1500);

        let mut updated = handle.engine().config().clone();
        updated.rate_per_km = 2000;
        handle.update(updated).unwrap();
        assert_eq!(handle.engine().config().rate_per_km, 2000);

        // The source now holds the update, so a reload keeps it.
        handle.reload().unwrap();
        assert_eq!(handle.engine().config().rate_per_km, 2000);
    }

    #[test]
    fn test_handle_rejects_invalid_update() {
        let handle = PricingHandle::load(Box::new(InMemoryPricingSource::default())).unwrap();
        let mut bad = handle.engine().config().clone();
        bad.rate_per_km = -1;
        assert!(handle.update(bad).is_err());
        assert_eq!(handle.engine().config().rate_per_km, 1500);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_corridor_key() -> impl Strategy<Value = Option<String>> {
            prop_oneof![
                Just(None),
                Just(Some("dar-tunduma".to_string())),
                Just(Some("dar-kasumulu".to_string())),
                Just(Some("not-a-corridor".to_string())),
            ]
        }

        fn arb_valid_input() -> impl Strategy<Value = (PricingInput, i64)> {
            (
                0.001f64..=3000.0,
                0i32..=10,
                arb_corridor_key(),
                0.0f64..=24.0,
                any::<bool>(),
                0i64..=10_000,
            )
                .prop_map(|(distance_km, nights, corridor_key, waiting_hours, after_hours, bps)| {
                    let input = PricingInput {
                        distance_km,
                        nights,
                        corridor_key,
                        waiting_hours,
                        after_hours,
                        platform_commission_rate: bps as f64 / 10_000.0,
                        vehicle_type: VehicleType::Van,
                    };
                    (input, bps)
                })
        }

        proptest! {
            #[test]
            fn totals_are_consistent((input, bps) in arb_valid_input()) {
                let result = engine().calculate(&input).unwrap();

                let sum: i64 = result.components().iter().map(|m| m.minor).sum();
                prop_assert_eq!(result.subtotal.minor, sum);
                prop_assert_eq!(
                    result.customer_total.minor,
                    result.subtotal.minor + result.commission_amount.minor
                );
                prop_assert_eq!(result.driver_payout, result.subtotal);

                // Commission is subtotal * rate, rounded to the nearest minor unit.
                let exact = result.subtotal.minor * bps;
                let diff = (result.commission_amount.minor * 10_000 - exact).abs();
                prop_assert!(diff <= 5_000, "commission off by {} / 10000", diff);

                for component in result.components() {
                    prop_assert!(component.minor >= 0);
                }
            }

            #[test]
            fn non_positive_distance_is_rejected(distance in -1.0e6f64..=0.0) {
                let result = engine().calculate(&input(distance));
                prop_assert!(matches!(result, Err(PricingError::InvalidInput(_))));
            }
        }
    }
}
