use chrono::Utc;
use rand::Rng;

use crate::errors::StorageError;
use crate::models::{Booking, BookingStatus, ConversationContext, PricingResult};
use crate::services::replies;
use crate::state::AppState;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_RANDOM_LEN: usize = 3;
const MAX_CODE_ATTEMPTS: usize = 5;

/// `prefix` + last six digits of `millis` + random suffix, e.g. `MNZ482913K7Q`.
pub fn generate_booking_code(prefix: &str, millis: i64, rng: &mut impl Rng) -> String {
    let suffix: String = (0..CODE_RANDOM_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}{:06}{suffix}", millis.rem_euclid(1_000_000))
}

/// Persist the confirmed booking as `pending_payment` and alert operations.
/// Returns the booking code.
pub async fn finalize(
    state: &AppState,
    ctx: &ConversationContext,
    pricing: &PricingResult,
) -> Result<String, StorageError> {
    let partial = &ctx.partial_booking;
    let missing = |field: &str| StorageError::Corrupt(format!("partial booking for {} has no {field}", ctx.phone));

    let now = Utc::now();
    let mut booking = Booking {
        booking_code: String::new(),
        client_phone: ctx.phone.clone(),
        pickup_location: partial.pickup_location.clone().ok_or_else(|| missing("pickup_location"))?,
        destination: partial.destination.clone().ok_or_else(|| missing("destination"))?,
        vehicle_type: partial.vehicle_type.ok_or_else(|| missing("vehicle_type"))?,
        pickup_date: partial.pickup_date.ok_or_else(|| missing("pickup_date"))?,
        corridor_key: partial.corridor_key.clone(),
        distance_km: partial.distance_km.ok_or_else(|| missing("distance_km"))?,
        nights: partial.nights.unwrap_or(0),
        pricing: pricing.clone(),
        status: BookingStatus::PendingPayment,
        payment_proof_url: None,
        payment_notes: None,
        created_at: now.naive_utc(),
        updated_at: now.naive_utc(),
    };

    let mut attempt = 0;
    let code = loop {
        attempt += 1;
        booking.booking_code = {
            let mut rng = rand::thread_rng();
            generate_booking_code(&state.config.booking_code_prefix, now.timestamp_millis(), &mut rng)
        };

        match state.bookings.create(&booking).await {
            Ok(code) => break code,
            Err(StorageError::DuplicateCode(code)) if attempt < MAX_CODE_ATTEMPTS => {
                tracing::warn!(code = %code, attempt, "booking code collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    };

    tracing::info!(
        code = %code,
        phone = %ctx.phone,
        total = booking.pricing.customer_total.minor,
        corridor = booking.corridor_key.as_deref().unwrap_or("custom"),
        "booking created"
    );

    booking.booking_code = code.clone();
    notify_operations(state, &booking).await;

    Ok(code)
}

async fn notify_operations(state: &AppState, booking: &Booking) {
    if state.config.operations_phone.is_empty() {
        tracing::warn!("operations_phone not configured, skipping booking alert");
        return;
    }

    match state
        .messaging
        .send(&state.config.operations_phone, &replies::operations_alert(booking))
        .await
    {
        Ok(result) => tracing::debug!(sid = %result.sid, "operations alerted"),
        Err(e) => tracing::error!(error = %e, code = %booking.booking_code, "failed to alert operations"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::db::BookingRepository;
    use crate::models::{PartialBooking, VehicleType};
    use crate::testing::{test_state, test_state_with, MockMessaging};

    fn confirmed_context() -> ConversationContext {
        let mut ctx = ConversationContext::new("+255700000001", Utc::now().naive_utc());
        ctx.partial_booking = PartialBooking {
            pickup_location: Some("Dar es Salaam CBD".to_string()),
            destination: Some("Tunduma Border".to_string()),
            vehicle_type: Some(VehicleType::Pickup),
            pickup_date: NaiveDate::from_ymd_opt(2026, 10, 18),
            corridor_key: Some("dar-tunduma".to_string()),
            distance_km: Some(932.0),
            nights: Some(1),
            distance_estimated: false,
        };
        ctx
    }

    fn quote(state: &AppState) -> PricingResult {
        let engine = state.pricing.engine();
        engine
            .calculate(&crate::models::PricingInput {
                distance_km: 932.0,
                nights: 1,
                corridor_key: Some("dar-tunduma".to_string()),
                waiting_hours: 0.0,
                after_hours: false,
                platform_commission_rate: engine.default_commission_rate(),
                vehicle_type: VehicleType::Pickup,
            })
            .unwrap()
    }

    #[test]
    fn test_code_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate_booking_code("MNZ", 1_792_345_678_901, &mut rng);
        assert_eq!(code.len(), 12);
        assert!(code.starts_with("MNZ678901"));
        assert!(code[9..].bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_finalize_persists_pending_booking_and_alerts_operations() {
        let (state, sent) = test_state();
        let ctx = confirmed_context();
        let pricing = quote(&state);

        let code = finalize(&state, &ctx, &pricing).await.unwrap();
        assert!(code.starts_with("MNZ"));

        let booking = state.bookings.find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::PendingPayment);
        assert_eq!(booking.client_phone, "+255700000001");
        assert_eq!(booking.pricing.customer_total.whole_units(), 1_785_340);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, state.config.operations_phone);
        assert!(sent[0].1.contains(&code));
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_booking() {
        let (state, _) = test_state_with(None, MockMessaging::failing());
        let ctx = confirmed_context();
        let pricing = quote(&state);

        let code = finalize(&state, &ctx, &pricing).await.unwrap();
        assert!(state.bookings.find_by_code(&code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_incomplete_partial_is_rejected() {
        let (state, _) = test_state();
        let mut ctx = confirmed_context();
        ctx.partial_booking.pickup_date = None;
        let pricing = quote(&state);

        let err = finalize(&state, &ctx, &pricing).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    /// Rejects the first `collisions` codes as duplicates.
    struct CollidingRepository {
        collisions: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl BookingRepository for CollidingRepository {
        async fn create(&self, booking: &Booking) -> Result<String, StorageError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.collisions {
                Err(StorageError::DuplicateCode(booking.booking_code.clone()))
            } else {
                Ok(booking.booking_code.clone())
            }
        }

        async fn record_payment_proof(&self, _: &str, _: &str, _: Option<&str>) -> Result<(), StorageError> {
            Ok(())
        }

        async fn find_by_code(&self, _: &str) -> Result<Option<Booking>, StorageError> {
            Ok(None)
        }

        async fn update_status(&self, _: &str, _: BookingStatus) -> Result<(), StorageError> {
            Ok(())
        }

        async fn list(&self, _: Option<BookingStatus>, _: i64) -> Result<Vec<Booking>, StorageError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_code_collision_is_retried() {
        let repo = Arc::new(CollidingRepository {
            collisions: 2,
            attempts: AtomicUsize::new(0),
        });
        let (state, _) = test_state_with(Some(repo.clone() as Arc<dyn BookingRepository>), MockMessaging::new());

        let code = finalize(&state, &confirmed_context(), &quote(&state)).await.unwrap();
        assert!(code.starts_with("MNZ"));
        assert_eq!(repo.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_repeated_collisions() {
        let repo = Arc::new(CollidingRepository {
            collisions: usize::MAX,
            attempts: AtomicUsize::new(0),
        });
        let (state, _) = test_state_with(Some(repo.clone() as Arc<dyn BookingRepository>), MockMessaging::new());

        let err = finalize(&state, &confirmed_context(), &quote(&state)).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateCode(_)));
        assert_eq!(repo.attempts.load(Ordering::SeqCst), MAX_CODE_ATTEMPTS);
    }
}
