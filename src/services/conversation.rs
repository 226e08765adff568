use chrono::Utc;

use crate::config::MAX_DISTANCE_KM;
use crate::errors::StorageError;
use crate::models::{
    BookingStatus, Confirmation, ConversationContext, ConversationState, InboundMessage, Intent,
    PartialBooking, PricingInput, PricingResult,
};
use crate::services::pricing::PricingEngine;
use crate::services::{dates, finalizer, intent, replies};
use crate::state::AppState;

const MIN_LOCATION_CHARS: usize = 3;

/// Run one inbound message through the booking dialogue and return the reply.
///
/// Messages from the same phone number are handled one at a time; the
/// context is only written back once the handler has succeeded, so a
/// storage failure leaves the previous state in place for a retry.
pub async fn process_message(state: &AppState, inbound: &InboundMessage) -> Result<String, StorageError> {
    let phone = inbound.from.as_str();
    let _guard = state.locks.acquire(phone).await;

    let mut ctx = state.conversations.get(phone).await?;
    let before = ctx.state;

    let reply = handle(state, &mut ctx, inbound).await?;

    ctx.updated_at = Utc::now().naive_utc();
    state.conversations.put(phone, &ctx).await?;

    tracing::info!(
        phone = %phone,
        from = before.as_str(),
        to = ctx.state.as_str(),
        "conversation transition"
    );

    Ok(reply)
}

async fn handle(
    state: &AppState,
    ctx: &mut ConversationContext,
    inbound: &InboundMessage,
) -> Result<String, StorageError> {
    let text = inbound.body.trim();

    match intent::global_intent(text) {
        Some(Intent::Help) => return Ok(replies::main_menu()),
        Some(Intent::Cancel) => return cancel(state, ctx).await,
        _ => {}
    }

    match ctx.state {
        ConversationState::Idle | ConversationState::BookingConfirmed => on_idle(state, ctx, text).await,
        ConversationState::CollectingPickup => Ok(on_pickup(ctx, text)),
        ConversationState::CollectingDestination => Ok(on_destination(&state.pricing.engine(), ctx, text)),
        ConversationState::CollectingVehicle => Ok(on_vehicle(ctx, text)),
        ConversationState::CollectingDate => Ok(on_date(state, ctx, text)),
        ConversationState::ConfirmingDetails => on_confirmation(state, ctx, text).await,
        ConversationState::AwaitingPayment => on_payment(state, ctx, inbound).await,
    }
}

async fn cancel(state: &AppState, ctx: &mut ConversationContext) -> Result<String, StorageError> {
    if ctx.state == ConversationState::AwaitingPayment {
        if let Some(code) = ctx.current_booking_id.take() {
            match state.bookings.update_status(&code, BookingStatus::Cancelled).await {
                Ok(()) => tracing::info!(code = %code, phone = %ctx.phone, "booking cancelled by client"),
                Err(StorageError::NotFound(_)) => {
                    tracing::warn!(code = %code, "cancelled booking no longer exists")
                }
                Err(e) => return Err(e),
            }
        }
    }

    ctx.reset();
    Ok(replies::cancelled())
}

async fn on_idle(state: &AppState, ctx: &mut ConversationContext, text: &str) -> Result<String, StorageError> {
    match intent::idle_intent(text) {
        Intent::Book => {
            ctx.partial_booking = PartialBooking::default();
            ctx.state = ConversationState::CollectingPickup;
            Ok(replies::pickup_prompt())
        }
        Intent::Price => Ok(replies::pricing_info(&state.pricing.engine())),
        Intent::Driver => Ok(replies::driver_info()),
        Intent::Status => {
            let Some(code) = ctx.current_booking_id.as_deref() else {
                return Ok(replies::no_active_booking());
            };
            match state.bookings.find_by_code(code).await? {
                Some(booking) => Ok(replies::booking_status(&booking)),
                None => Ok(replies::no_active_booking()),
            }
        }
        Intent::Help | Intent::Cancel | Intent::Unknown => Ok(replies::main_menu()),
    }
}

fn on_pickup(ctx: &mut ConversationContext, text: &str) -> String {
    if text.chars().count() < MIN_LOCATION_CHARS {
        return replies::pickup_retry();
    }

    ctx.partial_booking.pickup_location = Some(text.to_string());
    ctx.state = ConversationState::CollectingDestination;
    replies::destination_prompt(text)
}

fn on_destination(engine: &PricingEngine, ctx: &mut ConversationContext, text: &str) -> String {
    if text.chars().count() < MIN_LOCATION_CHARS {
        return replies::destination_retry();
    }

    let pickup = ctx.partial_booking.pickup_location.clone().unwrap_or_default();
    let corridor = engine.catalog().detect_corridor(&pickup, text);

    let partial = &mut ctx.partial_booking;
    match corridor {
        Some(corridor) => {
            partial.corridor_key = Some(corridor.key.clone());
            partial.distance_km = Some(corridor.distance_km);
            partial.nights = Some(corridor.nights);
            partial.distance_estimated = false;
        }
        None => {
            let (distance_km, estimated) = match intent::extract_distance_km(text) {
                Some(km) if km > MAX_DISTANCE_KM => return replies::destination_too_far(MAX_DISTANCE_KM),
                Some(km) => (km, false),
                None => (engine.config().custom_route_default_km, true),
            };
            partial.corridor_key = None;
            partial.distance_km = Some(distance_km);
            partial.nights = Some(0);
            partial.distance_estimated = estimated;
        }
    }

    partial.destination = Some(text.to_string());
    ctx.state = ConversationState::CollectingVehicle;
    replies::vehicle_prompt(&ctx.partial_booking, corridor.map(|c| c.display_name.as_str()))
}

fn on_vehicle(ctx: &mut ConversationContext, text: &str) -> String {
    let Some(vehicle) = intent::match_vehicle_type(text) else {
        return replies::vehicle_retry();
    };

    ctx.partial_booking.vehicle_type = Some(vehicle);
    ctx.state = ConversationState::CollectingDate;
    replies::date_prompt(vehicle)
}

fn on_date(state: &AppState, ctx: &mut ConversationContext, text: &str) -> String {
    let date = match dates::parse_pickup_date(text, state.clock.today()) {
        Ok(date) => date,
        Err(e) => {
            tracing::debug!(phone = %ctx.phone, error = %e, "pickup date rejected");
            return replies::date_retry(&e);
        }
    };
    ctx.partial_booking.pickup_date = Some(date);

    let engine = state.pricing.engine();
    match quote(&engine, &ctx.partial_booking) {
        Some(pricing) => {
            ctx.state = ConversationState::ConfirmingDetails;
            replies::confirmation_summary(&ctx.partial_booking, &pricing)
        }
        None => {
            ctx.state = ConversationState::CollectingDestination;
            replies::quote_unavailable()
        }
    }
}

async fn on_confirmation(
    state: &AppState,
    ctx: &mut ConversationContext,
    text: &str,
) -> Result<String, StorageError> {
    match intent::confirmation(text) {
        Confirmation::Accept => {
            let engine = state.pricing.engine();
            let Some(pricing) = quote(&engine, &ctx.partial_booking) else {
                ctx.state = ConversationState::CollectingDestination;
                return Ok(replies::quote_unavailable());
            };

            let code = finalizer::finalize(state, ctx, &pricing).await?;
            let reply = replies::payment_instructions(
                &code,
                pricing.customer_total,
                &state.config.payment_mobile_number,
            );

            ctx.current_booking_id = Some(code);
            ctx.partial_booking = PartialBooking::default();
            ctx.state = ConversationState::AwaitingPayment;
            Ok(reply)
        }
        Confirmation::Restart => {
            ctx.partial_booking = PartialBooking::default();
            ctx.state = ConversationState::CollectingPickup;
            Ok(replies::restart_prompt())
        }
        Confirmation::Unclear => Ok(replies::confirm_retry()),
    }
}

async fn on_payment(
    state: &AppState,
    ctx: &mut ConversationContext,
    inbound: &InboundMessage,
) -> Result<String, StorageError> {
    let Some(media_url) = inbound.media_url.as_deref().filter(|url| !url.is_empty()) else {
        return Ok(replies::payment_proof_retry());
    };

    let Some(code) = ctx.current_booking_id.clone() else {
        tracing::warn!(phone = %ctx.phone, "awaiting payment without a booking");
        ctx.reset();
        return Ok(replies::booking_missing());
    };

    let caption = inbound.body.trim();
    let note = (!caption.is_empty()).then_some(caption);

    match state.bookings.record_payment_proof(&code, media_url, note).await {
        Ok(()) => {}
        Err(StorageError::NotFound(_)) => {
            tracing::warn!(code = %code, phone = %ctx.phone, "payment proof for unknown booking");
            ctx.current_booking_id = None;
            ctx.reset();
            return Ok(replies::booking_missing());
        }
        Err(e) => return Err(e),
    }

    tracing::info!(code = %code, phone = %ctx.phone, "payment proof received");
    ctx.state = ConversationState::BookingConfirmed;
    Ok(replies::proof_received(&code))
}

/// Price the collected trip, or `None` if the partial booking cannot be priced.
fn quote(engine: &PricingEngine, partial: &PartialBooking) -> Option<PricingResult> {
    let input = PricingInput {
        distance_km: partial.distance_km?,
        nights: partial.nights.unwrap_or(0),
        corridor_key: partial.corridor_key.clone(),
        waiting_hours: 0.0,
        after_hours: false,
        platform_commission_rate: engine.default_commission_rate(),
        vehicle_type: partial.vehicle_type.unwrap_or_default(),
    };

    match engine.calculate(&input) {
        Ok(pricing) => Some(pricing),
        Err(e) => {
            tracing::warn!(error = %e, "cannot price partial booking");
            None
        }
    }
}
