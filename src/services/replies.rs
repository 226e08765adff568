//! Outbound WhatsApp message texts.

use chrono::NaiveDate;

use crate::models::{Booking, Money, PartialBooking, PricingInput, PricingResult, VehicleType};
use crate::services::dates::DateParseError;
use crate::services::pricing::PricingEngine;

const BRAND: &str = "Manyanza Vehicle Transit";
const DRIVER_SIGNUP_URL: &str = "https://askchiwa-spec.github.io/manyanza-website/become-driver.html";
const DATE_EXAMPLES: &str = "Examples:\n• \"Today\"\n• \"Tomorrow\"\n• \"December 15\"\n• \"Next Monday\"\n• \"2026-01-15\"";

pub fn main_menu() -> String {
    format!(
        "🚗 *Welcome to {BRAND}*\n\n\
         How can I help you today?\n\n\
         📋 *Services:*\n\
         • Type 'BOOK' - Book vehicle transit\n\
         • Type 'PRICE' - View pricing rates\n\
         • Type 'DRIVER' - Become a driver\n\
         • Type 'STATUS' - Check your booking\n\
         • Type 'HELP' - Show this menu\n\n\
         Type 'CANCEL' at any time to stop."
    )
}

/// Rates and sample corridor totals from the live pricing config.
pub fn pricing_info(engine: &PricingEngine) -> String {
    let config = engine.config();
    let commission_pct = engine.default_commission_rate() * 100.0;

    let mut out = format!(
        "💰 *Manyanza Transparent Pricing*\n\n\
         📊 *Per-Kilometer Model:*\n\
         • {} per kilometer\n\
         • {} per overnight stay\n\
         • Platform commission: {commission_pct:.0}%\n\n\
         🛣️ *Corridor Routes:*\n",
        Money::tzs(config.rate_per_km),
        Money::tzs(config.per_diem_rate),
    );

    for corridor in engine.catalog().iter() {
        let input = PricingInput {
            distance_km: corridor.distance_km,
            nights: corridor.nights,
            corridor_key: Some(corridor.key.clone()),
            waiting_hours: 0.0,
            after_hours: false,
            platform_commission_rate: engine.default_commission_rate(),
            vehicle_type: VehicleType::default(),
        };
        match engine.calculate(&input) {
            Ok(quote) => out.push_str(&format!(
                "• {}: {}\n",
                corridor.display_name, quote.customer_total
            )),
            Err(e) => tracing::warn!(corridor = %corridor.key, error = %e, "cannot quote corridor"),
        }
    }

    out.push_str("\n*Excludes: Fuel, tolls, permits\n\n📱 Type 'BOOK' to get an exact quote!");
    out
}

pub fn driver_info() -> String {
    format!(
        "👨‍💼 *Become a Manyanza Driver*\n\n\
         Interested in joining our professional driver network?\n\n\
         📋 Requirements:\n\
         • Valid driver's license\n\
         • 3+ years experience\n\
         • Police clearance\n\
         • Age 25-55\n\n\
         📱 Apply online: {DRIVER_SIGNUP_URL}"
    )
}

pub fn pickup_prompt() -> String {
    format!(
        "🚗 *Welcome to {BRAND}!*\n\n\
         I'll help you book professional vehicle transit.\n\n\
         📍 *Step 1: Pickup Location*\n\
         Where should the vehicle be picked up?\n\n\
         Example: \"Dar es Salaam CBD\" or \"Kariakoo Market\""
    )
}

pub fn pickup_retry() -> String {
    "Please provide a more detailed pickup location.\n\nExample: \"Dar es Salaam CBD\" or \"Kariakoo Market\"".to_string()
}

pub fn restart_prompt() -> String {
    "Let's start over.\n\n📍 Where would you like the vehicle picked up from?".to_string()
}

pub fn destination_prompt(pickup: &str) -> String {
    format!(
        "✅ Pickup: {pickup}\n\n\
         📍 *Step 2: Destination*\n\
         Where should the vehicle be delivered?\n\n\
         Example: \"Tunduma Border\" or \"Mwanza City 1150 km\""
    )
}

pub fn destination_retry() -> String {
    "Please provide a more detailed destination.\n\nExample: \"Mbeya, Mbalizi Road\" or \"Dodoma City Center\"".to_string()
}

pub fn destination_too_far(max_km: f64) -> String {
    format!(
        "That trip is longer than the {max_km:.0} km we can quote here.\n\n\
         Please send a closer destination, or contact us directly for special routes."
    )
}

pub fn vehicle_options() -> String {
    let mut out = "🚗 *Available Vehicles:*".to_string();
    for vehicle in VehicleType::ALL {
        out.push_str(&format!(
            "\n• {} - {}",
            vehicle.as_str().to_uppercase(),
            vehicle.description()
        ));
    }
    out
}

pub fn vehicle_prompt(partial: &PartialBooking, corridor_name: Option<&str>) -> String {
    let destination = partial.destination.as_deref().unwrap_or_default();
    let route = match (corridor_name, partial.distance_km) {
        (Some(name), Some(km)) => format!("🛣️ Route: {name} ({})\n\n", format_km(km)),
        (None, Some(km)) if partial.distance_estimated => {
            format!("🛣️ Custom route, estimated {}\n\n", format_km(km))
        }
        (None, Some(km)) => format!("🛣️ Custom route, {}\n\n", format_km(km)),
        _ => String::new(),
    };

    format!(
        "✅ Destination: {destination}\n\n\
         {route}\
         🚙 *Step 3: Vehicle Type*\n\
         What type of vehicle do you need?\n\n\
         {}\n\n\
         Just type the vehicle type (e.g., \"pickup\" or \"van\")",
        vehicle_options()
    )
}

pub fn vehicle_retry() -> String {
    format!(
        "Please select a valid vehicle type:\n\n{}\n\nType the vehicle name (e.g., \"pickup\")",
        vehicle_options()
    )
}

pub fn date_prompt(vehicle: VehicleType) -> String {
    format!(
        "✅ Vehicle: {}\n\n📅 *Step 4: Pickup Date*\nWhen do you need the vehicle?\n\n{DATE_EXAMPLES}",
        vehicle.as_str().to_uppercase()
    )
}

pub fn date_retry(error: &DateParseError) -> String {
    let reason = match error {
        DateParseError::Unrecognized => "I couldn't read that date.".to_string(),
        DateParseError::Ambiguous => {
            "That date is ambiguous. Please include the year or the month name.".to_string()
        }
        DateParseError::InPast(date) => format!("{} is in the past.", format_date(*date)),
        DateParseError::TooFarAhead(date) => {
            format!("{} is too far ahead. We take bookings up to a year out.", format_date(*date))
        }
    };
    format!("{reason}\n\nPlease provide a clear date.\n\n{DATE_EXAMPLES}")
}

pub fn quote_unavailable() -> String {
    "Sorry, I couldn't price that route.\n\n📍 Please send the destination again, including the distance if you know it (e.g. \"Mwanza 1150 km\").".to_string()
}

/// Quote shown before the client confirms.
pub fn confirmation_summary(partial: &PartialBooking, pricing: &PricingResult) -> String {
    let pickup = partial.pickup_location.as_deref().unwrap_or_default();
    let destination = partial.destination.as_deref().unwrap_or_default();
    let distance = partial.distance_km.map(format_km).unwrap_or_default();
    let estimate_note = if partial.distance_estimated { " (estimated)" } else { "" };
    let nights = partial.nights.unwrap_or(0);

    let mut out = format!(
        "🚗 *Manyanza Transit Quote*\n\n\
         Route: {pickup} → {destination}\n\
         Distance: {distance}{estimate_note}\n\
         Overnight Stays: {nights} night(s)\n"
    );
    if let Some(vehicle) = partial.vehicle_type {
        out.push_str(&format!("Vehicle: {}\n", vehicle.as_str().to_uppercase()));
    }
    if let Some(date) = partial.pickup_date {
        out.push_str(&format!("Pickup Date: {}\n", format_date(date)));
    }

    out.push_str("\nPRICE BREAKDOWN:\n");
    out.push_str(&format!("* Base Distance Fee: {}\n", pricing.base_distance_fee));
    out.push_str(&format!("* Per Diem: {}\n", pricing.per_diem_fee));
    out.push_str(&format!("* Return Travel: {}\n", pricing.return_travel_fee));
    if !pricing.waiting_fee.is_zero() {
        out.push_str(&format!("* Waiting Time: {}\n", pricing.waiting_fee));
    }
    if !pricing.after_hours_fee.is_zero() {
        out.push_str(&format!("* After Hours: {}\n", pricing.after_hours_fee));
    }
    out.push_str(&format!("* Subtotal: {}\n", pricing.subtotal));
    out.push_str(&format!(
        "* Platform Commission ({:.0}%): {}\n",
        pricing.commission_rate * 100.0,
        pricing.commission_amount
    ));
    out.push_str(&format!("\nTOTAL: {}\n\n", pricing.customer_total));
    out.push_str("Reply 'YES' to confirm, 'NO' to start over, or 'CANCEL' to stop.");
    out
}

pub fn confirm_retry() -> String {
    "Please reply with:\n• 'YES' to confirm booking\n• 'NO' to start over\n• 'CANCEL' to stop".to_string()
}

pub fn payment_instructions(code: &str, total: Money, payment_number: &str) -> String {
    let mut out = format!(
        "💳 *Payment Required*\n\n\
         📋 Booking: #{code}\n\
         💰 Amount: *{total}*\n\n\
         💸 *Payment Methods:*\n"
    );
    if payment_number.is_empty() {
        out.push_str("• M-Pesa / TigoPesa: ask us for the number\n");
    } else {
        out.push_str(&format!("• M-Pesa: {payment_number}\n• TigoPesa: {payment_number}\n"));
    }
    out.push_str("• Bank Transfer: Contact us\n\n📷 Send a photo of your payment proof here after paying.");
    out
}

pub fn payment_proof_retry() -> String {
    "Please send a photo of your payment receipt or proof of transfer.\n\n\
     Supported methods:\n💳 M-Pesa screenshot\n🏦 Bank transfer receipt\n💰 TigoPesa confirmation"
        .to_string()
}

pub fn proof_received(code: &str) -> String {
    format!(
        "📷 Payment proof received!\n\n\
         ⏳ We're verifying your payment. You'll receive confirmation within 30 minutes.\n\n\
         📋 Your booking reference: #{code}\n\n\
         Thank you for choosing Manyanza! 🙏"
    )
}

pub fn booking_missing() -> String {
    format!(
        "Sorry, I couldn't find your booking.\n\nType 'BOOK' to start a new one.\n\n{}",
        main_menu()
    )
}

pub fn cancelled() -> String {
    "❌ Booking cancelled.\n\nType 'BOOK' whenever you're ready to start again, or 'HELP' for the menu.".to_string()
}

pub fn booking_status(booking: &Booking) -> String {
    format!(
        "📋 *Booking #{}*\n\n\
         Route: {} → {}\n\
         Pickup Date: {}\n\
         Total: {}\n\
         Status: {}",
        booking.booking_code,
        booking.pickup_location,
        booking.destination,
        format_date(booking.pickup_date),
        booking.pricing.customer_total,
        booking.status.label()
    )
}

pub fn no_active_booking() -> String {
    "You don't have an active booking.\n\nType 'BOOK' to start one.".to_string()
}

/// Alert for the operations team about a new booking.
pub fn operations_alert(booking: &Booking) -> String {
    format!(
        "🆕 New booking #{}\n\
         Client: {}\n\
         Route: {} → {}\n\
         Vehicle: {}\n\
         Pickup Date: {}\n\
         Distance: {}\n\
         Total: {} (driver payout {})",
        booking.booking_code,
        booking.client_phone,
        booking.pickup_location,
        booking.destination,
        booking.vehicle_type.as_str().to_uppercase(),
        format_date(booking.pickup_date),
        format_km(booking.distance_km),
        booking.pricing.customer_total,
        booking.pricing.driver_payout
    )
}

fn format_km(km: f64) -> String {
    if km.fract() == 0.0 {
        format!("{km:.0} km")
    } else {
        format!("{km:.1} km")
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%a %-d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;

    fn engine() -> PricingEngine {
        PricingEngine::from_config(PricingConfig::default()).unwrap()
    }

    #[test]
    fn test_summary_keeps_section_headers() {
        let engine = engine();
        let partial = PartialBooking {
            pickup_location: Some("Dar es Salaam CBD".to_string()),
            destination: Some("Tunduma Border".to_string()),
            vehicle_type: Some(VehicleType::Pickup),
            pickup_date: NaiveDate::from_ymd_opt(2026, 10, 18),
            corridor_key: Some("dar-tunduma".to_string()),
            distance_km: Some(932.0),
            nights: Some(1),
            distance_estimated: false,
        };
        let pricing = engine
            .calculate(&PricingInput {
                distance_km: 932.0,
                nights: 1,
                corridor_key: Some("dar-tunduma".to_string()),
                waiting_hours: 0.0,
                after_hours: false,
                platform_commission_rate: 0.18,
                vehicle_type: VehicleType::Pickup,
            })
            .unwrap();

        let text = confirmation_summary(&partial, &pricing);
        assert!(text.contains("Route: Dar es Salaam CBD → Tunduma Border"));
        assert!(text.contains("Distance: 932 km"));
        assert!(text.contains("PRICE BREAKDOWN:"));
        assert!(text.contains("* Base Distance Fee: TSh 1,398,000"));
        assert!(text.contains("* Per Diem: TSh 50,000"));
        assert!(text.contains("* Return Travel: TSh 65,000"));
        assert!(text.contains("TOTAL: TSh 1,785,340"));
        assert!(!text.contains("Waiting Time"));
    }

    #[test]
    fn test_estimated_distance_is_labelled() {
        let partial = PartialBooking {
            destination: Some("Mwanza".to_string()),
            distance_km: Some(100.0),
            distance_estimated: true,
            ..PartialBooking::default()
        };
        assert!(vehicle_prompt(&partial, None).contains("estimated 100 km"));
    }

    #[test]
    fn test_pricing_info_lists_corridors() {
        let text = pricing_info(&engine());
        assert!(text.contains("TSh 1,500 per kilometer"));
        assert!(text.contains("Platform commission: 18%"));
        assert!(text.contains("TSh 1,785,340"));
    }

    #[test]
    fn test_vehicle_options_lists_every_type() {
        let text = vehicle_options();
        for vehicle in VehicleType::ALL {
            assert!(text.contains(&vehicle.as_str().to_uppercase()));
        }
    }

    #[test]
    fn test_payment_instructions() {
        let text = payment_instructions("MNZ123456ABC", Money::tzs(1_785_340), "0765 111 131");
        assert!(text.contains("#MNZ123456ABC"));
        assert!(text.contains("TSh 1,785,340"));
        assert!(text.contains("M-Pesa: 0765 111 131"));
    }
}
