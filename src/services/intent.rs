use crate::models::{Confirmation, Intent, VehicleType};

const HELP_WORDS: &[&str] = &["help", "menu"];
const CANCEL_WORDS: &[&str] = &["cancel", "stop"];
const BOOK_WORDS: &[&str] = &["book", "booking", "hire", "transport"];
const PRICE_WORDS: &[&str] = &["price", "prices", "pricing", "cost", "rate", "rates"];
const DRIVER_WORDS: &[&str] = &["driver", "drivers", "join"];
const STATUS_WORDS: &[&str] = &["status"];

const ACCEPT_WORDS: &[&str] = &["yes", "y", "confirm", "confirmed", "book", "ndiyo", "ndio"];
const RESTART_WORDS: &[&str] = &["no", "n", "not", "dont", "change", "edit", "hapana"];

/// Lowercased words of `text`. Hyphens and apostrophes join words, so
/// "pick-up" reads as "pickup".
pub fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '\'')
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_any(words: &[String], vocabulary: &[&str]) -> bool {
    words.iter().any(|w| vocabulary.contains(&w.as_str()))
}

/// Commands honoured in every conversation state.
pub fn global_intent(text: &str) -> Option<Intent> {
    let words = tokens(text);
    if has_any(&words, HELP_WORDS) {
        Some(Intent::Help)
    } else if has_any(&words, CANCEL_WORDS) {
        Some(Intent::Cancel)
    } else {
        None
    }
}

/// Intents understood while no booking is in progress.
pub fn idle_intent(text: &str) -> Intent {
    let words = tokens(text);
    if has_any(&words, BOOK_WORDS) {
        Intent::Book
    } else if has_any(&words, STATUS_WORDS) {
        Intent::Status
    } else if has_any(&words, PRICE_WORDS) {
        Intent::Price
    } else if has_any(&words, DRIVER_WORDS) {
        Intent::Driver
    } else {
        Intent::Unknown
    }
}

/// Mixed replies such as "no, don't book it" are unclear and get re-asked.
pub fn confirmation(text: &str) -> Confirmation {
    let words = tokens(text);
    match (has_any(&words, ACCEPT_WORDS), has_any(&words, RESTART_WORDS)) {
        (true, false) => Confirmation::Accept,
        (false, true) => Confirmation::Restart,
        _ => Confirmation::Unclear,
    }
}

/// First vehicle type named in `text`, plurals included.
pub fn match_vehicle_type(text: &str) -> Option<VehicleType> {
    let words = tokens(text);
    let joined_pick_up = words.windows(2).any(|w| w[0] == "pick" && w[1] == "up");

    VehicleType::ALL.into_iter().find(|vehicle| {
        let name = vehicle.as_str();
        let named = words.iter().any(|w| {
            w == name
                || w.strip_suffix('s') == Some(name)
                || w.strip_suffix("es") == Some(name)
        });
        named || (*vehicle == VehicleType::Pickup && joined_pick_up)
    })
}

/// A distance written as "1150 km" or "1,150km" inside free text.
pub fn extract_distance_km(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let bytes = lower.as_bytes();

    for (idx, _) in lower.match_indices("km") {
        let mut end = idx;
        while end > 0 && bytes[end - 1] == b' ' {
            end -= 1;
        }
        let mut start = end;
        while start > 0
            && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.' || bytes[start - 1] == b',')
        {
            start -= 1;
        }
        let digits: String = lower[start..end].chars().filter(|c| *c != ',').collect();
        if let Ok(km) = digits.parse::<f64>() {
            if km.is_finite() && km > 0.0 {
                return Some(km);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("Pick-up, please!"), vec!["pickup", "please"]);
        assert_eq!(tokens("  Dar es Salaam  "), vec!["dar", "es", "salaam"]);
    }

    #[test]
    fn test_global_intent() {
        assert_eq!(global_intent("HELP"), Some(Intent::Help));
        assert_eq!(global_intent("show me the menu"), Some(Intent::Help));
        assert_eq!(global_intent("please cancel"), Some(Intent::Cancel));
        assert_eq!(global_intent("STOP"), Some(Intent::Cancel));
        assert_eq!(global_intent("Kariakoo Market"), None);
        // Whole words only.
        assert_eq!(global_intent("Helpful Street"), None);
    }

    #[test]
    fn test_idle_intent() {
        assert_eq!(idle_intent("I want to book a driver"), Intent::Book);
        assert_eq!(idle_intent("hire"), Intent::Book);
        assert_eq!(idle_intent("what are your rates?"), Intent::Price);
        assert_eq!(idle_intent("I want to join as a driver"), Intent::Driver);
        assert_eq!(idle_intent("status"), Intent::Status);
        assert_eq!(idle_intent("hello"), Intent::Unknown);
    }

    #[test]
    fn test_confirmation() {
        assert_eq!(confirmation("YES"), Confirmation::Accept);
        assert_eq!(confirmation("confirm please"), Confirmation::Accept);
        assert_eq!(confirmation("no"), Confirmation::Restart);
        assert_eq!(confirmation("I want to change it"), Confirmation::Restart);
        assert_eq!(confirmation("now?"), Confirmation::Unclear);
    }

    #[test]
    fn test_mixed_confirmation_is_unclear() {
        assert_eq!(confirmation("No, don't book it"), Confirmation::Unclear);
        assert_eq!(confirmation("don't book"), Confirmation::Unclear);
        assert_eq!(confirmation("yes but change the date"), Confirmation::Unclear);
    }

    #[test]
    fn test_match_vehicle_in_sentence() {
        assert_eq!(match_vehicle_type("I need a van please"), Some(VehicleType::Van));
        assert_eq!(match_vehicle_type("PICKUP"), Some(VehicleType::Pickup));
        assert_eq!(match_vehicle_type("a pick up truck"), Some(VehicleType::Pickup));
        assert_eq!(match_vehicle_type("two buses"), Some(VehicleType::Bus));
        assert_eq!(match_vehicle_type("motorcycle"), Some(VehicleType::Motorcycle));
    }

    #[test]
    fn test_match_vehicle_rejects_unknown() {
        assert_eq!(match_vehicle_type("a spaceship"), None);
        assert_eq!(match_vehicle_type("caravan"), None);
    }

    #[test]
    fn test_extract_distance() {
        assert_eq!(extract_distance_km("Mwanza 1150 km"), Some(1150.0));
        assert_eq!(extract_distance_km("Mwanza (1,150km)"), Some(1150.0));
        assert_eq!(extract_distance_km("about 62.5 KM away"), Some(62.5));
        assert_eq!(extract_distance_km("Mwanza City"), None);
        assert_eq!(extract_distance_km("km"), None);
    }
}
