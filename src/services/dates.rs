use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// How far ahead a pickup may be booked.
pub const MAX_DAYS_AHEAD: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("unrecognised date")]
    Unrecognized,

    #[error("ambiguous date, a year is required for numeric dates")]
    Ambiguous,

    #[error("{0} is in the past")]
    InPast(NaiveDate),

    #[error("{0} is too far ahead")]
    TooFarAhead(NaiveDate),
}

/// Parse a pickup date relative to `today`.
///
/// Accepts "today", "tomorrow", "day after tomorrow", weekday names with an
/// optional "next"/"this" (always the next future occurrence), ISO
/// `YYYY-MM-DD`, day-first numeric dates with a year (`15/01/2026`), and
/// month-name dates such as "December 15", "15th Dec" or "Dec 15 2026".
pub fn parse_pickup_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let text = input
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase();
    if text.is_empty() {
        return Err(DateParseError::Unrecognized);
    }

    let date = match parse_relative(&text, today).or_else(|| parse_numeric(&text)) {
        Some(date) => date,
        None if looks_like_yearless_numeric(&text) => return Err(DateParseError::Ambiguous),
        None => parse_month_name(&text, today).ok_or(DateParseError::Unrecognized)?,
    };

    if date < today {
        return Err(DateParseError::InPast(date));
    }
    if date > today + Duration::days(MAX_DAYS_AHEAD) {
        return Err(DateParseError::TooFarAhead(date));
    }
    Ok(date)
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .filter(|w| !matches!(*w, "on" | "the" | "of"))
        .collect()
}

fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    match text {
        "today" | "leo" => return Some(today),
        "tomorrow" | "tmrw" | "kesho" => return Some(today + Duration::days(1)),
        "day after tomorrow" | "the day after tomorrow" => return Some(today + Duration::days(2)),
        _ => {}
    }

    let words = words(text);
    let day = match words.as_slice() {
        [day] => *day,
        [qualifier, day] if matches!(*qualifier, "next" | "this" | "coming") => *day,
        _ => return None,
    };
    let target = parse_weekday(day)?;

    let current = today.weekday().num_days_from_monday() as i64;
    let wanted = target.num_days_from_monday() as i64;
    let mut ahead = (wanted - current).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    Some(today + Duration::days(ahead))
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    let day = match word {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn parse_numeric(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn looks_like_yearless_numeric(text: &str) -> bool {
    let parts: Vec<&str> = text.split(['/', '-', '.']).collect();
    parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_digit()))
}

fn parse_month(word: &str) -> Option<u32> {
    let month = match word {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_day(word: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .unwrap_or(word);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn parse_year(word: &str) -> Option<i32> {
    if word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()) {
        word.parse().ok()
    } else {
        None
    }
}

fn parse_month_name(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let words = words(text);
    let (month, day, year) = match words.as_slice() {
        [a, b] => match (parse_month(a), parse_month(b)) {
            (Some(m), None) => (m, parse_day(b)?, None),
            (None, Some(m)) => (m, parse_day(a)?, None),
            _ => return None,
        },
        [a, b, y] => {
            let year = parse_year(y)?;
            match (parse_month(a), parse_month(b)) {
                (Some(m), None) => (m, parse_day(b)?, Some(year)),
                (None, Some(m)) => (m, parse_day(a)?, Some(year)),
                _ => return None,
            }
        }
        _ => return None,
    };

    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}
