use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Source of "now" in the business time zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Falls back to UTC if `hours` is out of range.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| {
            tracing::warn!(hours, "invalid UTC offset, using UTC");
            Utc.fix()
        });
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_today_uses_offset() {
        let eat = FixedOffset::east_opt(3 * 3600).unwrap();
        // 22:30 UTC on the 16th is already the 17th in Dar es Salaam.
        let instant = Utc.with_ymd_and_hms(2026, 10, 16, 22, 30, 0).unwrap();
        let clock = FixedClock(instant.with_timezone(&eat));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let clock = SystemClock::with_offset_hours(48);
        assert_eq!(clock.now().offset().local_minus_utc(), 0);
    }
}
