use chrono::{Local, NaiveDate};

/// Canonical on-disk date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's calendar date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Signed number of days from `today` to `date` (negative = in the past)
pub fn days_between(today: NaiveDate, date: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Parse a `YYYY-MM-DD` date, ignoring any time-of-day or timezone suffix
/// (`2024-03-01T10:00:00.000Z` reads as `2024-03-01`).
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for `Option<NaiveDate>` stored as plain `YYYY-MM-DD` strings.
/// Legacy datetime strings are truncated to their date part on read.
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&super::format_iso_date(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_iso_date(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d("2025-01-10"), d("2025-01-15")), 5);
        assert_eq!(days_between(d("2025-01-10"), d("2025-01-05")), -5);
        assert_eq!(days_between(d("2025-01-10"), d("2025-01-10")), 0);
    }

    #[test]
    fn parse_truncates_legacy_datetimes() {
        assert_eq!(parse_iso_date("2024-03-01T10:00:00.000Z"), Some(d("2024-03-01")));
        assert_eq!(parse_iso_date("2024-03-01"), Some(d("2024-03-01")));
        assert_eq!(parse_iso_date("2024-3-1"), None);
        assert_eq!(parse_iso_date(""), None);
    }
}
