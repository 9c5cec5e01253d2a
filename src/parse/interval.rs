use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// Error type for the text parsers. Callers recover from these locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid interval '{0}': expected <number><b|d|w|m|q|y>")]
    InvalidInterval(String),
    #[error("interval '{0}' moves the date out of range")]
    OutOfRange(String),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Unit of a review interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    BusinessDay,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl IntervalUnit {
    pub fn from_char(c: char) -> Option<IntervalUnit> {
        match c {
            'b' => Some(IntervalUnit::BusinessDay),
            'd' => Some(IntervalUnit::Day),
            'w' => Some(IntervalUnit::Week),
            'm' => Some(IntervalUnit::Month),
            'q' => Some(IntervalUnit::Quarter),
            'y' => Some(IntervalUnit::Year),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            IntervalUnit::BusinessDay => 'b',
            IntervalUnit::Day => 'd',
            IntervalUnit::Week => 'w',
            IntervalUnit::Month => 'm',
            IntervalUnit::Quarter => 'q',
            IntervalUnit::Year => 'y',
        }
    }

    fn noun(self) -> &'static str {
        match self {
            IntervalUnit::BusinessDay => "business day",
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Quarter => "quarter",
            IntervalUnit::Year => "year",
        }
    }
}

/// A review cadence such as `2w` or `1q`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub count: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    /// Parse `nn[bdwmqy]`. Surrounding whitespace is ignored; nothing else is.
    pub fn parse(spec: &str) -> Result<Interval, ParseError> {
        let s = spec.trim();
        let invalid = || ParseError::InvalidInterval(spec.to_string());

        let unit_char = s.chars().last().ok_or_else(invalid)?;
        let unit = IntervalUnit::from_char(unit_char).ok_or_else(invalid)?;
        let digits = &s[..s.len() - unit_char.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count = digits.parse::<u32>().map_err(|_| invalid())?;
        Ok(Interval { count, unit })
    }

    /// Move `base` forward by this interval. Month arithmetic clamps to the
    /// last day of the target month; business days skip Saturday and Sunday.
    pub fn offset(&self, base: NaiveDate) -> Result<NaiveDate, ParseError> {
        let out_of_range = || ParseError::OutOfRange(self.to_string());
        let n = self.count;
        match self.unit {
            IntervalUnit::BusinessDay => add_business_days(base, n).ok_or_else(out_of_range),
            IntervalUnit::Day => base.checked_add_days(Days::new(n as u64)).ok_or_else(out_of_range),
            IntervalUnit::Week => base
                .checked_add_days(Days::new(n as u64 * 7))
                .ok_or_else(out_of_range),
            IntervalUnit::Month => base.checked_add_months(Months::new(n)).ok_or_else(out_of_range),
            IntervalUnit::Quarter => n
                .checked_mul(3)
                .and_then(|m| base.checked_add_months(Months::new(m)))
                .ok_or_else(out_of_range),
            IntervalUnit::Year => n
                .checked_mul(12)
                .and_then(|m| base.checked_add_months(Months::new(m)))
                .ok_or_else(out_of_range),
        }
    }

    /// Human phrase, e.g. "2 weeks"
    pub fn describe(&self) -> String {
        let noun = self.unit.noun();
        if self.count == 1 {
            format!("1 {}", noun)
        } else {
            format!("{} {}s", self.count, noun)
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.as_char())
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::parse(s)
    }
}

/// Offset `base` by the interval in `spec`
pub fn offset(base: NaiveDate, spec: &str) -> Result<NaiveDate, ParseError> {
    Interval::parse(spec)?.offset(base)
}

fn add_business_days(base: NaiveDate, n: u32) -> Option<NaiveDate> {
    let mut date = base;
    let mut remaining = n;
    while remaining > 0 {
        date = date.succ_opt()?;
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    Some(date)
}
