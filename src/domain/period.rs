use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MONTH_LABELS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid period '{0}': expected YYYY-MM")]
    Malformed(String),

    #[error("Invalid period '{input}': month {month} is outside 1-12")]
    MonthOutOfRange { input: String, month: u32 },

    #[error("Invalid period '{0}': year must be a positive 4-digit number")]
    YearOutOfRange(String),
}

/// A calendar month used as the accounting bucket, serialized as `"YYYY-MM"`.
///
/// Internally this is the first day of the month, which keeps ordering
/// chronological and month arithmetic delegated to chrono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalPeriod(NaiveDate);

impl FiscalPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        let token = format!("{:04}-{:02}", year, month);
        if !(1..=9999).contains(&year) {
            return Err(PeriodError::YearOutOfRange(token));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange {
                input: token,
                month,
            });
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(PeriodError::Malformed(token))
    }

    /// The period a given date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    /// The period of today's UTC date.
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Last calendar day: the day before the 1st of the following month.
    /// December rolls over to January of the next year before stepping back.
    pub fn last_day(&self) -> NaiveDate {
        (self.0 + Months::new(1)) - Days::new(1)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            from: self.first_day(),
            to: self.last_day(),
        }
    }

    /// Shift by a signed number of months, `None` when leaving the 4-digit year range.
    pub fn shift(&self, months: i32) -> Option<Self> {
        let magnitude = Months::new(months.unsigned_abs());
        let shifted = if months >= 0 {
            self.0.checked_add_months(magnitude)
        } else {
            self.0.checked_sub_months(magnitude)
        }?;
        (1..=9999).contains(&shifted.year()).then_some(Self(shifted))
    }

    /// Human label such as "Febrero 2024".
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_LABELS[self.0.month0() as usize], self.year())
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for FiscalPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let malformed = || PeriodError::Malformed(input.to_string());

        let (year_str, month_str) = input.split_once('-').ok_or_else(malformed)?;
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(malformed());
        }
        if !all_digits(year_str) || !all_digits(month_str) {
            return Err(malformed());
        }

        let year: i32 = year_str.parse().map_err(|_| malformed())?;
        let month: u32 = month_str.parse().map_err(|_| malformed())?;
        if year == 0 {
            return Err(PeriodError::YearOutOfRange(input.to_string()));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange {
                input: input.to_string(),
                month,
            });
        }
        Self::new(year, month)
    }
}

impl Serialize for FiscalPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive date range. Derived ranges always cover exactly one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// `from` as a zero-padded `YYYY-MM-DD` string.
    pub fn from_string(&self) -> String {
        format_date(self.from)
    }

    /// `to` as a zero-padded `YYYY-MM-DD` string.
    pub fn to_string_inclusive(&self) -> String {
        format_date(self.to)
    }
}

/// Zero-padded `YYYY-MM-DD`, the only date format sent to the backend.
/// Assembled by hand so no timezone-aware formatter is ever involved.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Resolve a period token into an inclusive range.
///
/// `None` and blank input mean "no period selected" and resolve to `Ok(None)`,
/// an unrestricted historical range.
pub fn resolve(period: Option<&str>) -> Result<Option<DateRange>, PeriodError> {
    match period.map(str::trim) {
        None | Some("") => Ok(None),
        Some(token) => Ok(Some(token.parse::<FiscalPeriod>()?.date_range())),
    }
}

/// Like [`resolve`], but an invalid token is logged and treated as unrestricted.
pub fn resolve_lenient(period: Option<&str>) -> Option<DateRange> {
    match resolve(period) {
        Ok(range) => range,
        Err(e) => {
            log::warn!("Ignoring period filter: {}", e);
            None
        }
    }
}

/// Periods from `months_back` months before `today`'s month through
/// `months_forward` months after it, inclusive, in ascending order.
pub fn enumerate_periods(today: NaiveDate, months_back: u32, months_forward: u32) -> Vec<FiscalPeriod> {
    let anchor = FiscalPeriod::containing(today);
    let back = months_back.min(i32::MAX as u32) as i32;
    let forward = months_forward.min(i32::MAX as u32) as i32;

    (-back..=forward)
        .filter_map(|offset| anchor.shift(offset))
        .collect()
}

/// [`enumerate_periods`] evaluated against the current UTC date.
pub fn enumerate_recent_periods(months_back: u32, months_forward: u32) -> Vec<FiscalPeriod> {
    enumerate_periods(Utc::now().date_naive(), months_back, months_forward)
}

/// How an income payment relates to the period it was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    OnTime,
    Late,
    Advance,
}

impl PaymentTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTiming::OnTime => "on_time",
            PaymentTiming::Late => "late",
            PaymentTiming::Advance => "advance",
        }
    }
}

/// A payment dated before its period is an advance, one dated after it is late.
pub fn classify_payment(fiscal_period: FiscalPeriod, transaction_date: NaiveDate) -> PaymentTiming {
    let paid_in = FiscalPeriod::containing(transaction_date);
    match fiscal_period.cmp(&paid_in) {
        std::cmp::Ordering::Greater => PaymentTiming::Advance,
        std::cmp::Ordering::Less => PaymentTiming::Late,
        std::cmp::Ordering::Equal => PaymentTiming::OnTime,
    }
}
