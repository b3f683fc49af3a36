use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient_cents, lenient_count, Cents};

/// Mutually exclusive lens over the income breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Normal,
    Late,
    Advance,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Normal => "normal",
            FilterMode::Late => "late",
            FilterMode::Advance => "advance",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, FilterMode::Normal)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(FilterMode::Normal),
            "late" => Ok(FilterMode::Late),
            "advance" => Ok(FilterMode::Advance),
            _ => Err(format!("Invalid filter mode: {}", s)),
        }
    }
}

/// Aggregate counters the backend returns alongside a transaction page.
///
/// Every field decodes leniently: missing, null or non-numeric values become 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummaryRaw {
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total_income: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total_expense: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub net_balance: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub late_payment_amount: Cents,
    #[serde(default, deserialize_with = "lenient_count")]
    pub late_payment_count: i64,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub advance_payment_amount: Cents,
    #[serde(default, deserialize_with = "lenient_count")]
    pub advance_payment_count: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub transaction_count: i64,
}

impl TransactionSummaryRaw {
    /// Decode from an arbitrary JSON value. Anything that is not an object
    /// yields an all-zero summary.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        // Field decoders are infallible, so only a non-object could fail here.
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionSummaryDerived {
    #[serde(flatten)]
    pub raw: TransactionSummaryRaw,
    pub mode: FilterMode,
    pub normal_payment_amount: Cents,
}

impl TransactionSummaryDerived {
    pub fn total_income(&self) -> Cents {
        self.raw.total_income
    }

    pub fn total_expense(&self) -> Cents {
        self.raw.total_expense
    }

    pub fn net_balance(&self) -> Cents {
        self.raw.net_balance
    }
}

/// Split income into the on-time bucket. Only meaningful in `Normal` mode;
/// the other lenses report 0.
pub fn derive(raw: TransactionSummaryRaw, mode: FilterMode) -> TransactionSummaryDerived {
    let normal_payment_amount = match mode {
        FilterMode::Normal => raw
            .total_income
            .saturating_sub(raw.advance_payment_amount)
            .saturating_sub(raw.late_payment_amount)
            .max(0),
        FilterMode::Late | FilterMode::Advance => 0,
    };

    TransactionSummaryDerived {
        raw,
        mode,
        normal_payment_amount,
    }
}
