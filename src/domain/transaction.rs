use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{classify_payment, lenient_cents, Cents, FiscalPeriod, PaymentTiming};

pub type TransactionId = Uuid;
pub type CategoryId = Uuid;
pub type UnitId = Uuid;

/// Direction of money. Categories carry the same distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(TransactionStatus::Pending),
            "confirmed" => Some(TransactionStatus::Confirmed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            "refunded" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Check,
    #[serde(other)]
    Other,
}

/// A transaction as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(deserialize_with = "lenient_cents")]
    pub amount: Cents,
    #[serde(default)]
    pub description: String,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub unit_id: Option<UnitId>,
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_period")]
    pub fiscal_period: Option<FiscalPeriod>,
    #[serde(default)]
    pub is_advance_payment: bool,
    #[serde(default)]
    pub is_late_payment: bool,
    #[serde(default)]
    pub created_by_name: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    /// Positive for income, negative for expense.
    pub fn signed_amount(&self) -> Cents {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => self.amount.saturating_neg(),
        }
    }

    /// Timing badge for income rows. Backend flags win; otherwise the
    /// fiscal period is compared against the payment date.
    pub fn timing(&self) -> Option<PaymentTiming> {
        if !self.is_income() {
            return None;
        }
        if self.is_advance_payment {
            return Some(PaymentTiming::Advance);
        }
        if self.is_late_payment {
            return Some(PaymentTiming::Late);
        }
        Some(
            self.fiscal_period
                .map(|period| classify_payment(period, self.transaction_date))
                .unwrap_or(PaymentTiming::OnTime),
        )
    }
}

// A period the backend got wrong should not sink the whole row.
fn lenient_period<'de, D>(deserializer: D) -> Result<Option<FiscalPeriod>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}
