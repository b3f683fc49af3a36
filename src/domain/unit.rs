use serde::{Deserialize, Serialize};

use super::{lenient_cents, lenient_count, Cents, Transaction, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Occupied,
    Vacant,
    Maintenance,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Occupied => "occupied",
            UnitStatus::Vacant => "vacant",
            UnitStatus::Maintenance => "maintenance",
        }
    }
}

/// A household owing periodic fees. Negative balance means debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_number: String,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    pub status: UnitStatus,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub monthly_fee: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub balance: Cents,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

impl Unit {
    pub fn has_debt(&self) -> bool {
        self.balance < 0
    }

    /// Display name: building prefix when present, e.g. "Torre A-101".
    pub fn display_name(&self) -> String {
        match &self.building {
            Some(building) if !building.is_empty() => format!("{}-{}", building, self.unit_number),
            _ => self.unit_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UnitSummary {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_units: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub occupied: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub vacant: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub maintenance: i64,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total_debt: Cents,
    #[serde(default, deserialize_with = "lenient_count")]
    pub units_with_debt: i64,
}

/// Account statement for one unit over an optional date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitBalance {
    pub unit_id: UnitId,
    pub unit_number: String,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub current_balance: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total_charges: Cents,
    #[serde(default, deserialize_with = "lenient_cents")]
    pub total_payments: Cents,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl UnitBalance {
    /// Payments minus charges over the statement's range.
    pub fn period_net(&self) -> Cents {
        self.total_payments.saturating_sub(self.total_charges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_unit_and_debt() {
        let unit: Unit = serde_json::from_value(json!({
            "id": "2d0f3f1e-1d0b-4c3a-9a55-7c5b0c1e2f34",
            "unit_number": "101",
            "building": "Torre A",
            "status": "occupied",
            "monthly_fee": "850.00",
            "balance": "-1700.00"
        }))
        .unwrap();
        assert!(unit.has_debt());
        assert_eq!(unit.monthly_fee, 85000);
        assert_eq!(unit.display_name(), "Torre A-101");
    }

    #[test]
    fn test_balance_period_net() {
        let balance: UnitBalance = serde_json::from_value(json!({
            "unit_id": "2d0f3f1e-1d0b-4c3a-9a55-7c5b0c1e2f34",
            "unit_number": "101",
            "current_balance": "0",
            "total_charges": "850",
            "total_payments": "1000.50"
        }))
        .unwrap();
        assert_eq!(balance.period_net(), 15050);
        assert!(balance.transactions.is_empty());
    }
}
