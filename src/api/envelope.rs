//! Response shapes the backend has been seen to return, normalized once here
//! so nothing downstream has to care which one arrived.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{lenient_count, Transaction, TransactionSummaryRaw, Unit, UnitSummary};

use super::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "lenient_count")]
    pub page: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub limit: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_items: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_pages: i64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// A page of transactions with its aggregate counters.
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub summary: TransactionSummaryRaw,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransactionListEnvelope {
    Items {
        items: Vec<Transaction>,
        #[serde(default)]
        summary: Value,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Data {
        data: Vec<Transaction>,
        #[serde(default)]
        summary: Value,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Nested {
        data: Box<TransactionListEnvelope>,
        #[serde(default)]
        summary: Value,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
}

impl TransactionListEnvelope {
    fn into_page(self) -> TransactionPage {
        match self {
            TransactionListEnvelope::Items {
                items,
                summary,
                pagination,
            }
            | TransactionListEnvelope::Data {
                data: items,
                summary,
                pagination,
            } => TransactionPage {
                items,
                summary: TransactionSummaryRaw::from_value(&summary),
                pagination,
            },
            TransactionListEnvelope::Nested {
                data,
                summary,
                pagination,
            } => {
                let mut page = data.into_page();
                // Inner counters win; the outer ones are the fallback.
                if summary.is_object() && page.summary == TransactionSummaryRaw::default() {
                    page.summary = TransactionSummaryRaw::from_value(&summary);
                }
                page.pagination = page.pagination.or(pagination);
                page
            }
        }
    }
}

/// Decode a transaction list body in any of its known shapes.
pub fn parse_transaction_page(body: &[u8]) -> Result<TransactionPage, ApiError> {
    let envelope: TransactionListEnvelope = serde_json::from_slice(body)?;
    Ok(envelope.into_page())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Data { data: Vec<T> },
    Items { items: Vec<T> },
    Bare(Vec<T>),
}

/// Decode a generic `{data: [...]}` list, tolerating `{items: [...]}` and bare arrays.
pub fn parse_list<T>(body: &[u8]) -> Result<Vec<T>, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: ListEnvelope<T> = serde_json::from_slice(body)?;
    Ok(match envelope {
        ListEnvelope::Data { data } => data,
        ListEnvelope::Items { items } => items,
        ListEnvelope::Bare(items) => items,
    })
}

#[derive(Debug, Clone)]
pub struct UnitPage {
    pub units: Vec<Unit>,
    pub summary: UnitSummary,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct UnitListEnvelope {
    data: Vec<Unit>,
    #[serde(default)]
    summary: Value,
    #[serde(default)]
    pagination: Option<Pagination>,
}

pub fn parse_unit_page(body: &[u8]) -> Result<UnitPage, ApiError> {
    let envelope: UnitListEnvelope = serde_json::from_slice(body)?;
    let summary = serde_json::from_value(envelope.summary).unwrap_or_default();
    Ok(UnitPage {
        units: envelope.data,
        summary,
        pagination: envelope.pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(amount: &str) -> Value {
        json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "type": "income",
            "amount": amount,
            "transaction_date": "2024-05-02"
        })
    }

    #[test]
    fn test_items_shape() {
        let body = json!({
            "items": [row("10.00")],
            "summary": { "total_income": "10.00" }
        });
        let page = parse_transaction_page(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.summary.total_income, 1000);
        assert!(page.pagination.is_none());
    }

    #[test]
    fn test_data_shape_with_pagination() {
        let body = json!({
            "data": [row("10.00"), row("5.50")],
            "summary": { "total_income": "15.50", "transaction_count": 2 },
            "pagination": { "page": 1, "limit": 20, "total_items": 2, "total_pages": 1 }
        });
        let page = parse_transaction_page(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.summary.transaction_count, 2);
        assert_eq!(page.pagination.unwrap().total_pages, 1);
    }

    #[test]
    fn test_nested_shape_and_outer_summary() {
        let body = json!({
            "data": { "items": [row("1.00")] },
            "summary": { "total_expense": "3.00" }
        });
        let page = parse_transaction_page(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.summary.total_expense, 300);
    }

    #[test]
    fn test_missing_summary_is_zero() {
        let body = json!({ "data": [] });
        let page = parse_transaction_page(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.summary, TransactionSummaryRaw::default());
    }

    #[test]
    fn test_unknown_shape_errors() {
        assert!(parse_transaction_page(br#"{"rows": []}"#).is_err());
    }

    #[test]
    fn test_parse_list_variants() {
        let data: Vec<i32> = parse_list(br#"{"data":[1,2]}"#).unwrap();
        let items: Vec<i32> = parse_list(br#"{"items":[3]}"#).unwrap();
        let bare: Vec<i32> = parse_list(b"[4,5,6]").unwrap();
        assert_eq!((data.len(), items.len(), bare.len()), (2, 1, 3));
    }
}
