use std::fmt;

use super::{
    format_cents, format_date, resolve, resolve_lenient, FilterMode, PeriodError,
    TransactionFilters,
};

/// Canonical identity of a request: path plus sorted, encoded parameters.
/// Two requests with the same key are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(path: &str, params: &[(&'static str, String)]) -> Self {
        let mut sorted: Vec<&(&'static str, String)> = params.iter().collect();
        sorted.sort();
        let query = encode_params(sorted.into_iter());
        if query.is_empty() {
            Self(path.to_string())
        } else {
            Self(format!("{}?{}", path, query))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource family, used to invalidate every cached page of one kind.
    pub fn kind(&self) -> &str {
        let path = self.0.split('?').next().unwrap_or_default();
        path.trim_start_matches('/').split('/').next().unwrap_or_default()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for QueryKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Encode `key=value` pairs, in the given order, as a query string.
pub fn encode_params<'a, I>(params: I) -> String
where
    I: Iterator<Item = &'a (&'static str, String)>,
{
    params
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parameters for `GET /transactions`, derived from the filter snapshot and lens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    params: Vec<(&'static str, String)>,
}

pub const TRANSACTIONS_PATH: &str = "/transactions";

impl TransactionQuery {
    /// Derive parameters. A selected fiscal period takes precedence over the
    /// explicit date bounds. With `strict` an invalid period is an error;
    /// otherwise it is logged and the range is left unrestricted.
    pub fn from_filters(
        filters: &TransactionFilters,
        mode: FilterMode,
        strict: bool,
    ) -> Result<Self, PeriodError> {
        let mut params: Vec<(&'static str, String)> = vec![
            ("page", filters.page.to_string()),
            ("limit", filters.page_size.to_string()),
        ];

        if let Some(kind) = filters.transaction_type {
            params.push(("type", kind.as_str().to_string()));
        }

        let period = filters.fiscal_period.as_deref();
        let range = if strict {
            resolve(period)?
        } else {
            resolve_lenient(period)
        };
        match range {
            Some(range) => {
                params.push(("from_date", range.from_string()));
                params.push(("to_date", range.to_string_inclusive()));
            }
            None => {
                if let Some(from) = filters.date_from {
                    params.push(("from_date", format_date(from)));
                }
                if let Some(to) = filters.date_to {
                    params.push(("to_date", format_date(to)));
                }
            }
        }

        if let Some(id) = filters.category_id {
            params.push(("category_id", id.to_string()));
        }
        if let Some(id) = filters.unit_id {
            params.push(("unit_id", id.to_string()));
        }
        if let Some(status) = filters.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(min) = filters.amount_min {
            params.push(("min_amount", format_cents(min)));
        }
        if let Some(max) = filters.amount_max {
            params.push(("max_amount", format_cents(max)));
        }
        if let Some(search) = &filters.search {
            params.push(("search", search.trim().to_string()));
        }

        match mode {
            FilterMode::Normal => {}
            FilterMode::Late => params.push(("is_late", "true".to_string())),
            FilterMode::Advance => params.push(("is_advance", "true".to_string())),
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(TRANSACTIONS_PATH, &self.params)
    }
}
