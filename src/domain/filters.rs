use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::{Cents, CategoryId, TransactionId, TransactionStatus, TransactionType, UnitId};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Everything the transaction list is filtered by. `None` means "not applied".
///
/// The fiscal period is kept as the raw token the user picked; it is resolved
/// into a date range only when query parameters are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionFilters {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<CategoryId>,
    pub unit_id: Option<UnitId>,
    pub status: Option<TransactionStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub fiscal_period: Option<String>,
    pub amount_min: Option<Cents>,
    pub amount_max: Option<Cents>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for TransactionFilters {
    fn default() -> Self {
        Self {
            transaction_type: None,
            category_id: None,
            unit_id: None,
            status: None,
            date_from: None,
            date_to: None,
            fiscal_period: None,
            amount_min: None,
            amount_max: None,
            search: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TransactionFilters {
    /// Number of optional dimensions currently applied (drives the filter badge).
    pub fn active_count(&self) -> usize {
        [
            self.transaction_type.is_some(),
            self.category_id.is_some(),
            self.unit_id.is_some(),
            self.status.is_some(),
            self.date_from.is_some(),
            self.date_to.is_some(),
            self.fiscal_period.is_some(),
            self.amount_min.is_some(),
            self.amount_max.is_some(),
            self.search.is_some(),
        ]
        .iter()
        .filter(|applied| **applied)
        .count()
    }

    // Raw field write; page bookkeeping lives in FilterStore.
    fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::Type(v) => self.transaction_type = v,
            FilterChange::Category(v) => self.category_id = v,
            FilterChange::Unit(v) => self.unit_id = v,
            FilterChange::Status(v) => self.status = v,
            FilterChange::DateFrom(v) => self.date_from = v,
            FilterChange::DateTo(v) => self.date_to = v,
            FilterChange::FiscalPeriod(v) => {
                self.fiscal_period = v.filter(|token| !token.trim().is_empty())
            }
            FilterChange::AmountMin(v) => self.amount_min = v,
            FilterChange::AmountMax(v) => self.amount_max = v,
            FilterChange::Search(v) => self.search = v.filter(|text| !text.trim().is_empty()),
            FilterChange::Page(page) => self.page = page.max(1),
            FilterChange::PageSize(size) => self.page_size = size.max(1),
        }
    }
}

/// A single-field filter write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Type(Option<TransactionType>),
    Category(Option<CategoryId>),
    Unit(Option<UnitId>),
    Status(Option<TransactionStatus>),
    DateFrom(Option<NaiveDate>),
    DateTo(Option<NaiveDate>),
    FiscalPeriod(Option<String>),
    AmountMin(Option<Cents>),
    AmountMax(Option<Cents>),
    Search(Option<String>),
    Page(u32),
    PageSize(u32),
}

impl FilterChange {
    pub fn is_page(&self) -> bool {
        matches!(self, FilterChange::Page(_))
    }
}

/// Session-scoped filter state for the transaction list.
///
/// Writes build a new `TransactionFilters` and swap the `Arc`, so a snapshot
/// handed out earlier never changes underneath its holder.
#[derive(Debug, Default)]
pub struct FilterStore {
    filters: Arc<TransactionFilters>,
    selected_transaction: Option<TransactionId>,
    filter_panel_open: bool,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    pub fn filters(&self) -> Arc<TransactionFilters> {
        Arc::clone(&self.filters)
    }

    /// Update one field. Any field other than `page` sends the list back to page 1.
    pub fn set_filter(&mut self, change: FilterChange) {
        let resets_page = !change.is_page();
        self.replace(|next| {
            next.apply(change);
            if resets_page {
                next.page = DEFAULT_PAGE;
            }
        });
    }

    /// Apply several fields at once, then reset to page 1 unconditionally,
    /// even when one of the changes was a `Page`.
    pub fn set_filters<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = FilterChange>,
    {
        self.replace(|next| {
            for change in changes {
                next.apply(change);
            }
            next.page = DEFAULT_PAGE;
        });
    }

    /// Back to `page = 1`, `page_size = 20`, nothing applied.
    pub fn reset_filters(&mut self) {
        self.filters = Arc::new(TransactionFilters::default());
    }

    pub fn select_transaction(&mut self, id: Option<TransactionId>) {
        self.selected_transaction = id;
    }

    pub fn selected_transaction(&self) -> Option<TransactionId> {
        self.selected_transaction
    }

    /// Flip the filter panel and return its new state.
    pub fn toggle_filter_panel(&mut self) -> bool {
        self.filter_panel_open = !self.filter_panel_open;
        self.filter_panel_open
    }

    pub fn is_filter_panel_open(&self) -> bool {
        self.filter_panel_open
    }

    fn replace(&mut self, update: impl FnOnce(&mut TransactionFilters)) {
        let mut next = TransactionFilters::clone(&self.filters);
        update(&mut next);
        self.filters = Arc::new(next);
    }
}
