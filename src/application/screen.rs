use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::api::TransactionPage;
use crate::domain::{
    derive, select_summary_view, BreakdownTile, FilterChange, FilterMode, FilterStore, QueryKey,
    SummaryView, TransactionFilters, TransactionId, TransactionRow, TransactionSummaryDerived,
    ViewMode,
};

use super::{AppError, FinanceService};

/// Everything the transaction list renders for one query key.
#[derive(Debug, Clone)]
pub struct PublishedPage {
    pub key: QueryKey,
    pub mode: FilterMode,
    pub page: TransactionPage,
    pub summary: TransactionSummaryDerived,
    pub view: SummaryView,
    pub rows: Vec<TransactionRow>,
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Published(Arc<PublishedPage>),
    /// Filters or lens changed while the request was in flight. The response
    /// was cached by key but not shown.
    Superseded { key: QueryKey },
}

/// The failure shown for the latest request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenError {
    pub key: QueryKey,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Default)]
struct ScreenState {
    store: FilterStore,
    mode: FilterMode,
    published: Option<Arc<PublishedPage>>,
    last_error: Option<ScreenError>,
}

/// State behind the transaction list: filters, lens and the last published
/// page. Mutations are synchronous; only fetches await, and only the result
/// for the latest key is ever published.
pub struct TransactionsScreen {
    service: Arc<FinanceService>,
    view_mode: ViewMode,
    state: Mutex<ScreenState>,
}

impl TransactionsScreen {
    pub fn new(service: Arc<FinanceService>, view_mode: ViewMode) -> Self {
        Self {
            service,
            view_mode,
            state: Mutex::new(ScreenState::default()),
        }
    }

    // Never held across an await.
    fn state(&self) -> MutexGuard<'_, ScreenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn filters(&self) -> Arc<TransactionFilters> {
        self.state().store.filters()
    }

    pub fn mode(&self) -> FilterMode {
        self.state().mode
    }

    pub fn set_filter(&self, change: FilterChange) {
        self.state().store.set_filter(change);
    }

    pub fn set_filters<I>(&self, changes: I)
    where
        I: IntoIterator<Item = FilterChange>,
    {
        self.state().store.set_filters(changes);
    }

    pub fn reset_filters(&self) {
        self.state().store.reset_filters();
    }

    pub fn select_transaction(&self, id: Option<TransactionId>) {
        self.state().store.select_transaction(id);
    }

    pub fn selected_transaction(&self) -> Option<TransactionId> {
        self.state().store.selected_transaction()
    }

    pub fn toggle_filter_panel(&self) -> bool {
        self.state().store.toggle_filter_panel()
    }

    /// Switch the lens. A different lens starts again from the first page.
    pub fn set_mode(&self, mode: FilterMode) {
        let mut state = self.state();
        if state.mode != mode {
            state.mode = mode;
            state.store.set_filter(FilterChange::Page(1));
        }
    }

    pub fn select_tile(&self, tile: BreakdownTile) {
        self.set_mode(tile.mode());
    }

    pub fn dismiss_banner(&self) {
        self.set_mode(FilterMode::Normal);
    }

    /// Key the current filters and lens map to.
    pub fn current_key(&self) -> Result<QueryKey, AppError> {
        let (filters, mode) = self.snapshot();
        Ok(self.service.transaction_query(&filters, mode)?.key())
    }

    pub fn published(&self) -> Option<Arc<PublishedPage>> {
        self.state().published.clone()
    }

    pub fn last_error(&self) -> Option<ScreenError> {
        self.state().last_error.clone()
    }

    fn snapshot(&self) -> (Arc<TransactionFilters>, FilterMode) {
        let state = self.state();
        (state.store.filters(), state.mode)
    }

    fn is_latest(&self, key: &QueryKey) -> bool {
        matches!(self.current_key(), Ok(current) if &current == key)
    }

    /// Fetch the page for the current filters and lens.
    pub async fn load(&self) -> Result<LoadOutcome, AppError> {
        let (filters, mode) = self.snapshot();
        let query = self.service.transaction_query(&filters, mode)?;
        let key = query.key();

        let fetched = match self.service.fetch_transactions(&query).await {
            Ok(fetched) => fetched,
            Err(e) => {
                if self.is_latest(&key) {
                    self.state().last_error = Some(ScreenError {
                        key: key.clone(),
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                }
                return Err(e);
            }
        };

        let summary = derive(fetched.value.summary, mode);
        let view = select_summary_view(self.view_mode, &summary, filters.transaction_type);
        let rows = fetched.value.items.iter().map(TransactionRow::from).collect();
        let page = Arc::new(PublishedPage {
            key: key.clone(),
            mode,
            page: fetched.value,
            summary,
            view,
            rows,
            from_cache: fetched.from_cache,
            fetched_at: fetched.fetched_at,
        });

        // Recompute under the same lock that publishes, so a filter change
        // cannot slip in between the check and the write.
        let mut state = self.state();
        let current = self
            .service
            .transaction_query(&state.store.filters(), state.mode)
            .map(|q| q.key())
            .ok();
        if current.as_ref() != Some(&key) {
            log::warn!("Discarding stale response for {}", key);
            return Ok(LoadOutcome::Superseded { key });
        }

        log::info!(
            "Showing {} transactions for {}",
            page.rows.len(),
            page.key
        );
        state.published = Some(Arc::clone(&page));
        state.last_error = None;
        Ok(LoadOutcome::Published(page))
    }

    /// Pull-to-refresh: fetch the same key again without touching filters.
    pub async fn refresh(&self) -> Result<LoadOutcome, AppError> {
        log::debug!("Refreshing transaction list");
        self.load().await
    }
}
