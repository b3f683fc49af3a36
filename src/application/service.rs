use chrono::{DateTime, Utc};

use crate::api::{
    categories_key, category_key, parse_list, parse_transaction_page, parse_unit_page,
    transaction_key, unit_balance_key, units_key, ApiClient, TransactionPage, UnitPage,
    CATEGORIES_PATH,
};
use crate::config::Config;
use crate::domain::{
    resolve, resolve_lenient, Category, CategoryId, CategoryUpdate, FilterMode, NewCategory,
    QueryKey, Transaction, TransactionFilters, TransactionId, TransactionQuery, TransactionType,
    UnitBalance, UnitId,
};
use crate::storage::ResponseCache;

use super::AppError;

/// Where keyed reads come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Ask the backend and remember the body.
    #[default]
    Network,
    /// Serve only what an earlier fetch stored.
    CacheOnly,
}

/// A decoded response plus where it came from.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Fetched<T> {
    fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Fetched<U>, E> {
        Ok(Fetched {
            value: f(self.value)?,
            from_cache: self.from_cache,
            fetched_at: self.fetched_at,
        })
    }
}

/// Application service over the backend API and the local response cache.
/// Every read is keyed by its canonical [`QueryKey`].
pub struct FinanceService {
    client: ApiClient,
    cache: Option<ResponseCache>,
    policy: FetchPolicy,
    strict_periods: bool,
}

impl FinanceService {
    pub fn new(client: ApiClient, cache: Option<ResponseCache>) -> Self {
        Self {
            client,
            cache,
            policy: FetchPolicy::Network,
            strict_periods: false,
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_strict_periods(mut self, strict: bool) -> Self {
        self.strict_periods = strict;
        self
    }

    /// Build the service a configuration describes, opening the cache when enabled.
    pub async fn from_config(config: &Config, policy: FetchPolicy) -> Result<Self, AppError> {
        let cache = if config.cache.enabled {
            let path = config.cache.path.to_string_lossy();
            Some(ResponseCache::init(&path).await?)
        } else {
            None
        };
        Ok(Self::new(ApiClient::from_config(&config.api), cache)
            .with_policy(policy)
            .with_strict_periods(config.filters.strict_periods))
    }

    async fn fetch_raw(&self, key: &QueryKey) -> Result<Fetched<Vec<u8>>, AppError> {
        match self.policy {
            FetchPolicy::CacheOnly => {
                let cached = match &self.cache {
                    Some(cache) => cache.get(key).await?,
                    None => None,
                };
                let cached = cached.ok_or_else(|| AppError::NotCached(key.to_string()))?;
                log::debug!("Cache hit for {}", key);
                Ok(Fetched {
                    value: cached.body,
                    from_cache: true,
                    fetched_at: cached.fetched_at,
                })
            }
            FetchPolicy::Network => {
                let body = self.client.fetch(key).await?;
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(key, &body).await {
                        log::warn!("Could not cache {}: {:#}", key, e);
                    }
                }
                Ok(Fetched {
                    value: body,
                    from_cache: false,
                    fetched_at: Utc::now(),
                })
            }
        }
    }

    async fn invalidate(&self, kind: &str) -> Result<(), AppError> {
        if let Some(cache) = &self.cache {
            let dropped = cache.invalidate_kind(kind).await?;
            log::debug!("Invalidated {} cached {} responses", dropped, kind);
        }
        Ok(())
    }

    /// Derive request parameters, honouring the configured period strictness.
    pub fn transaction_query(
        &self,
        filters: &TransactionFilters,
        mode: FilterMode,
    ) -> Result<TransactionQuery, AppError> {
        Ok(TransactionQuery::from_filters(
            filters,
            mode,
            self.strict_periods,
        )?)
    }

    pub async fn fetch_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Fetched<TransactionPage>, AppError> {
        self.fetch_raw(&query.key())
            .await?
            .try_map(|body| parse_transaction_page(&body))
            .map_err(AppError::from)
    }

    pub async fn transaction(&self, id: TransactionId) -> Result<Fetched<Transaction>, AppError> {
        self.fetch_raw(&transaction_key(id))
            .await?
            .try_map(|body| serde_json::from_slice(&body))
            .map_err(|e| AppError::Api(e.into()))
    }

    pub async fn categories(
        &self,
        kind: Option<TransactionType>,
    ) -> Result<Fetched<Vec<Category>>, AppError> {
        self.fetch_raw(&categories_key(kind))
            .await?
            .try_map(|body| parse_list(&body))
            .map_err(AppError::from)
    }

    pub async fn category(&self, id: CategoryId) -> Result<Fetched<Category>, AppError> {
        self.fetch_raw(&category_key(id))
            .await?
            .try_map(|body| serde_json::from_slice(&body))
            .map_err(|e| AppError::Api(e.into()))
    }

    pub async fn create_category(&self, category: NewCategory) -> Result<Category, AppError> {
        category.validate().map_err(AppError::InvalidCategory)?;
        let created = self.client.create_category(&category).await?;
        self.invalidate(categories_kind()).await?;
        log::info!("Created category '{}'", created.name);
        Ok(created)
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, AppError> {
        update.validate().map_err(AppError::InvalidCategory)?;
        let updated = self.client.update_category(id, &update).await?;
        self.invalidate(categories_kind()).await?;
        Ok(updated)
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), AppError> {
        self.client.delete_category(id).await?;
        self.invalidate(categories_kind()).await?;
        log::info!("Deleted category {}", id);
        Ok(())
    }

    pub async fn units(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<Fetched<UnitPage>, AppError> {
        self.fetch_raw(&units_key(page.max(1), limit.max(1), search))
            .await?
            .try_map(|body| parse_unit_page(&body))
            .map_err(AppError::from)
    }

    /// Statement for one unit, optionally restricted to a fiscal period.
    pub async fn unit_balance(
        &self,
        id: UnitId,
        period: Option<&str>,
    ) -> Result<Fetched<UnitBalance>, AppError> {
        let range = if self.strict_periods {
            resolve(period)?
        } else {
            resolve_lenient(period)
        };
        self.fetch_raw(&unit_balance_key(id, range))
            .await?
            .try_map(|body| serde_json::from_slice(&body))
            .map_err(|e| AppError::Api(e.into()))
    }

    /// Number of stored responses, or `None` when caching is disabled.
    pub async fn cached_responses(&self) -> Result<Option<i64>, AppError> {
        match &self.cache {
            Some(cache) => Ok(Some(cache.count().await?)),
            None => Ok(None),
        }
    }

    pub async fn clear_cache(&self) -> Result<u64, AppError> {
        match &self.cache {
            Some(cache) => Ok(cache.clear().await?),
            None => Ok(0),
        }
    }
}

fn categories_kind() -> &'static str {
    CATEGORIES_PATH.trim_start_matches('/')
}
