use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::domain::{
    Category, CategoryId, CategoryUpdate, DateRange, NewCategory, QueryKey, Transaction,
    TransactionId, TransactionQuery, TransactionType, UnitBalance, UnitId,
};

use super::envelope::{parse_list, parse_transaction_page, parse_unit_page, TransactionPage, UnitPage};
use super::{ApiError, ApiRequest, HyperTransport, Method, Transport};

pub const CATEGORIES_PATH: &str = "/categories";
pub const UNITS_PATH: &str = "/units";

/// Enough for a full category dropdown in one page.
pub const CATEGORY_LIST_LIMIT: u32 = 100;

pub fn categories_key(kind: Option<TransactionType>) -> QueryKey {
    let mut params = vec![("limit", CATEGORY_LIST_LIMIT.to_string())];
    if let Some(kind) = kind {
        params.push(("type", kind.as_str().to_string()));
    }
    QueryKey::new(CATEGORIES_PATH, &params)
}

pub fn category_key(id: CategoryId) -> QueryKey {
    QueryKey::new(&format!("{}/{}", CATEGORIES_PATH, id), &[])
}

pub fn transaction_key(id: TransactionId) -> QueryKey {
    QueryKey::new(&format!("/transactions/{}", id), &[])
}

pub fn units_key(page: u32, limit: u32, search: Option<&str>) -> QueryKey {
    let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        params.push(("search", search.to_string()));
    }
    QueryKey::new(UNITS_PATH, &params)
}

pub fn unit_balance_key(id: UnitId, range: Option<DateRange>) -> QueryKey {
    let params = match range {
        Some(range) => vec![
            ("from_date", range.from_string()),
            ("to_date", range.to_string_inclusive()),
        ],
        None => Vec::new(),
    };
    QueryKey::new(&format!("{}/{}/balance", UNITS_PATH, id), &params)
}

/// Typed access to the backend. Every GET goes through a [`QueryKey`] so
/// callers can cache raw bodies under the same identity.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(Arc::new(HyperTransport::new(
            config.base_url.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )))
    }

    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(ApiError::from_response(response.status, &response.body))
        }
    }

    async fn send_json<T, B>(&self, method: Method, path: String, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let payload = serde_json::to_vec(body)?;
        let bytes = self
            .send(ApiRequest::with_json_body(method, path, payload))
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Raw body for a keyed GET.
    pub async fn fetch(&self, key: &QueryKey) -> Result<Vec<u8>, ApiError> {
        self.send(ApiRequest::get(key.as_str())).await
    }

    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, ApiError> {
        let body = self.fetch(&query.key()).await?;
        parse_transaction_page(&body)
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, ApiError> {
        let body = self.fetch(&transaction_key(id)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn list_categories(
        &self,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>, ApiError> {
        let body = self.fetch(&categories_key(kind)).await?;
        parse_list(&body)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let body = self.fetch(&category_key(id)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        category.validate().map_err(ApiError::InvalidRequest)?;
        self.send_json(Method::Post, CATEGORIES_PATH.to_string(), category)
            .await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, ApiError> {
        update.validate().map_err(ApiError::InvalidRequest)?;
        self.send_json(Method::Put, format!("{}/{}", CATEGORIES_PATH, id), update)
            .await
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.send(ApiRequest {
            method: Method::Delete,
            path: format!("{}/{}", CATEGORIES_PATH, id),
            body: None,
        })
        .await?;
        Ok(())
    }

    pub async fn list_units(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<UnitPage, ApiError> {
        let body = self.fetch(&units_key(page, limit, search)).await?;
        parse_unit_page(&body)
    }

    pub async fn unit_balance(
        &self,
        id: UnitId,
        range: Option<DateRange>,
    ) -> Result<UnitBalance, ApiError> {
        let body = self.fetch(&unit_balance_key(id, range)).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
