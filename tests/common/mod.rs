// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use condofin::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Method, Transport};
use condofin::application::{FetchPolicy, FinanceService};
use condofin::storage::ResponseCache;
use serde_json::{json, Value};
use tempfile::TempDir;

struct Route {
    method: Method,
    prefix: String,
    status: u16,
    body: Vec<u8>,
    delay: Duration,
}

/// In-memory backend. Requests are matched by method and longest path prefix;
/// anything unmatched gets a 404 with a FastAPI-style detail.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: Method, prefix: &str, status: u16, body: Value) {
        self.route_delayed(method, prefix, status, body, Duration::ZERO);
    }

    pub fn route_delayed(
        &self,
        method: Method,
        prefix: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) {
        let body = if body.is_null() {
            Vec::new()
        } else {
            body.to_string().into_bytes()
        };
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|r| !(r.method == method && r.prefix == prefix));
        routes.push(Route {
            method,
            prefix: prefix.to_string(),
            status,
            body,
            delay,
        });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let matched = {
            let routes = self.routes.lock().unwrap();
            routes
                .iter()
                .filter(|r| r.method == request.method && request.path.starts_with(&r.prefix))
                .max_by_key(|r| r.prefix.len())
                .map(|r| (r.status, r.body.clone(), r.delay))
        };
        self.requests.lock().unwrap().push(request.clone());

        let (status, body, delay) = matched.unwrap_or_else(|| {
            (
                404,
                json!({"detail": {"error": "NOT_FOUND", "message": "No route"}})
                    .to_string()
                    .into_bytes(),
                Duration::ZERO,
            )
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(ApiResponse { status, body })
    }
}

/// Helper to create a test service with a temporary cache database
pub async fn test_service(transport: Arc<FakeTransport>) -> Result<(FinanceService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = service_at(temp_dir.path(), transport, FetchPolicy::Network).await?;
    Ok((service, temp_dir))
}

/// A service over the cache file inside `dir`, so several services can share it.
pub async fn service_at(
    dir: &Path,
    transport: Arc<FakeTransport>,
    policy: FetchPolicy,
) -> Result<FinanceService> {
    let db_path = dir.join("cache.db");
    let cache = ResponseCache::init(db_path.to_str().unwrap()).await?;
    Ok(FinanceService::new(ApiClient::new(transport), Some(cache)).with_policy(policy))
}

pub fn transaction_json(kind: &str, amount: &str, date: &str) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "type": kind,
        "amount": amount,
        "description": format!("{} {}", kind, date),
        "transaction_date": date,
        "category_name": "Cuotas",
        "unit_number": "101",
        "status": "confirmed"
    })
}

/// The `{data, summary, pagination}` shape the backend normally returns.
pub fn page_body(items: Vec<Value>, summary: Value) -> Value {
    let count = items.len();
    json!({
        "data": items,
        "summary": summary,
        "pagination": {
            "page": 1,
            "limit": 20,
            "total_items": count,
            "total_pages": 1,
            "has_next": false,
            "has_prev": false
        }
    })
}

pub fn category_json(name: &str, kind: &str) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "name": name,
        "type": kind,
        "color": "#10B981",
        "is_active": true,
        "is_system": false
    })
}
