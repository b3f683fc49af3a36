use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use condofin::api::{ApiClient, ApiError, HyperTransport};
use condofin::domain::{
    resolve, FilterMode, TransactionFilters, TransactionQuery, TransactionType,
};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::json;

async fn handle(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let authorized = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .map(|v| v == "Bearer test-token")
        .unwrap_or(false);
    if !authorized {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::from(r#"{"detail":"No autenticado"}"#))
            .unwrap());
    }

    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();
    let response = match path.as_str() {
        "/api/v1/transactions" => {
            let body = json!({
                "items": [{
                    "id": uuid::Uuid::new_v4().to_string(),
                    "type": "income",
                    "amount": 850,
                    "transaction_date": "2024-02-05",
                    "description": query
                }],
                "summary": {"total_income": 850, "transaction_count": "1"}
            });
            Response::new(Body::from(body.to_string()))
        }
        p if p.starts_with("/api/v1/categories/") => {
            let id = p.trim_start_matches("/api/v1/categories/");
            let body = json!({
                "id": id,
                "name": "Agua",
                "type": "expense",
                "color": "#3B82F6",
                "transaction_count": 4
            });
            Response::new(Body::from(body.to_string()))
        }
        p if p.starts_with("/api/v1/units/") && p.ends_with("/balance") => {
            let id = p
                .trim_start_matches("/api/v1/units/")
                .trim_end_matches("/balance");
            let body = json!({
                "unit_id": id,
                "unit_number": "202",
                "current_balance": "-425.00",
                "total_charges": "850.00",
                "total_payments": "425.00",
                "transactions": []
            });
            Response::new(Body::from(body.to_string()))
        }
        "/api/v1/slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Response::new(Body::from("{}"))
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(
                r#"{"detail":{"error":"NOT_FOUND","message":"Recurso no encontrado"}}"#,
            ))
            .unwrap(),
    };
    Ok(response)
}

fn spawn_server() -> SocketAddr {
    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn client(addr: SocketAddr, token: Option<&str>, timeout: Duration) -> ApiClient {
    ApiClient::new(Arc::new(HyperTransport::new(
        format!("http://{}/api/v1", addr),
        token.map(str::to_string),
        timeout,
    )))
}

#[tokio::test]
async fn test_list_transactions_over_http() -> Result<()> {
    let addr = spawn_server();
    let client = client(addr, Some("test-token"), Duration::from_secs(5));

    let filters = TransactionFilters {
        transaction_type: Some(TransactionType::Income),
        fiscal_period: Some("2024-02".to_string()),
        ..Default::default()
    };
    let query = TransactionQuery::from_filters(&filters, FilterMode::Normal, true)?;
    let page = client.list_transactions(&query).await?;

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].amount, 85000);
    assert_eq!(page.summary.total_income, 85000);
    assert_eq!(page.summary.transaction_count, 1);
    // The server echoes the query string into the description.
    let echoed = &page.items[0].description;
    assert!(echoed.contains("from_date=2024-02-01"));
    assert!(echoed.contains("to_date=2024-02-29"));
    assert!(echoed.contains("type=income"));
    Ok(())
}

#[tokio::test]
async fn test_category_and_unit_balance_over_http() -> Result<()> {
    let addr = spawn_server();
    let client = client(addr, Some("test-token"), Duration::from_secs(5));

    let category_id = uuid::Uuid::new_v4();
    let category = client.get_category(category_id).await?;
    assert_eq!(category.id, category_id);
    assert_eq!(category.name, "Agua");
    assert_eq!(category.transaction_count, 4);

    let unit_id = uuid::Uuid::new_v4();
    let range = resolve(Some("2024-02"))?;
    let balance = client.unit_balance(unit_id, range).await?;
    assert_eq!(balance.unit_id, unit_id);
    assert_eq!(balance.current_balance, -42500);
    assert_eq!(balance.period_net(), -42500);
    Ok(())
}

#[tokio::test]
async fn test_http_errors_map_to_status() -> Result<()> {
    let addr = spawn_server();

    let anonymous = client(addr, None, Duration::from_secs(5));
    match anonymous.list_categories(None).await {
        Err(ApiError::Status { status, message, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "No autenticado");
        }
        other => panic!("unexpected {:?}", other),
    }

    let authed = client(addr, Some("test-token"), Duration::from_secs(5));
    match authed.get_transaction(uuid::Uuid::new_v4()).await {
        Err(ApiError::Status { status, code, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(code.as_deref(), Some("NOT_FOUND"));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_retryable() -> Result<()> {
    let addr = spawn_server();
    let client = client(addr, Some("test-token"), Duration::from_millis(100));

    let err = client
        .fetch(&condofin::domain::QueryKey::new("/slow", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)));
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_network_error() -> Result<()> {
    // Bind and drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let client = client(addr, None, Duration::from_secs(5));

    let err = client.list_units(1, 20, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    Ok(())
}

#[tokio::test]
async fn test_https_endpoint_is_dialed() -> Result<()> {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let client = ApiClient::new(Arc::new(HyperTransport::new(
        format!("https://{}/api/v1", addr),
        None,
        Duration::from_secs(5),
    )));

    // Nothing listens, so the failure comes from connecting, not from the scheme.
    let err = client.list_categories(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    Ok(())
}
