use std::time::Duration;

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Request};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};

use super::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_hyper(self) -> hyper::Method {
        match self {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
            Method::Put => hyper::Method::PUT,
            Method::Delete => hyper::Method::DELETE,
        }
    }
}

/// A request relative to the API base, e.g. `GET /categories?type=income`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_json_body(method: Method, path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves bytes to and from the backend. Status handling is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport on hyper's pooled client. `http://` and `https://` base URLs
/// both work; TLS is rustls with the bundled webpki roots.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        Self {
            client: Client::builder().build(connector),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout,
        }
    }

    fn build(&self, request: ApiRequest) -> Result<Request<Body>, ApiError> {
        let uri: hyper::Uri = format!("{}{}", self.base_url, request.path)
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ApiError::InvalidRequest(e.to_string()))?;

        let mut builder = Request::builder()
            .method(request.method.to_hyper())
            .uri(uri)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match request.body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        builder
            .body(body)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        let http_request = self.build(request)?;

        log::debug!("{} {}{}", method.as_str(), self.base_url, path);

        let exchange = async {
            let response = self.client.request(http_request).await?;
            let status = response.status().as_u16();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>(ApiResponse {
                status,
                body: bytes.to_vec(),
            })
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| ApiError::Network(e.to_string()))?;

        log::debug!("{} {} -> {}", method.as_str(), path, response.status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sets_headers() {
        let transport = HyperTransport::new(
            "http://localhost:8000/api/v1/",
            Some("secret".into()),
            Duration::from_secs(5),
        );
        let request = transport
            .build(ApiRequest::with_json_body(
                Method::Post,
                "/categories",
                b"{}".to_vec(),
            ))
            .unwrap();
        assert_eq!(request.method(), hyper::Method::POST);
        assert_eq!(
            request.uri().to_string(),
            "http://localhost:8000/api/v1/categories"
        );
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer secret");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_https_request_builds() {
        let transport = HyperTransport::new("https://example.org/api/v1", None, Duration::from_secs(5));
        let request = transport.build(ApiRequest::get("/units")).unwrap();
        assert_eq!(request.uri().scheme_str(), Some("https"));
        assert_eq!(request.uri().path(), "/api/v1/units");
        assert!(!request.headers().contains_key(AUTHORIZATION));
    }
}
