//! HTTP transport seam for provider adapters. Tests swap in
//! [`CannedHttpClient`] so no adapter test touches the network.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// A GET issued by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }
}

/// Failure below the HTTP status line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

pub trait HttpClient: Send + Sync {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Live transport. Keeps a cookie store, which Yahoo's chart endpoint
/// expects across calls.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockcast/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url).timeout(request.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

/// Answers every request with the same result and remembers the URLs asked for.
#[derive(Debug, Clone)]
pub struct CannedHttpClient {
    result: Result<HttpResponse, HttpError>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl CannedHttpClient {
    pub fn respond(response: HttpResponse) -> Self {
        Self::with_result(Ok(response))
    }

    pub fn fail(error: HttpError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<HttpResponse, HttpError>) -> Self {
        Self {
            result,
            urls: Arc::default(),
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().map(|urls| urls.clone()).unwrap_or_default()
    }
}

impl HttpClient for CannedHttpClient {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(request.url);
        }
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_keep_insertion_order() {
        let request = HttpRequest::get("https://example.test/chart", Duration::from_millis(250))
            .header("accept", "application/json")
            .header("referer", "https://example.test/");

        assert_eq!(request.headers[0].0, "accept");
        assert_eq!(request.headers[1].1, "https://example.test/");
        assert_eq!(request.timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn canned_client_replays_result_and_records_urls() {
        let client = CannedHttpClient::respond(HttpResponse::ok_json("{}"));
        let response = client
            .execute(HttpRequest::get("https://example.test/a", Duration::from_secs(1)))
            .await
            .expect("canned response");

        assert!(response.is_success());
        assert_eq!(client.requested_urls(), vec!["https://example.test/a"]);
    }

    #[tokio::test]
    async fn canned_failure_is_returned_verbatim() {
        let client = CannedHttpClient::fail(HttpError::Timeout(String::from("slow")));
        let err = client
            .execute(HttpRequest::get("https://example.test/b", Duration::from_secs(1)))
            .await
            .expect_err("canned failure");

        assert_eq!(err.to_string(), "timed out: slow");
    }
}
