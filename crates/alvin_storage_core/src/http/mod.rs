//! Minimal HTTP request/response contract used by the repository adapters.
//!
//! # Responsibility
//! - Describe outgoing requests as plain values so adapters stay testable.
//! - Hide the concrete HTTP client behind [`HttpClient`].
//!
//! # Invariants
//! - One call to [`HttpClient::send`] issues exactly one request; no retries.
//! - Timeouts are a property of the concrete client, never of callers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;

pub type HttpResult<T> = Result<T, HttpError>;

/// Transport-level HTTP failure. Status codes are not errors here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    Client(String),
    Transport { url: String, message: String },
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(message) => write!(f, "http client setup failed: {message}"),
            Self::Transport { url, message } => {
                write!(f, "http request to {url} failed: {message}")
            }
        }
    }
}

impl Error for HttpError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// Outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the first header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking HTTP client.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: &HttpRequest) -> HttpResult<HttpResponse>;
}

/// Returns an `Authorization` header value for HTTP Basic credentials.
pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}
