//! [`HttpClient`] over `reqwest`'s blocking client.

use super::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::Method;
use std::time::Instant;

/// Production HTTP client.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> HttpResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| HttpError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn send(&self, request: &HttpRequest) -> HttpResult<HttpResponse> {
        let started_at = Instant::now();
        let transport_error = |message: String| HttpError::Transport {
            url: request.url.clone(),
            message,
        };

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = match builder.send() {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=http_send module=http status=error method={} duration_ms={} error={}",
                    request.method.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(transport_error(err.to_string()));
            }
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| transport_error(err.to_string()))?;
        debug!(
            "event=http_send module=http status=ok method={} http_status={} duration_ms={}",
            request.method.as_str(),
            status,
            started_at.elapsed().as_millis()
        );
        Ok(HttpResponse { status, body })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}
