//! Shared HTTP helpers

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

use crate::error::CardpressError;

/// User agent sent with every request (GitHub rejects requests without one)
pub const AGENT: &str = concat!("cardpress/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given default headers plus a user agent
pub fn build_client(mut headers: HeaderMap) -> Result<reqwest::Client> {
    headers
        .entry(USER_AGENT)
        .or_insert(HeaderValue::from_static(AGENT));
    headers
        .entry(ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Header value from a runtime string (tokens, bearer values)
pub fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).context("Invalid header value")
}

/// Check that an HTTP response was successful, returning a descriptive error otherwise.
pub async fn check_response(
    response: reqwest::Response,
    service: &'static str,
) -> Result<reqwest::Response, CardpressError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(CardpressError::Api {
        service,
        status,
        body,
    })
}
