//! Downloading remote mapping sheets.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};

use crate::error::{IngestError, Result, SHARING_HINT};

/// User agent string for download requests.
const USER_AGENT_VALUE: &str = concat!("itemconv/", env!("CARGO_PKG_VERSION"));

/// Transport used to download URL sources.
pub trait HttpFetch {
    /// Download the body at `url`. Failures of any kind are reported as
    /// [`IngestError::SourceUnavailable`].
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<T: HttpFetch + ?Sized> HttpFetch for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url)
    }
}

/// Blocking reqwest client with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::unavailable("http client", e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!(url, "downloading mapping sheet");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE))
            .send()
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                IngestError::unavailable(url, reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::unavailable(url, status_reason(status)));
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("text/html"));

        let body = response
            .bytes()
            .map_err(|e| IngestError::unavailable(url, e.to_string()))?;

        if is_html || looks_like_html(&body) {
            return Err(IngestError::unavailable(
                url,
                format!("received a web page instead of a table; {SHARING_HINT}"),
            ));
        }

        tracing::debug!(url, bytes = body.len(), "download complete");
        Ok(body.to_vec())
    }
}

/// Explanation for a non-success HTTP status.
pub fn status_reason(status: StatusCode) -> String {
    match status.as_u16() {
        400 | 401 | 403 | 404 => format!("HTTP {status}; {SHARING_HINT}"),
        _ => format!("HTTP {status}"),
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let head = &body[..body.len().min(512)];
    let head = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_errors_carry_sharing_hint() {
        for code in [400, 401, 403, 404] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(status_reason(status).contains(SHARING_HINT));
        }
        let reason = status_reason(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(reason.starts_with("HTTP 500"));
        assert!(!reason.contains(SHARING_HINT));
    }

    #[test]
    fn detects_login_pages() {
        assert!(looks_like_html(b"  <!DOCTYPE html><html>"));
        assert!(looks_like_html(b"<HTML><body>"));
        assert!(!looks_like_html(b"OLD Item-variant;Ean no."));
    }
}
