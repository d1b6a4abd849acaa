//! HTTP 传输层 - 渠道实现通过 `Transport` 发出唯一一次 POST 请求

use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::debug;

/// HTTP 响应
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 传输 trait
pub trait Transport: Send + Sync {
    /// POST JSON body 到 url
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<TransportResponse>;
}

/// 基于 reqwest blocking client 的传输实现
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<TransportResponse> {
        let start = std::time::Instant::now();
        // url 中包含 bot token，错误信息中去掉 url
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .map_err(|e| anyhow!("HTTP request failed: {}", e.without_url()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| anyhow!("Failed to read response: {}", e.without_url()))?;

        debug!(
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "HTTP request completed"
        );

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(!TransportResponse::new(400, "").is_success());
        assert!(!TransportResponse::new(502, "").is_success());
    }
}
