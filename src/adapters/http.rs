//! Blocking HTTP adapter over `reqwest`.

use std::time::Duration;

use crate::app::ports::{HttpClient, HttpResponse};
use crate::error::HttpError;

/// [`HttpClient`] backed by a shared `reqwest::blocking::Client`.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Build a client that sends `user_agent` on every request.
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: serde_json::Value::Null,
            });
        }

        let body = response
            .json::<serde_json::Value>()
            .map_err(|e| HttpError::Body(e.to_string()))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
