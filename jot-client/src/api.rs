//! Thin typed wrapper over the remote todo collection REST resource.
//!
//! Four calls, no retries. Non-success responses become `ApiError::Remote`
//! with the status and whatever body the server sent; retry policy, if any,
//! belongs to the caller.

use jot_core::{Todo, TodoDraft, TodoPatch};
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-side precondition; never reaches the network.
    #[error("title must not be empty")]
    EmptyTitle,

    /// The remote collection answered with a non-success status.
    #[error("{message} (status {status})")]
    Remote {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The call itself failed: connect error, timeout, malformed body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Connection settings for the remote collection.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Per-request timeout; a hung call surfaces as `Transport`.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct TodoApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TodoApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub async fn list(&self) -> Result<Vec<Todo>, ApiError> {
        let url = format!("{}/api/todos/", self.base_url);
        let resp = self.request(Method::GET, &url).send().await?;
        Ok(Self::ensure_success(resp, "fetch todos").await?.json().await?)
    }

    pub async fn create(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
        if draft.title.trim().is_empty() {
            return Err(ApiError::EmptyTitle);
        }

        let url = format!("{}/api/todos/", self.base_url);
        let resp = self.request(Method::POST, &url).json(draft).send().await?;
        Ok(Self::ensure_success(resp, "create todo").await?.json().await?)
    }

    pub async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, ApiError> {
        let url = format!("{}/api/todos/{id}/", self.base_url);
        let resp = self.request(Method::PUT, &url).json(patch).send().await?;
        Ok(Self::ensure_success(resp, "update todo").await?.json().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/todos/{id}/", self.base_url);
        let resp = self.request(Method::DELETE, &url).send().await?;
        // 200 and 204 both count as success; the body, if any, is ignored.
        Self::ensure_success(resp, "delete todo").await?;
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn ensure_success(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let details = resp.text().await.ok().filter(|t| !t.trim().is_empty());
        warn!(status = status.as_u16(), what, "remote call failed");
        Err(ApiError::Remote {
            status: status.as_u16(),
            message: format!("failed to {what}"),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_rejected_before_any_request() {
        let api = TodoApi::new(ApiConfig::default()).unwrap();
        let draft = TodoDraft::new("   ");

        // No server is running; a network attempt would be Transport.
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = rt.block_on(api.create(&draft)).unwrap_err();
        assert!(matches!(err, ApiError::EmptyTitle));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = TodoApi::new(ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        assert_eq!(api.base_url, "http://localhost:8000");
    }
}
