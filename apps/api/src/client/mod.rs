//! HTTP client for a remote tagline service.
//!
//! Speaks the same contract this API serves at `POST /api/generate-tagline`.
//! Single attempt per call: no retries, no idempotency key. A 400 response
//! keeps the server's message; every other failure is reported as transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::tagline::service::{TaglineError, TaglineService};
use crate::tagline::validation::TaglineRequest;

const GENERATE_PATH: &str = "/api/generate-tagline";

#[derive(Debug, Deserialize)]
struct TaglineBody {
    tagline: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    missing: Vec<String>,
}

#[derive(Clone)]
pub struct HttpTaglineClient {
    http: Client,
    endpoint: String,
}

impl HttpTaglineClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TaglineService for HttpTaglineClient {
    async fn generate(&self, request: &TaglineRequest) -> Result<String, TaglineError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TaglineError::Timeout
                } else {
                    TaglineError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: TaglineBody = response
                .json()
                .await
                .map_err(|e| TaglineError::Transport(format!("invalid response body: {e}")))?;
            debug!("remote tagline received");
            return Ok(body.tagline);
        }

        let text = response.text().await.unwrap_or_default();
        warn!("tagline service returned {status}: {text}");

        if status == StatusCode::BAD_REQUEST {
            if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
                return Err(TaglineError::Rejected {
                    message: body.error,
                    missing: body.missing,
                });
            }
        }

        Err(TaglineError::Transport(format!("status {status}")))
    }
}
