// src/fetch/http.rs

use super::Query;
use crate::error::{Error, FetchError, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Blocking client for a Socrata resource. One attempt per call: a failed
/// request is reported, never retried.
#[derive(Debug, Clone)]
pub struct SocrataClient {
    client: Client,
}

impl SocrataClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("variantshare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// GET `endpoint` with the query's `$limit`/`$where` and return the body text.
    pub fn get_text(&self, endpoint: &Url, query: &Query) -> Result<String> {
        let url = query.url(endpoint);
        debug!(%url, "GET");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| classify(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "non-success response");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            }
            .into());
        }

        resp.text().map_err(|e| classify(&url, e).into())
    }
}

fn classify(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: err,
        }
    }
}
