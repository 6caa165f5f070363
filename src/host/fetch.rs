//! JSON documents over HTTP for the `fetch_json` global.
//!
//! The host holds an `Arc<dyn JsonFetcher>`. [`HttpFetcher`] is the default;
//! tests inject a canned fetcher instead. Fetching blocks the script thread
//! for up to the configured timeout, and no update fires meanwhile.

use std::thread;
use std::time::Duration;

use crate::error::FetchError;
use crate::logging::targets;

/// Source of JSON documents keyed by URL.
pub trait JsonFetcher: Send + Sync {
    fn fetch_json(&self, url: &str, timeout: Duration) -> Result<serde_json::Value, FetchError>;
}

/// Plain HTTP(S) GET through reqwest's blocking client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    fn get(url: &str, timeout: Duration) -> Result<serde_json::Value, FetchError> {
        let request_failed = |err: reqwest::Error| FetchError::Request { url: url.to_string(), message: err.to_string() };

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(request_failed)?;
        let response = client.get(url).send().map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        response
            .json::<serde_json::Value>()
            .map_err(|err| FetchError::Decode { url: url.to_string(), message: err.to_string() })
    }
}

impl JsonFetcher for HttpFetcher {
    fn fetch_json(&self, url: &str, timeout: Duration) -> Result<serde_json::Value, FetchError> {
        tracing::info!(target: targets::FETCH, %url, ?timeout, "fetching JSON");
        // The blocking client runs its own runtime and refuses to start on a
        // thread that is already inside one, as the script thread is.
        let result = thread::scope(|scope| scope.spawn(|| Self::get(url, timeout)).join()).unwrap_or_else(|_| {
            Err(FetchError::Request { url: url.to_string(), message: "fetch thread panicked".into() })
        });
        if let Err(err) = &result {
            tracing::warn!(target: targets::FETCH, %url, %err, "fetch failed");
        }
        result
    }
}
