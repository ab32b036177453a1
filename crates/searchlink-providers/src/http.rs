//! Shared blocking HTTP client.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;

use crate::error::FetchError;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 15;

/// Redirects followed when checking a link.
const VALIDATION_REDIRECTS: u32 = 5;

const USER_AGENT: &str = concat!("SearchLink/", env!("CARGO_PKG_VERSION"));

/// Characters escaped in query parameters: everything but `A-Za-z0-9-_.~`.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a query parameter value.
#[must_use]
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY).to_string()
}

/// Blocking HTTP client used by every network provider.
///
/// Holds one agent that follows redirects and one that does not, for
/// endpoints whose answer is the redirect itself.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
    manual_redirects: Agent,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .max_redirects(VALIDATION_REDIRECTS)
            .max_redirects_will_error(false)
            .build()
            .into();

        let manual_redirects = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build()
            .into();

        Self {
            agent,
            manual_redirects,
        }
    }

    /// GET a page body.
    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let response = self.agent.get(url).header("User-Agent", USER_AGENT).call()?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::HttpResponse {
                status,
                url: url.to_owned(),
            });
        }
        Ok(response.into_body().read_to_string()?)
    }

    /// GET and decode a JSON document.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_text(url)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET without following redirects and return the `Location` header.
    pub fn redirect_location(&self, url: &str) -> Result<Option<String>, FetchError> {
        debug!(url, "GET (no redirects)");
        let response = self
            .manual_redirects
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()?;

        Ok(response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_owned()))
    }

    /// HEAD a URL, following up to five redirects, and return the final status.
    ///
    /// A redirect status means the limit was reached.
    pub fn head_status(&self, url: &str) -> Result<u16, FetchError> {
        debug!(url, "HEAD");
        let response = self.agent.head(url).header("User-Agent", USER_AGENT).call()?;
        Ok(response.status().as_u16())
    }
}
