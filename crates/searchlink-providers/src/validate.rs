//! Link validation by HTTP HEAD.

use std::sync::Arc;

use searchlink_engine::{LinkValidator, Validation};
use tracing::debug;

use crate::http::HttpClient;

/// Hosts that refuse HEAD requests routinely; a refusal is not worth a note.
const QUIET_HOSTS: &[&str] = &["amazon.com"];

/// Validation outcome for a final HEAD status.
#[must_use]
pub fn classify_status(url: &str, status: u16) -> Validation {
    match status {
        200..=299 => Validation::Valid,
        405 | 503 if QUIET_HOSTS.iter().any(|quiet| host(url).contains(quiet)) => Validation::Valid,
        405 | 503 => Validation::Blocked(format!("HTTP {status}")),
        _ => Validation::Invalid,
    }
}

fn host(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

/// Validator that HEADs each link.
#[derive(Debug, Clone)]
pub struct HttpValidator {
    http: Arc<HttpClient>,
}

impl HttpValidator {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

impl LinkValidator for HttpValidator {
    fn validate(&self, url: &str) -> Validation {
        // Relative links and anchors cannot be checked.
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Validation::Valid;
        }
        match self.http.head_status(url) {
            Ok(status) => {
                debug!(url, status, "validated");
                classify_status(url, status)
            }
            Err(err) => Validation::Unknown(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status("https://x.example", 200), Validation::Valid);
        assert_eq!(classify_status("https://x.example", 204), Validation::Valid);
        assert_eq!(classify_status("https://x.example", 404), Validation::Invalid);
        assert_eq!(classify_status("https://x.example", 500), Validation::Invalid);
        assert_eq!(
            classify_status("https://x.example", 405),
            Validation::Blocked("HTTP 405".to_owned())
        );
        assert_eq!(classify_status("https://www.amazon.com/dp/1", 503), Validation::Valid);
    }

    #[test]
    fn test_amazon_refusals_are_valid_without_note() {
        assert_eq!(classify_status("https://www.amazon.com/dp/B000", 405), Validation::Valid);
        assert_eq!(
            classify_status("https://shop.example/?ref=amazon.com", 405),
            Validation::Blocked("HTTP 405".to_owned())
        );
        assert_eq!(
            classify_status("https://shop.example/item", 503),
            Validation::Blocked("HTTP 503".to_owned())
        );
    }

    #[test]
    fn test_redirect_limit_is_invalid() {
        assert_eq!(classify_status("https://x.example", 302), Validation::Invalid);
    }

    #[test]
    fn test_relative_links_are_not_checked() {
        let validator = HttpValidator::new(Arc::new(HttpClient::default()));
        assert_eq!(validator.validate("#section"), Validation::Valid);
        assert_eq!(validator.validate("/docs/"), Validation::Valid);
    }
}
