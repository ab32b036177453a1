//! Page title lookup.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use searchlink_engine::TitleFetcher;
use tracing::warn;

use crate::http::HttpClient;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Title element text, with entities decoded and whitespace collapsed.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_RE.captures(html)?;
    let title = WHITESPACE_RE.replace_all(raw[1].trim(), " ");
    let title = decode_entities(&title);
    (!title.is_empty()).then_some(title)
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Title made from a URL's host when the page has none.
#[must_use]
pub fn host_title(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    host.replace('-', " ").trim().to_owned()
}

/// Fetches titles with a GET request.
#[derive(Debug, Clone)]
pub struct HttpTitles {
    http: Arc<HttpClient>,
}

impl HttpTitles {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

impl TitleFetcher for HttpTitles {
    fn fetch_title(&self, url: &str) -> Option<String> {
        let title = match self.http.get_text(url) {
            Ok(body) => extract_title(&body),
            Err(err) => {
                warn!(url, error = %err, "error retrieving title");
                None
            }
        };
        title.or_else(|| {
            warn!(url, "missing title");
            let fallback = host_title(url);
            (!fallback.is_empty()).then_some(fallback)
        })
    }
}
