//! Wikipedia article lookup.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use searchlink_engine::{Hit, ProviderError, SearchProvider, SearchRequest};
use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpClient, encode};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";

const SEARCH_URL: &str = "https://en.wikipedia.org/wiki/Special:Search";

static WG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""wgTitle":"(.*?)""#).unwrap());

static CANONICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link rel="canonical" href="(.*?)""#).unwrap());

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<Query>,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    fullurl: Option<String>,
    missing: Option<serde_json::Value>,
}

/// Article URL and title from a MediaWiki `prop=info` query.
///
/// Missing pages (negative page ids) are skipped.
pub fn parse_query(body: &str) -> Result<Option<(String, String)>, serde_json::Error> {
    let response: QueryResponse = serde_json::from_str(body)?;
    Ok(response.query.and_then(|query| {
        query
            .pages
            .into_values()
            .filter(|page| page.missing.is_none())
            .find_map(|page| page.fullurl.map(|url| (url, page.title)))
    }))
}

/// Article URL and title scraped from a search results redirect page.
#[must_use]
pub fn scrape_article(body: &str) -> Option<(String, String)> {
    let title = WG_TITLE_RE.captures(body)?[1].to_owned();
    let url = CANONICAL_RE.captures(body)?[1].to_owned();
    Some((url, title))
}

/// Wikipedia provider for `wiki`.
///
/// Tries an exact title lookup through the API, then the site search, which
/// redirects to the best matching article.
#[derive(Debug, Clone)]
pub struct Wikipedia {
    http: Arc<HttpClient>,
}

impl Wikipedia {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

impl SearchProvider for Wikipedia {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let terms = encode(request.terms);

        let api = format!("{API_URL}?action=query&format=json&prop=info&inprop=url&redirects=1&titles={terms}");
        let body = self.http.get_text(&api)?;
        if let Some((url, title)) = parse_query(&body).map_err(ProviderError::backend)? {
            return Ok(Some(Hit::link(url, title)));
        }

        debug!(terms = request.terms, "no exact article, using site search");
        let body = self.http.get_text(&format!("{SEARCH_URL}?search={terms}&go=Go"))?;
        Ok(scrape_article(&body).map(|(url, title)| Hit::link(url, title)))
    }
}
