//! First-result web search through DuckDuckGo.
//!
//! The lite endpoint answers a `\`-prefixed query with a redirect to the
//! first result, so no result page is parsed.

use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;
use searchlink_engine::{Hit, ProviderError, SearchKind, SearchProvider, SearchRequest, Site};
use tracing::debug;

use crate::error::FetchError;
use crate::http::{HttpClient, encode};

const FIRST_RESULT_URL: &str = "https://lite.duckduckgo.com/lite/?q=%5C";

/// Sites skipped by software searches.
const DOWNLOAD_MIRRORS: &[&str] = &[
    "apple.com",
    "postmates.com",
    "download.cnet.com",
    "softpedia.com",
    "softonic.com",
    "macupdate.com",
];

static UDDG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]uddg=([^&]+)").unwrap());

static AMAZON_PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:.*?)amazon\.com/(?:(.*?)/)?([dg])p/([^?]+)").unwrap()
});

/// Target URL from a first-result redirect.
///
/// DuckDuckGo may route through its `/l/?uddg=` tracker; the real target is
/// the decoded `uddg` parameter.
#[must_use]
pub fn parse_redirect(location: &str) -> Option<String> {
    let target = match UDDG_RE.captures(location) {
        Some(caps) => percent_decode_str(&caps[1]).decode_utf8_lossy().into_owned(),
        None => location.to_owned(),
    };
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        Some(target.to_owned())
    } else {
        None
    }
}

/// Software search query: home pages, not download mirrors.
#[must_use]
pub fn software_query(terms: &str) -> String {
    let exclusions: Vec<String> = DOWNLOAD_MIRRORS
        .iter()
        .map(|site| format!("-site:{site}"))
        .collect();
    format!("{} {terms} app", exclusions.join(" "))
}

/// Rewrite an Amazon product URL with a partner tag.
///
/// Returns the tagged URL and the product slug, or `None` when the URL is
/// not a product page.
#[must_use]
pub fn affiliatize(url: &str, partner: &str) -> Option<(String, Option<String>)> {
    let caps = AMAZON_PRODUCT_RE.captures(url)?;
    let slug = caps
        .get(1)
        .map(|m| m.as_str().replace('-', " "))
        .filter(|slug| !slug.is_empty());
    let tagged = format!(
        "http://www.amazon.com/{}p/product/{}/ref=as_li_ss_tl?ie=UTF8&linkCode=ll1&tag={partner}",
        &caps[2], &caps[3]
    );
    Some((tagged, slug))
}

/// Web search provider for `g`, `ddg`, `b`, `a`, `yt`, `s` and the Last.fm
/// podcast triggers.
#[derive(Debug, Clone)]
pub struct WebSearch {
    http: Arc<HttpClient>,
}

impl WebSearch {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// URL of the first result for `query`.
    pub fn first_result(&self, query: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{FIRST_RESULT_URL}{}", encode(query));
        let location = self.http.redirect_location(&url)?;
        let result = location.as_deref().and_then(parse_redirect);
        debug!(query, result = ?result, "first result");
        Ok(result)
    }

    /// First result restricted to `site`.
    pub fn site_result(&self, site: &str, terms: &str) -> Result<Option<String>, FetchError> {
        self.first_result(&format!("site:{site} {terms}"))
    }
}

impl SearchProvider for WebSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let terms = request.terms;
        match request.kind {
            SearchKind::SiteWeb(Site::Amazon) => {
                let Some(url) = self.site_result(Site::Amazon.domain(), terms)? else {
                    return Ok(None);
                };
                let partner = request.config.amazon_partner.as_str();
                if partner.is_empty() {
                    return Ok(Some(Hit::untitled(url)));
                }
                Ok(Some(match affiliatize(&url, partner) {
                    Some((tagged, Some(slug))) => Hit::link(tagged, slug),
                    Some((tagged, None)) => Hit::untitled(tagged),
                    None => Hit::untitled(url),
                }))
            }
            SearchKind::SiteWeb(site) => {
                Ok(self.site_result(site.domain(), terms)?.map(Hit::untitled))
            }
            SearchKind::Software => Ok(self.first_result(&software_query(terms))?.map(Hit::untitled)),
            _ => Ok(self.first_result(terms)?.map(Hit::untitled)),
        }
    }
}
