//! The Movie Database search for `tmdb`, `tmdba`, `tmdbm` and `tmdbt`.

use std::sync::Arc;

use searchlink_engine::{Hit, ProviderError, SearchKind, SearchProvider, SearchRequest, Tmdb};
use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpClient, encode};
use crate::web::WebSearch;

const API_URL: &str = "https://api.themoviedb.org/3/search";

const SITE_URL: &str = "https://www.themoviedb.org";

/// Site searched when no API key is configured or the API finds nothing.
const FALLBACK_SITE: &str = "imdb.com";

#[derive(Debug, Default, Deserialize)]
pub struct TmdbResponse {
    #[serde(default)]
    pub results: Vec<TmdbItem>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TmdbItem {
    pub id: u64,
    pub media_type: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
}

/// Page URL and title for the first result.
///
/// Multi searches take the page type from each result; typed searches use
/// the endpoint. People and shows carry `name`, movies carry `title`.
#[must_use]
pub fn tmdb_link(search: Tmdb, response: &TmdbResponse, terms: &str) -> Option<(String, String)> {
    let item = response.results.first()?;
    let media = match search {
        Tmdb::Multi => item.media_type.as_deref()?,
        typed => typed.endpoint(),
    };
    let title = item
        .name
        .as_deref()
        .or(item.title.as_deref())
        .unwrap_or(terms)
        .to_owned();
    Some((format!("{SITE_URL}/{media}/{}", item.id), title))
}

#[derive(Debug, Clone)]
pub struct TmdbSearch {
    http: Arc<HttpClient>,
    web: WebSearch,
}

impl TmdbSearch {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        let web = WebSearch::new(Arc::clone(&http));
        Self { http, web }
    }

    fn lookup(&self, search: Tmdb, terms: &str, key: &str) -> Result<Option<(String, String)>, ProviderError> {
        let url = format!(
            "{API_URL}/{}?query={}&api_key={}",
            search.endpoint(),
            encode(terms),
            encode(key)
        );
        let response: TmdbResponse = self.http.get_json(&url)?;
        Ok(tmdb_link(search, &response, terms))
    }
}

impl SearchProvider for TmdbSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let SearchKind::Tmdb(search) = request.kind else {
            return Ok(None);
        };
        let key = request.config.tmdb_api_key.as_str();
        let found = if key.is_empty() {
            None
        } else {
            self.lookup(*search, request.terms, key)?
        };

        match found {
            Some((url, title)) => {
                let hit = Hit::link(url, title.clone());
                Ok(Some(if request.link_text.is_empty() {
                    hit.with_link_text(title)
                } else {
                    hit
                }))
            }
            None => {
                debug!(terms = request.terms, "no TMDB result, searching IMDb");
                Ok(self.web.site_result(FALLBACK_SITE, request.terms)?.map(Hit::untitled))
            }
        }
    }
}
