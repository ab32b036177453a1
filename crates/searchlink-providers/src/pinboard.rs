//! Pinboard bookmark search with a local cache.
//!
//! All bookmarks are downloaded once and cached as JSON. The cache is
//! refreshed when Pinboard reports a newer update time than the cached one.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use searchlink_engine::score::{exact_match, matches_any, score};
use searchlink_engine::{Hit, ProviderError, SearchProvider, SearchRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::http::{HttpClient, encode};

const API_URL: &str = "https://api.pinboard.in/v1";

/// Default cache location.
pub const DEFAULT_CACHE_PATH: &str = "~/.searchlink_cache";

/// Score of an exact phrase match in title or tags; returned immediately.
const TITLE_EXACT_SCORE: f64 = 14.0;
/// Score of an exact phrase match anywhere, including the description.
const FULL_EXACT_SCORE: f64 = 13.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub href: String,
    /// Pinboard calls the title `description`.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extended: String,
    #[serde(default)]
    pub tags: String,
    /// ISO 8601 timestamp.
    #[serde(default)]
    pub time: String,
}

impl Bookmark {
    fn title_tags(&self) -> String {
        format!("{} {}", self.description, self.tags)
    }

    fn full_text(&self) -> String {
        format!("{} {} {}", self.description, self.extended, self.tags)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinboardCache {
    pub update_time: String,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    update_time: String,
}

/// Split a leading `'` off the terms: it asks for exact phrase matching.
#[must_use]
pub fn exact_terms(terms: &str) -> Option<String> {
    let rest = terms.trim_start().strip_prefix('\'')?;
    Some(rest.trim_start_matches('\'').trim_end().trim_end_matches('\'').trim().to_owned())
}

/// Best bookmark for `terms`.
///
/// In exact mode the first bookmark whose text contains the phrase wins.
/// Otherwise a phrase match in title or tags wins outright, then bookmarks
/// are ranked by score and, on ties, by recency.
#[must_use]
pub fn best_match<'a>(bookmarks: &'a [Bookmark], terms: &str) -> Option<&'a Bookmark> {
    if let Some(phrase) = exact_terms(terms) {
        return bookmarks.iter().find(|bm| exact_match(&bm.full_text(), &phrase));
    }

    let mut best: Option<(f64, &Bookmark)> = None;
    for bookmark in bookmarks {
        let full_text = bookmark.full_text();
        let points = if exact_match(&bookmark.title_tags(), terms) {
            TITLE_EXACT_SCORE
        } else if exact_match(&full_text, terms) {
            FULL_EXACT_SCORE
        } else if matches_any(&full_text, terms) {
            score(&full_text, terms)
        } else {
            0.0
        };

        if points >= TITLE_EXACT_SCORE {
            return Some(bookmark);
        }
        if points <= 0.0 {
            continue;
        }
        let better = best.is_none_or(|(top, current)| {
            points > top || ((points - top).abs() < f64::EPSILON && bookmark.time > current.time)
        });
        if better {
            best = Some((points, bookmark));
        }
    }
    best.map(|(_, bookmark)| bookmark)
}

/// Pinboard provider for `pb`.
#[derive(Debug, Clone)]
pub struct Pinboard {
    http: Arc<HttpClient>,
    cache_path: PathBuf,
}

impl Pinboard {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            http,
            cache_path: cache_path.into(),
        }
    }

    /// Provider using the cache at `~/.searchlink_cache`.
    #[must_use]
    pub fn with_default_cache(http: Arc<HttpClient>) -> Self {
        Self::new(http, shellexpand::tilde(DEFAULT_CACHE_PATH).into_owned())
    }

    fn bookmarks(&self, token: &str) -> Result<Vec<Bookmark>, FetchError> {
        let cached = load_cache(&self.cache_path);
        let update: UpdateResponse = self.http.get_json(&format!(
            "{API_URL}/posts/update?auth_token={}&format=json",
            encode(token)
        ))?;

        if let Some(cache) = cached
            && cache.update_time >= update.update_time
        {
            debug!(count = cache.bookmarks.len(), "using Pinboard cache");
            return Ok(cache.bookmarks);
        }

        info!("refreshing Pinboard cache");
        let bookmarks: Vec<Bookmark> = self.http.get_json(&format!(
            "{API_URL}/posts/all?auth_token={}&format=json",
            encode(token)
        ))?;
        let cache = PinboardCache {
            update_time: update.update_time,
            bookmarks,
        };
        if let Err(err) = save_cache(&self.cache_path, &cache) {
            warn!(path = %self.cache_path.display(), error = %err, "failed to write Pinboard cache");
        }
        Ok(cache.bookmarks)
    }
}

/// Read a cache file; unreadable or corrupt caches count as absent.
#[must_use]
pub fn load_cache(path: &Path) -> Option<PinboardCache> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(cache) => Some(cache),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring corrupt Pinboard cache");
            None
        }
    }
}

pub fn save_cache(path: &Path, cache: &PinboardCache) -> Result<(), FetchError> {
    fs::write(path, serde_json::to_vec(cache)?)?;
    Ok(())
}

impl SearchProvider for Pinboard {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let token = request.config.pinboard_api_key.as_str();
        if token.is_empty() {
            return Err(ProviderError::Unavailable("Pinboard API token".to_owned()));
        }
        let bookmarks = self.bookmarks(token)?;
        Ok(best_match(&bookmarks, request.terms)
            .map(|bookmark| Hit::link(bookmark.href.clone(), bookmark.description.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bookmark(href: &str, description: &str, extended: &str, tags: &str, time: &str) -> Bookmark {
        Bookmark {
            href: href.to_owned(),
            description: description.to_owned(),
            extended: extended.to_owned(),
            tags: tags.to_owned(),
            time: time.to_owned(),
        }
    }

    fn sample() -> Vec<Bookmark> {
        vec![
            bookmark("https://a.example", "Async Rust", "Futures explained", "rust async", "2023-01-01T00:00:00Z"),
            bookmark("https://b.example", "Cooking notes", "Slow cooker rust removal", "home", "2024-01-01T00:00:00Z"),
            bookmark("https://c.example", "Error handling", "thiserror and anyhow in Rust", "rust", "2022-01-01T00:00:00Z"),
            bookmark("https://d.example", "Error handling", "thiserror and anyhow in Rust", "rust", "2024-06-01T00:00:00Z"),
        ]
    }

    #[test]
    fn test_exact_terms() {
        assert_eq!(exact_terms("'slow cooker'"), Some("slow cooker".to_owned()));
        assert_eq!(exact_terms("  ''quoted"), Some("quoted".to_owned()));
        assert_eq!(exact_terms("plain"), None);
    }

    #[test]
    fn test_title_phrase_wins() {
        let bookmarks = sample();
        assert_eq!(best_match(&bookmarks, "async rust").unwrap().href, "https://a.example");
    }

    #[test]
    fn test_description_phrase_beats_partial() {
        let bookmarks = sample();
        assert_eq!(best_match(&bookmarks, "rust removal").unwrap().href, "https://b.example");
    }

    #[test]
    fn test_ties_prefer_recent() {
        let bookmarks = sample();
        assert_eq!(best_match(&bookmarks, "anyhow thiserror").unwrap().href, "https://d.example");
    }

    #[test]
    fn test_exact_mode() {
        let bookmarks = sample();
        assert_eq!(best_match(&bookmarks, "'futures explained").unwrap().href, "https://a.example");
        assert_eq!(best_match(&bookmarks, "'explained futures"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(best_match(&sample(), "kubernetes"), None);
    }

    #[test]
    fn test_cache_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        assert!(load_cache(&path).is_none());

        let cache = PinboardCache {
            update_time: "2024-06-01T00:00:00Z".to_owned(),
            bookmarks: sample(),
        };
        save_cache(&path, &cache).unwrap();
        let loaded = load_cache(&path).unwrap();
        assert_eq!(loaded.update_time, cache.update_time);
        assert_eq!(loaded.bookmarks, cache.bookmarks);

        fs::write(&path, "not json").unwrap();
        assert!(load_cache(&path).is_none());
    }
}
