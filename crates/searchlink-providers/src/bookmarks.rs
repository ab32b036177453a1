//! Browser bookmark search.
//!
//! Chromium-family browsers (Chrome, Edge, Brave, Arc) keep bookmarks in a
//! JSON file, which is searched directly. Safari and Firefox bookmarks and
//! all history stores are databases this provider does not read; they are
//! reported as unavailable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use searchlink_config::{Browser, HistoryStore, HistoryType};
use searchlink_engine::score::{matches_all, score};
use searchlink_engine::{Hit, ProviderError, SearchKind, SearchProvider, SearchRequest};
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;

/// Bookmark file locations per browser, macOS first.
fn candidate_paths(browser: Browser) -> &'static [&'static str] {
    match browser {
        Browser::Chrome => &[
            "~/Library/Application Support/Google/Chrome/Default/Bookmarks",
            "~/.config/google-chrome/Default/Bookmarks",
            "~/.config/chromium/Default/Bookmarks",
        ],
        Browser::Edge => &[
            "~/Library/Application Support/Microsoft Edge/Default/Bookmarks",
            "~/.config/microsoft-edge/Default/Bookmarks",
        ],
        Browser::Brave => &[
            "~/Library/Application Support/BraveSoftware/Brave-Browser/Default/Bookmarks",
            "~/.config/BraveSoftware/Brave-Browser/Default/Bookmarks",
        ],
        Browser::Arc => &["~/Library/Application Support/Arc/User Data/Default/Bookmarks"],
        Browser::Safari | Browser::Firefox => &[],
    }
}

#[derive(Debug, Deserialize)]
struct BookmarkFile {
    #[serde(default)]
    roots: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Node {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    date_added: String,
    #[serde(default)]
    children: Vec<Node>,
}

/// A bookmarked page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserBookmark {
    pub url: String,
    pub title: String,
    /// Microseconds since 1601, as Chromium stores it.
    pub added: u64,
}

fn collect(node: Node, out: &mut Vec<BrowserBookmark>) {
    if node.kind == "url" {
        out.push(BrowserBookmark {
            added: node.date_added.parse().unwrap_or(0),
            url: node.url,
            title: node.name,
        });
    }
    for child in node.children {
        collect(child, out);
    }
}

/// Every bookmark in a Chromium `Bookmarks` file.
pub fn parse_bookmarks(json: &str) -> Result<Vec<BrowserBookmark>, serde_json::Error> {
    let file: BookmarkFile = serde_json::from_str(json)?;
    let mut out = Vec::new();
    for root in file.roots.into_values() {
        if let Ok(node) = serde_json::from_value::<Node>(root) {
            collect(node, &mut out);
        }
    }
    Ok(out)
}

/// Best bookmark whose title or URL contains every term.
///
/// Ranked by score against the title and URL, then by most recently added.
#[must_use]
pub fn best_bookmark<'a>(bookmarks: &'a [BrowserBookmark], terms: &str) -> Option<&'a BrowserBookmark> {
    bookmarks
        .iter()
        .filter_map(|bookmark| {
            let text = format!("{} {}", bookmark.title, bookmark.url);
            matches_all(&text, terms).then(|| (score(&text, terms), bookmark))
        })
        .max_by(|(a_score, a), (b_score, b)| a_score.total_cmp(b_score).then(a.added.cmp(&b.added)))
        .map(|(_, bookmark)| bookmark)
}

fn source_label(source: HistoryType) -> String {
    let store = match source.store() {
        HistoryStore::Bookmarks => "bookmarks",
        HistoryStore::History => "history",
    };
    format!("{} {store}", source.browser().label())
}

/// Provider for the `h` triggers.
#[derive(Debug, Clone, Default)]
pub struct BrowserBookmarks {
    overrides: BTreeMap<Browser, PathBuf>,
}

impl BrowserBookmarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `browser`'s bookmarks from `path` instead of its default location.
    #[must_use]
    pub fn with_bookmark_file(mut self, browser: Browser, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(browser, path.into());
        self
    }

    fn bookmark_file(&self, browser: Browser) -> Option<PathBuf> {
        if let Some(path) = self.overrides.get(&browser) {
            return Some(path.clone());
        }
        candidate_paths(browser)
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
            .find(|path| path.is_file())
    }

    fn search_file(path: &Path, terms: &str) -> Result<Option<BrowserBookmark>, FetchError> {
        let bookmarks = parse_bookmarks(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), count = bookmarks.len(), "searching bookmarks");
        Ok(best_bookmark(&bookmarks, terms).cloned())
    }
}

impl SearchProvider for BrowserBookmarks {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let sources = match request.kind {
            SearchKind::History(types) if !types.is_empty() => types.as_slice(),
            _ => request.config.history_types.as_slice(),
        };

        let mut unavailable = Vec::new();
        for &source in sources {
            let file = match source.store() {
                HistoryStore::Bookmarks => self.bookmark_file(source.browser()),
                HistoryStore::History => None,
            };
            let Some(path) = file else {
                unavailable.push(source_label(source));
                continue;
            };
            if let Some(found) = Self::search_file(&path, request.terms)? {
                return Ok(Some(Hit::link(found.url, found.title)));
            }
        }

        if !sources.is_empty() && unavailable.len() == sources.len() {
            return Err(ProviderError::Unavailable(unavailable.join(", ")));
        }
        Ok(None)
    }
}
