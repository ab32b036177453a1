//! Browser history and bookmark sources.

use serde::Deserialize;

/// Browser whose local data can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Browser {
    Safari,
    Chrome,
    Firefox,
    Edge,
    Brave,
    Arc,
}

impl Browser {
    /// Letter used for the browser in `!h` triggers (`!hsb`, `!hc`).
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Self::Safari => 's',
            Self::Chrome => 'c',
            Self::Firefox => 'f',
            Self::Edge => 'e',
            Self::Brave => 'b',
            Self::Arc => 'a',
        }
    }

    /// Browser for a trigger letter.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            's' => Some(Self::Safari),
            'c' => Some(Self::Chrome),
            'f' => Some(Self::Firefox),
            'e' => Some(Self::Edge),
            'b' => Some(Self::Brave),
            'a' => Some(Self::Arc),
            _ => None,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Safari => "Safari",
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
            Self::Edge => "Edge",
            Self::Brave => "Brave",
            Self::Arc => "Arc",
        }
    }
}

/// Which store of a browser is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HistoryStore {
    History,
    Bookmarks,
}

/// A single searchable source, as listed in `history_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryType {
    SafariBookmarks,
    SafariHistory,
    ChromeBookmarks,
    ChromeHistory,
    FirefoxBookmarks,
    FirefoxHistory,
    EdgeBookmarks,
    EdgeHistory,
    BraveBookmarks,
    BraveHistory,
    ArcBookmarks,
    ArcHistory,
}

impl HistoryType {
    /// Combine a browser and a store.
    #[must_use]
    pub fn new(browser: Browser, store: HistoryStore) -> Self {
        use HistoryStore::{Bookmarks, History};
        match (browser, store) {
            (Browser::Safari, Bookmarks) => Self::SafariBookmarks,
            (Browser::Safari, History) => Self::SafariHistory,
            (Browser::Chrome, Bookmarks) => Self::ChromeBookmarks,
            (Browser::Chrome, History) => Self::ChromeHistory,
            (Browser::Firefox, Bookmarks) => Self::FirefoxBookmarks,
            (Browser::Firefox, History) => Self::FirefoxHistory,
            (Browser::Edge, Bookmarks) => Self::EdgeBookmarks,
            (Browser::Edge, History) => Self::EdgeHistory,
            (Browser::Brave, Bookmarks) => Self::BraveBookmarks,
            (Browser::Brave, History) => Self::BraveHistory,
            (Browser::Arc, Bookmarks) => Self::ArcBookmarks,
            (Browser::Arc, History) => Self::ArcHistory,
        }
    }

    #[must_use]
    pub fn browser(self) -> Browser {
        match self {
            Self::SafariBookmarks | Self::SafariHistory => Browser::Safari,
            Self::ChromeBookmarks | Self::ChromeHistory => Browser::Chrome,
            Self::FirefoxBookmarks | Self::FirefoxHistory => Browser::Firefox,
            Self::EdgeBookmarks | Self::EdgeHistory => Browser::Edge,
            Self::BraveBookmarks | Self::BraveHistory => Browser::Brave,
            Self::ArcBookmarks | Self::ArcHistory => Browser::Arc,
        }
    }

    #[must_use]
    pub fn store(self) -> HistoryStore {
        match self {
            Self::SafariBookmarks
            | Self::ChromeBookmarks
            | Self::FirefoxBookmarks
            | Self::EdgeBookmarks
            | Self::BraveBookmarks
            | Self::ArcBookmarks => HistoryStore::Bookmarks,
            _ => HistoryStore::History,
        }
    }
}

/// Default sources searched by a bare `!h`.
pub(crate) fn default_history_types() -> Vec<HistoryType> {
    vec![HistoryType::SafariBookmarks, HistoryType::SafariHistory]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_letters_round_trip() {
        for browser in [
            Browser::Safari,
            Browser::Chrome,
            Browser::Firefox,
            Browser::Edge,
            Browser::Brave,
            Browser::Arc,
        ] {
            assert_eq!(Browser::from_letter(browser.letter()), Some(browser));
        }
        assert_eq!(Browser::from_letter('x'), None);
    }

    #[test]
    fn test_history_type_parts() {
        let source = HistoryType::new(Browser::Brave, HistoryStore::Bookmarks);
        assert_eq!(source, HistoryType::BraveBookmarks);
        assert_eq!(source.browser(), Browser::Brave);
        assert_eq!(source.store(), HistoryStore::Bookmarks);
        assert_eq!(HistoryType::ArcHistory.store(), HistoryStore::History);
    }
}
