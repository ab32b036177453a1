//! Search providers for SearchLink.
//!
//! Adapters implementing the engine's [`SearchProvider`], [`LinkValidator`]
//! and [`TitleFetcher`] traits over HTTP services and local files:
//!
//! - Web search, instant answers and definitions via DuckDuckGo
//! - Wikipedia, iTunes and Apple Music, GitHub and gists
//! - The Movie Database and Last.fm
//! - Social profile links, `aspell` spelling, Pinboard, browser bookmarks
//!
//! All network providers share one [`HttpClient`].
//!
//! [`SearchProvider`]: searchlink_engine::SearchProvider
//! [`LinkValidator`]: searchlink_engine::LinkValidator
//! [`TitleFetcher`]: searchlink_engine::TitleFetcher

mod bookmarks;
mod error;
mod github;
mod http;
mod itunes;
mod lastfm;
mod pinboard;
mod social;
mod spelling;
mod titles;
mod tmdb;
mod validate;
mod web;
mod wiki;
mod zero_click;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use searchlink_engine::{LinkValidator, Registry, SearchProvider, TitleFetcher};
use tracing::debug;

pub use bookmarks::{BrowserBookmark, BrowserBookmarks, best_bookmark, parse_bookmarks};
pub use error::FetchError;
pub use github::{GistTarget, GitHub, gist_embed, gist_file_name, parse_gist_terms, repository_url};
pub use http::{DEFAULT_TIMEOUT, HttpClient, encode};
pub use itunes::{Item, ItunesSearch, MusicResult, SearchResponse, entity, itunes_link, media_entity, to_apple_music};
pub use lastfm::{LastFmItem, LastFmResponse, LastFmSearch, lastfm_link};
pub use pinboard::{
    Bookmark, DEFAULT_CACHE_PATH, Pinboard, PinboardCache, best_match, exact_terms, load_cache, save_cache,
};
pub use social::{SocialProfiles, profile, render_template};
pub use spelling::{Aspell, Spelling, apply_corrections, locate_aspell, suggestion};
pub use titles::{HttpTitles, extract_title, host_title};
pub use tmdb::{TmdbItem, TmdbResponse, TmdbSearch, tmdb_link};
pub use validate::{HttpValidator, classify_status};
pub use web::{WebSearch, affiliatize, parse_redirect, software_query};
pub use wiki::{Wikipedia, parse_query, scrape_article};
pub use zero_click::{Definition, InstantAnswer, ZeroClick, wordnik_definition};

/// Triggers answered by first-result web search.
const WEB_TRIGGERS: &[&str] = &["g", "ddg", "b", "a", "yt", "s", "lpod", "lpode"];

const SOCIAL_TRIGGERS: &[&str] = &["@t", "@f", "@i", "@l", "@m"];

const ITUNES_TRIGGERS: &[&str] = &[
    "am", "amart", "amalb", "amsong", "ampod", "amarte", "amalbe", "amsonge", "ampode", "ipod", "isong", "iart",
    "ialb", "mas", "masd", "itu", "itud", "imov", "ipode", "isonge", "iarte", "ialbe",
];

const TMDB_TRIGGERS: &[&str] = &["tmdb", "tmdba", "tmdbm", "tmdbt"];

const LASTFM_TRIGGERS: &[&str] = &["lsong", "lsonge", "lart", "larte", "lalb", "lalbe"];

/// The standard provider set, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct Providers {
    http: Arc<HttpClient>,
    aspell: Option<Aspell>,
    pinboard_cache: PathBuf,
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT))
    }
}

impl Providers {
    /// Providers with the given HTTP timeout, `aspell` from its usual
    /// location and the Pinboard cache at `~/.searchlink_cache`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let aspell = Aspell::locate();
        debug!(aspell = ?aspell.as_ref().map(Aspell::program), "providers");
        Self {
            http: Arc::new(HttpClient::new(timeout)),
            aspell,
            pinboard_cache: PathBuf::from(shellexpand::tilde(DEFAULT_CACHE_PATH).into_owned()),
        }
    }

    #[must_use]
    pub fn with_pinboard_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.pinboard_cache = path.into();
        self
    }

    #[must_use]
    pub fn with_aspell(mut self, aspell: Option<Aspell>) -> Self {
        self.aspell = aspell;
        self
    }

    /// Register a provider for every built-in trigger.
    pub fn register(&self, registry: &mut Registry) {
        let http = &self.http;

        let web: Arc<dyn SearchProvider> = Arc::new(WebSearch::new(Arc::clone(http)));
        registry.register_many(WEB_TRIGGERS, &web);

        let zero_click: Arc<dyn SearchProvider> = Arc::new(ZeroClick::new(Arc::clone(http)));
        registry.register_many(&["z", "zero"], &zero_click);

        registry.register("def", Arc::new(Definition::new(Arc::clone(http), self.aspell.clone())));
        registry.register("wiki", Arc::new(Wikipedia::new(Arc::clone(http))));

        let social: Arc<dyn SearchProvider> = Arc::new(SocialProfiles);
        registry.register_many(SOCIAL_TRIGGERS, &social);

        let itunes: Arc<dyn SearchProvider> = Arc::new(ItunesSearch::new(Arc::clone(http)));
        registry.register_many(ITUNES_TRIGGERS, &itunes);

        let tmdb: Arc<dyn SearchProvider> = Arc::new(TmdbSearch::new(Arc::clone(http)));
        registry.register_many(TMDB_TRIGGERS, &tmdb);

        let lastfm: Arc<dyn SearchProvider> = Arc::new(LastFmSearch::new(Arc::clone(http)));
        registry.register_many(LASTFM_TRIGGERS, &lastfm);

        let github: Arc<dyn SearchProvider> = Arc::new(GitHub::new(Arc::clone(http)));
        registry.register_many(&["gh", "gist", "giste"], &github);

        let spelling: Arc<dyn SearchProvider> = Arc::new(Spelling::new(self.aspell.clone()));
        registry.register_many(&["sp", "spell"], &spelling);

        registry.register(
            "pb",
            Arc::new(Pinboard::new(Arc::clone(http), self.pinboard_cache.clone())),
        );
        registry.register_history(Arc::new(BrowserBookmarks::new()));
    }

    /// A registry with every provider registered.
    #[must_use]
    pub fn registry(&self) -> Registry {
        let mut registry = Registry::new();
        self.register(&mut registry);
        registry
    }

    #[must_use]
    pub fn validator(&self) -> Arc<dyn LinkValidator> {
        Arc::new(HttpValidator::new(Arc::clone(&self.http)))
    }

    #[must_use]
    pub fn title_fetcher(&self) -> Arc<dyn TitleFetcher> {
        Arc::new(HttpTitles::new(Arc::clone(&self.http)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchlink_engine::{Resolution, SearchKind};

    #[test]
    fn test_every_builtin_has_a_provider() {
        let registry = Providers::default().with_aspell(None).registry();
        let missing: Vec<String> = registry
            .describe_all()
            .into_iter()
            .map(|(trigger, _)| trigger)
            .filter(|trigger| trigger != "r")
            .filter(|trigger| match registry.resolve(trigger) {
                Some(Resolution::Builtin { provider, .. }) => provider.is_none(),
                _ => false,
            })
            .collect();
        assert_eq!(missing, Vec::<String>::new());
    }

    #[test]
    fn test_media_triggers_have_a_provider() {
        let registry = Providers::default().with_aspell(None).registry();
        for trigger in ["tmdb", "tmdbt", "lsong", "lalbe", "lpod", "isonge", "ipode"] {
            match registry.resolve(trigger) {
                Some(Resolution::Builtin { provider, .. }) => assert!(provider.is_some(), "{trigger}"),
                _ => panic!("{trigger} did not resolve to a built-in"),
            }
        }
    }

    #[test]
    fn test_history_triggers_have_a_provider() {
        let registry = Providers::default().registry();
        match registry.resolve("hcb") {
            Some(Resolution::Builtin { kind, provider }) => {
                assert!(matches!(kind, SearchKind::History(_)));
                assert!(provider.is_some());
            }
            _ => panic!("history trigger did not resolve to a built-in"),
        }
    }
}
