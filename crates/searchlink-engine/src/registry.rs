//! Trigger registry.
//!
//! Built-in triggers are a fixed table mapping each trigger to a
//! [`SearchKind`]. Providers are registered per trigger; history and bookmark
//! triggers (`h`, `hsb`, `hcbh`, ...) are recognised by a small grammar rather
//! than enumerated. User shortcuts from `custom_site_searches` extend the
//! trigger set and shadow built-ins of the same name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use searchlink_config::{Browser, HistoryStore, HistoryType};

use crate::provider::SearchProvider;
use crate::score::{one_edit_apart, score_with};

/// Trigger used when a directive names none.
pub const DEFAULT_TRIGGER: &str = "g";

/// Trigger whose terms are the URL itself.
pub const REPLACE_TRIGGER: &str = "r";

/// Minimum score for a trigger to be suggested.
const SUGGESTION_THRESHOLD: f64 = 8.0;

/// Sites searched by the site-restricted web triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Amazon,
    YouTube,
}

impl Site {
    #[must_use]
    pub fn domain(self) -> &'static str {
        match self {
            Self::Amazon => "amazon.com",
            Self::YouTube => "youtube.com",
        }
    }
}

/// Social networks with handle links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Social {
    Twitter,
    Facebook,
    Instagram,
    LinkedIn,
    Mastodon,
}

impl Social {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::LinkedIn => "LinkedIn",
            Self::Mastodon => "Mastodon",
        }
    }

    /// Network for a letter in `@t`-style triggers.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            't' => Some(Self::Twitter),
            'f' => Some(Self::Facebook),
            'i' => Some(Self::Instagram),
            'l' => Some(Self::LinkedIn),
            'm' => Some(Self::Mastodon),
            _ => None,
        }
    }
}

/// iTunes Search API entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Itunes {
    IosApp { developer: bool },
    MacApp { developer: bool },
    Movie,
    Podcast,
    Song,
    Artist,
    Album,
}

/// Apple Music search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppleMusic {
    Any,
    Artist,
    Album,
    Song,
    Podcast,
}

/// The Movie Database search types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tmdb {
    /// Movies, shows and people together.
    Multi,
    Person,
    Movie,
    Tv,
}

impl Tmdb {
    /// Search API path segment.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Multi => "multi",
            Self::Person => "person",
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

/// Last.fm search entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LastFm {
    Track,
    Artist,
    Album,
}

impl LastFm {
    /// Method prefix and query parameter name.
    #[must_use]
    pub fn entity(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::Album => "album",
        }
    }
}

/// What a trigger searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKind {
    /// First web search result.
    Web,
    /// First web search result restricted to a site.
    SiteWeb(Site),
    /// Instant answer lookup.
    ZeroClick,
    Wikipedia,
    /// Dictionary definition; the title is always rendered.
    Definition,
    /// Software home pages, skipping download mirrors.
    Software,
    SocialHandle(Social),
    Itunes(Itunes),
    AppleMusic { target: AppleMusic, embed: bool },
    Tmdb(Tmdb),
    LastFm(LastFm),
    GitHub,
    Gist { embed: bool },
    Spelling,
    Pinboard,
    /// Browser history and bookmarks; empty means the configured sources.
    History(Vec<HistoryType>),
    /// The terms are the URL.
    Replace,
}

impl SearchKind {
    /// Whether results are always rendered with their title.
    #[must_use]
    pub fn forces_title(&self) -> bool {
        matches!(self, Self::Definition)
    }
}

/// A built-in trigger.
struct Builtin {
    trigger: &'static str,
    description: &'static str,
    kind: SearchKind,
}

const fn builtin(trigger: &'static str, description: &'static str, kind: SearchKind) -> Builtin {
    Builtin {
        trigger,
        description,
        kind,
    }
}

static BUILTINS: [Builtin; 56] = [
    builtin("a", "Amazon", SearchKind::SiteWeb(Site::Amazon)),
    builtin("g", "Web search (first result)", SearchKind::Web),
    builtin("ddg", "DuckDuckGo", SearchKind::Web),
    builtin("b", "Web search (first result)", SearchKind::Web),
    builtin("yt", "YouTube", SearchKind::SiteWeb(Site::YouTube)),
    builtin("z", "DDG Zero-Click Search", SearchKind::ZeroClick),
    builtin("zero", "DDG Zero-Click Search", SearchKind::ZeroClick),
    builtin("wiki", "Wikipedia", SearchKind::Wikipedia),
    builtin("def", "Dictionary definition", SearchKind::Definition),
    builtin("s", "Software search", SearchKind::Software),
    builtin("@t", "Twitter user link", SearchKind::SocialHandle(Social::Twitter)),
    builtin("@f", "Facebook user link", SearchKind::SocialHandle(Social::Facebook)),
    builtin("@i", "Instagram user link", SearchKind::SocialHandle(Social::Instagram)),
    builtin("@l", "LinkedIn user link", SearchKind::SocialHandle(Social::LinkedIn)),
    builtin("@m", "Mastodon user link", SearchKind::SocialHandle(Social::Mastodon)),
    builtin(
        "am",
        "Apple Music",
        SearchKind::AppleMusic {
            target: AppleMusic::Any,
            embed: false,
        },
    ),
    builtin(
        "amart",
        "Apple Music Artist",
        SearchKind::AppleMusic {
            target: AppleMusic::Artist,
            embed: false,
        },
    ),
    builtin(
        "amalb",
        "Apple Music Album",
        SearchKind::AppleMusic {
            target: AppleMusic::Album,
            embed: false,
        },
    ),
    builtin(
        "amsong",
        "Apple Music Song",
        SearchKind::AppleMusic {
            target: AppleMusic::Song,
            embed: false,
        },
    ),
    builtin(
        "ampod",
        "Apple Music Podcast",
        SearchKind::AppleMusic {
            target: AppleMusic::Podcast,
            embed: false,
        },
    ),
    builtin(
        "amarte",
        "Apple Music Artist (embed)",
        SearchKind::AppleMusic {
            target: AppleMusic::Artist,
            embed: true,
        },
    ),
    builtin(
        "amalbe",
        "Apple Music Album (embed)",
        SearchKind::AppleMusic {
            target: AppleMusic::Album,
            embed: true,
        },
    ),
    builtin(
        "amsonge",
        "Apple Music Song (embed)",
        SearchKind::AppleMusic {
            target: AppleMusic::Song,
            embed: true,
        },
    ),
    builtin(
        "ampode",
        "Apple Music Podcast (embed)",
        SearchKind::AppleMusic {
            target: AppleMusic::Podcast,
            embed: true,
        },
    ),
    builtin("ipod", "iTunes podcast", SearchKind::Itunes(Itunes::Podcast)),
    builtin("isong", "iTunes song", SearchKind::Itunes(Itunes::Song)),
    builtin("iart", "iTunes artist", SearchKind::Itunes(Itunes::Artist)),
    builtin("ialb", "iTunes album", SearchKind::Itunes(Itunes::Album)),
    builtin(
        "mas",
        "Mac App Store",
        SearchKind::Itunes(Itunes::MacApp { developer: false }),
    ),
    builtin(
        "masd",
        "Mac App Store developer link",
        SearchKind::Itunes(Itunes::MacApp { developer: true }),
    ),
    builtin(
        "itu",
        "iTunes App Store",
        SearchKind::Itunes(Itunes::IosApp { developer: false }),
    ),
    builtin(
        "itud",
        "iTunes App Store developer link",
        SearchKind::Itunes(Itunes::IosApp { developer: true }),
    ),
    builtin("imov", "iTunes Movies", SearchKind::Itunes(Itunes::Movie)),
    builtin("ipode", "iTunes podcast embed", SearchKind::Itunes(Itunes::Podcast)),
    builtin("isonge", "iTunes song embed", SearchKind::Itunes(Itunes::Song)),
    builtin("iarte", "iTunes artist embed", SearchKind::Itunes(Itunes::Artist)),
    builtin("ialbe", "iTunes album embed", SearchKind::Itunes(Itunes::Album)),
    builtin("tmdb", "The Movie Database search", SearchKind::Tmdb(Tmdb::Multi)),
    builtin("tmdba", "The Movie Database actor search", SearchKind::Tmdb(Tmdb::Person)),
    builtin("tmdbm", "The Movie Database movie search", SearchKind::Tmdb(Tmdb::Movie)),
    builtin("tmdbt", "The Movie Database TV search", SearchKind::Tmdb(Tmdb::Tv)),
    builtin("lsong", "Last.fm track", SearchKind::LastFm(LastFm::Track)),
    builtin("lsonge", "Last.fm track embed", SearchKind::LastFm(LastFm::Track)),
    builtin("lart", "Last.fm artist", SearchKind::LastFm(LastFm::Artist)),
    builtin("larte", "Last.fm artist embed", SearchKind::LastFm(LastFm::Artist)),
    builtin("lalb", "Last.fm album", SearchKind::LastFm(LastFm::Album)),
    builtin("lalbe", "Last.fm album embed", SearchKind::LastFm(LastFm::Album)),
    builtin("lpod", "Last.fm podcast", SearchKind::Web),
    builtin("lpode", "Last.fm podcast embed", SearchKind::Web),
    builtin("gh", "GitHub user/repo link", SearchKind::GitHub),
    builtin("gist", "Gist search", SearchKind::Gist { embed: false }),
    builtin("giste", "Gist embed", SearchKind::Gist { embed: true }),
    builtin("sp", "Spelling", SearchKind::Spelling),
    builtin("spell", "Spelling", SearchKind::Spelling),
    builtin("pb", "Pinboard", SearchKind::Pinboard),
    builtin("r", "Plain replacement (terms are the URL)", SearchKind::Replace),
];

/// History grammar forms listed by [`Registry::describe_all`].
const HISTORY_DESCRIPTIONS: [(&str, &str); 7] = [
    ("h", "Browser history and bookmarks (configured sources)"),
    ("hs[hb]", "Safari [history, bookmarks]"),
    ("hc[hb]", "Chrome [history, bookmarks]"),
    ("hf[hb]", "Firefox [history, bookmarks]"),
    ("he[hb]", "Edge [history, bookmarks]"),
    ("hb[hb]", "Brave [history, bookmarks]"),
    ("ha[hb]", "Arc [history, bookmarks]"),
];

/// Parse a history trigger (`h` followed by browser letters with optional
/// `h`/`b` suffixes).
///
/// A suffix of only `h` selects history, only `b` selects bookmarks, and an
/// empty or mixed suffix selects both. Returns an empty list for bare `h`
/// (the configured sources) and `None` when the token is not a history
/// trigger.
#[must_use]
pub fn parse_history_trigger(token: &str) -> Option<Vec<HistoryType>> {
    let rest = token.strip_prefix('h')?;
    let mut chars = rest.chars().peekable();
    let mut types = Vec::new();

    while let Some(letter) = chars.next() {
        let browser = Browser::from_letter(letter)?;
        let mut history = false;
        let mut bookmarks = false;
        while let Some(&next) = chars.peek() {
            match next {
                'h' => history = true,
                'b' => bookmarks = true,
                _ => break,
            }
            chars.next();
        }
        let stores: &[HistoryStore] = match (history, bookmarks) {
            (true, false) => &[HistoryStore::History],
            (false, true) => &[HistoryStore::Bookmarks],
            _ => &[HistoryStore::Bookmarks, HistoryStore::History],
        };
        for store in stores {
            let source = HistoryType::new(browser, *store);
            if !types.contains(&source) {
                types.push(source);
            }
        }
    }
    Some(types)
}

/// Result of looking up a trigger.
pub enum Resolution<'a> {
    /// A user shortcut with its configured value.
    Custom(&'a str),
    /// A built-in search, with its provider when one is registered.
    Builtin {
        kind: SearchKind,
        provider: Option<&'a dyn SearchProvider>,
    },
}

/// Maps triggers to search kinds and providers.
#[derive(Default)]
pub struct Registry {
    providers: HashMap<String, Arc<dyn SearchProvider>>,
    history: Option<Arc<dyn SearchProvider>>,
    custom: BTreeMap<String, String>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut triggers: Vec<&String> = self.providers.keys().collect();
        triggers.sort();
        f.debug_struct("Registry")
            .field("providers", &triggers)
            .field("history", &self.history.is_some())
            .field("custom", &self.custom)
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for a built-in trigger.
    ///
    /// Unknown triggers are ignored with a warning.
    pub fn register(&mut self, trigger: &str, provider: Arc<dyn SearchProvider>) {
        if builtin_entry(trigger).is_none() {
            tracing::warn!(trigger, "Ignoring provider for unknown trigger");
            return;
        }
        self.providers.insert(trigger.to_owned(), provider);
    }

    /// Register one provider for several triggers.
    pub fn register_many(&mut self, triggers: &[&str], provider: &Arc<dyn SearchProvider>) {
        for trigger in triggers {
            self.register(trigger, Arc::clone(provider));
        }
    }

    /// Register the provider for history and bookmark triggers.
    pub fn register_history(&mut self, provider: Arc<dyn SearchProvider>) {
        self.history = Some(provider);
    }

    /// Replace the user shortcuts.
    pub fn set_custom_searches(&mut self, custom: &BTreeMap<String, String>) {
        self.custom.clone_from(custom);
    }

    /// Whether `token` is a known trigger.
    #[must_use]
    pub fn is_valid_trigger(&self, token: &str) -> bool {
        self.custom.contains_key(token)
            || builtin_entry(token).is_some()
            || parse_history_trigger(token).is_some()
    }

    /// Look up a trigger.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<Resolution<'_>> {
        if let Some(value) = self.custom.get(token) {
            return Some(Resolution::Custom(value));
        }
        let (kind, provider) = self.resolve_builtin(token)?;
        Some(Resolution::Builtin { kind, provider })
    }

    /// Look up a trigger, ignoring user shortcuts.
    #[must_use]
    pub fn resolve_builtin(&self, token: &str) -> Option<(SearchKind, Option<&dyn SearchProvider>)> {
        if let Some(types) = parse_history_trigger(token) {
            return Some((SearchKind::History(types), self.history.as_deref()));
        }
        let entry = builtin_entry(token)?;
        Some((entry.kind.clone(), self.providers.get(token).map(AsRef::as_ref)))
    }

    /// The provider registered for the default web search.
    #[must_use]
    pub fn default_provider(&self) -> Option<&dyn SearchProvider> {
        self.providers.get(DEFAULT_TRIGGER).map(AsRef::as_ref)
    }

    /// Every trigger with a description, built-ins first.
    #[must_use]
    pub fn describe_all(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = BUILTINS
            .iter()
            .map(|entry| (entry.trigger.to_owned(), entry.description.to_owned()))
            .collect();
        out.extend(
            HISTORY_DESCRIPTIONS
                .iter()
                .map(|(trigger, description)| ((*trigger).to_owned(), (*description).to_owned())),
        );
        out.extend(
            self.custom
                .iter()
                .map(|(trigger, value)| (trigger.clone(), format!("Custom: {value}"))),
        );
        out
    }

    /// Known triggers close to `token`, best first.
    ///
    /// Candidates containing the token score highest; candidates one edit
    /// away follow.
    #[must_use]
    pub fn suggestions(&self, token: &str) -> Vec<String> {
        let candidates = self.candidate_names();

        let mut scored: Vec<(f64, &String)> = candidates
            .iter()
            .map(|name| (score_with(name, token, false), name))
            .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut out: Vec<String> = Vec::new();
        for (_, name) in scored {
            if name != token && !out.contains(name) {
                out.push(name.clone());
            }
        }
        if token.chars().count() >= 2 {
            for name in &candidates {
                if one_edit_apart(name, token) && !out.contains(name) {
                    out.push(name.clone());
                }
            }
        }
        out
    }

    /// Trigger names offered as suggestions.
    fn candidate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTINS
            .iter()
            .map(|entry| entry.trigger.to_owned())
            .collect();
        names.push("h".to_owned());
        for browser in ['s', 'c', 'f', 'e', 'b', 'a'] {
            for suffix in ["", "h", "b"] {
                names.push(format!("h{browser}{suffix}"));
            }
        }
        names.extend(self.custom.keys().cloned());
        names
    }
}

fn builtin_entry(trigger: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|entry| entry.trigger == trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Hit, ProviderError, SearchRequest};
    use pretty_assertions::assert_eq;

    fn stub(_request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        Ok(Some(Hit::link("https://example.org", "Example")))
    }

    #[test]
    fn test_builtin_triggers_are_valid() {
        let registry = Registry::new();
        for trigger in ["g", "a", "gh", "wiki", "@t", "amsonge", "r", "spell"] {
            assert!(registry.is_valid_trigger(trigger), "{trigger}");
        }
        assert!(!registry.is_valid_trigger("zzz"));
        assert!(!registry.is_valid_trigger(""));
    }

    #[test]
    fn test_media_triggers_resolve() {
        let registry = Registry::new();
        let cases = [
            ("tmdb", SearchKind::Tmdb(Tmdb::Multi)),
            ("tmdba", SearchKind::Tmdb(Tmdb::Person)),
            ("tmdbm", SearchKind::Tmdb(Tmdb::Movie)),
            ("tmdbt", SearchKind::Tmdb(Tmdb::Tv)),
            ("lsong", SearchKind::LastFm(LastFm::Track)),
            ("lsonge", SearchKind::LastFm(LastFm::Track)),
            ("lart", SearchKind::LastFm(LastFm::Artist)),
            ("lalbe", SearchKind::LastFm(LastFm::Album)),
            ("lpod", SearchKind::Web),
            ("isonge", SearchKind::Itunes(Itunes::Song)),
            ("iarte", SearchKind::Itunes(Itunes::Artist)),
            ("ialbe", SearchKind::Itunes(Itunes::Album)),
            ("ipode", SearchKind::Itunes(Itunes::Podcast)),
        ];
        for (trigger, expected) in cases {
            assert!(registry.is_valid_trigger(trigger), "{trigger}");
            match registry.resolve(trigger) {
                Some(Resolution::Builtin { kind, .. }) => assert_eq!(kind, expected, "{trigger}"),
                _ => panic!("{trigger} did not resolve to a built-in"),
            }
        }
        assert_eq!(Tmdb::Person.endpoint(), "person");
        assert_eq!(LastFm::Album.entity(), "album");
    }

    #[test]
    fn test_history_grammar() {
        assert_eq!(parse_history_trigger("h"), Some(Vec::new()));
        assert_eq!(
            parse_history_trigger("hsh"),
            Some(vec![HistoryType::SafariHistory])
        );
        assert_eq!(
            parse_history_trigger("hcb"),
            Some(vec![HistoryType::ChromeBookmarks])
        );
        assert_eq!(
            parse_history_trigger("hscbh"),
            Some(vec![
                HistoryType::SafariBookmarks,
                HistoryType::SafariHistory,
                HistoryType::ChromeBookmarks,
                HistoryType::ChromeHistory,
            ])
        );
        assert_eq!(
            parse_history_trigger("hb"),
            Some(vec![HistoryType::BraveBookmarks, HistoryType::BraveHistory])
        );
        assert_eq!(parse_history_trigger("hx"), None);
        assert_eq!(parse_history_trigger("hh"), None);
        assert_eq!(parse_history_trigger("g"), None);
    }

    #[test]
    fn test_resolve_builtin_with_provider() {
        let mut registry = Registry::new();
        registry.register("g", Arc::new(stub));

        match registry.resolve("g") {
            Some(Resolution::Builtin { kind, provider }) => {
                assert_eq!(kind, SearchKind::Web);
                assert!(provider.is_some());
            }
            _ => panic!("expected builtin"),
        }
        match registry.resolve("wiki") {
            Some(Resolution::Builtin { kind, provider }) => {
                assert_eq!(kind, SearchKind::Wikipedia);
                assert!(provider.is_none());
            }
            _ => panic!("expected builtin"),
        }
        assert!(registry.resolve("nope").is_none());
    }

    #[test]
    fn test_register_unknown_trigger_is_ignored() {
        let mut registry = Registry::new();
        registry.register("nope", Arc::new(stub));
        assert!(!registry.is_valid_trigger("nope"));
    }

    #[test]
    fn test_custom_shadows_builtin() {
        let mut registry = Registry::new();
        let mut custom = BTreeMap::new();
        custom.insert("a".to_owned(), "example.com".to_owned());
        custom.insert("bt".to_owned(), "brettterpstra.com".to_owned());
        registry.set_custom_searches(&custom);

        assert!(matches!(
            registry.resolve("a"),
            Some(Resolution::Custom("example.com"))
        ));
        assert!(registry.is_valid_trigger("bt"));
        assert!(
            registry
                .describe_all()
                .contains(&("bt".to_owned(), "Custom: brettterpstra.com".to_owned()))
        );
    }

    #[test]
    fn test_history_resolution_uses_history_provider() {
        let mut registry = Registry::new();
        registry.register_history(Arc::new(stub));
        match registry.resolve("hcb") {
            Some(Resolution::Builtin {
                kind: SearchKind::History(types),
                provider,
            }) => {
                assert_eq!(types, vec![HistoryType::ChromeBookmarks]);
                assert!(provider.is_some());
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_suggestions_for_unrelated_token_are_empty() {
        let registry = Registry::new();
        assert!(registry.suggestions("zzz").is_empty());
    }

    #[test]
    fn test_suggestions_include_one_edit_neighbours() {
        let registry = Registry::new();
        let suggestions = registry.suggestions("gh");
        assert!(suggestions.contains(&"g".to_owned()), "{suggestions:?}");
        assert!(!suggestions.contains(&"gh".to_owned()));
    }

    #[test]
    fn test_suggestions_rank_containing_candidates_first() {
        let registry = Registry::new();
        let suggestions = registry.suggestions("wik");
        assert_eq!(suggestions.first().map(String::as_str), Some("wiki"));
    }

    #[test]
    fn test_describe_all_lists_builtins_first() {
        let registry = Registry::new();
        let all = registry.describe_all();
        assert_eq!(all[0], ("a".to_owned(), "Amazon".to_owned()));
        assert!(all.iter().any(|(trigger, _)| trigger == "ha[hb]"));
    }
}
