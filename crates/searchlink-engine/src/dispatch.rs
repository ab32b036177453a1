//! Search dispatcher.
//!
//! Turns a trigger and search terms into a [`SearchResult`]: expands user
//! shortcuts, throttles outgoing calls, invokes the registered provider (or
//! the default web search), derives link text and validates the URL. Provider
//! errors stop here and become failed results.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use searchlink_config::Config;
use tracing::Level;

use crate::custom;
use crate::provider::{
    HitKind, LinkValidator, ProviderError, SearchProvider, SearchRequest, TitleFetcher, Validation,
};
use crate::registry::{DEFAULT_TRIGGER, Registry, Resolution, SearchKind};
use crate::result::{ErrorKind, Note, ResultKind, SearchResult};

/// Unknown triggers shaped like a domain become site searches.
static DOMAIN_TRIGGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+\.)+\w{2,}$").unwrap());

/// Default number of searches between pauses.
pub const DEFAULT_THROTTLE_EVERY: usize = 5;

/// Default pause length.
pub const DEFAULT_THROTTLE_DELAY: Duration = Duration::from_secs(1);

/// Log a progress event at `level`, which is info or debug.
macro_rules! progress {
    ($level:expr, $($arg:tt)+) => {
        if $level == Level::INFO {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Level for progress events: info when notifications are on.
#[must_use]
pub fn progress_level(config: &Config) -> Level {
    if config.notifications {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

/// Whether an unknown trigger looks like a bare domain (`example.com`).
#[must_use]
pub fn is_domain_trigger(token: &str) -> bool {
    DOMAIN_TRIGGER_RE.is_match(token)
}

/// A directive ready for resolution.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Trigger without `!`; `None` selects the default web search.
    pub trigger: Option<String>,
    pub terms: String,
    pub link_text: String,
    /// Use the page title as link text when the link text is empty.
    pub titleize: bool,
    /// Effective configuration for the directive.
    pub config: Config,
}

/// Resolves directives through the registry.
pub struct Dispatcher {
    registry: Registry,
    validator: Option<Arc<dyn LinkValidator>>,
    titles: Option<Arc<dyn TitleFetcher>>,
    throttle_every: usize,
    throttle_delay: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("validator", &self.validator.is_some())
            .field("titles", &self.titles.is_some())
            .field("throttle_every", &self.throttle_every)
            .field("throttle_delay", &self.throttle_delay)
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            validator: None,
            titles: None,
            throttle_every: DEFAULT_THROTTLE_EVERY,
            throttle_delay: DEFAULT_THROTTLE_DELAY,
        }
    }

    /// Set the link validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn LinkValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set the title fetcher.
    #[must_use]
    pub fn with_title_fetcher(mut self, titles: Arc<dyn TitleFetcher>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Pause for `delay` before every `every`-th search. Zero disables pauses.
    #[must_use]
    pub fn with_throttle(mut self, every: usize, delay: Duration) -> Self {
        self.throttle_every = every;
        self.throttle_delay = delay;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Resolve one directive.
    ///
    /// `invocation` is the 1-based number of this search within the run and
    /// drives throttling.
    #[must_use]
    pub fn resolve_directive(&self, request: &DispatchRequest, invocation: usize) -> SearchResult {
        if request.terms.trim().is_empty() {
            return SearchResult::failure(ErrorKind::EmptyInput, "", &request.link_text);
        }

        let level = progress_level(&request.config);
        self.throttle(invocation, level);

        let mut trigger = request
            .trigger
            .clone()
            .unwrap_or_else(|| DEFAULT_TRIGGER.to_owned());
        let mut terms = request.terms.clone();
        let mut link_text = request.link_text.clone();

        if let Some(Resolution::Custom(value)) = self.registry.resolve(&trigger) {
            if !request.titleize && link_text.is_empty() {
                link_text.clone_from(&terms);
            }
            let expansion = custom::expand(value, &terms);
            tracing::debug!(shortcut = %trigger, trigger = %expansion.trigger, terms = %expansion.terms, "Expanded shortcut");
            trigger = expansion.trigger;
            terms = expansion.terms;
        }

        progress!(level, trigger = %trigger, terms = %terms, "Searching");

        let (kind, provider) = match self.registry.resolve_builtin(&trigger) {
            Some((SearchKind::Replace, _)) => {
                return self.replace(&terms, link_text, &request.config);
            }
            Some((kind, Some(provider))) => (kind, Some(provider)),
            Some((kind, None)) => {
                tracing::warn!(trigger = %trigger, "No provider registered, using web search");
                (kind, self.registry.default_provider())
            }
            None => {
                if is_domain_trigger(&trigger) {
                    if link_text.is_empty() && !request.titleize {
                        link_text.clone_from(&terms);
                    }
                    terms = format!("site:{trigger} {terms}");
                }
                (SearchKind::Web, self.registry.default_provider())
            }
        };

        let Some(provider) = provider else {
            tracing::warn!(trigger = %trigger, "No web search provider registered");
            return SearchResult::failure(ErrorKind::NoResults, terms, link_text);
        };

        self.search(provider, &trigger, &kind, &terms, link_text, request)
    }

    fn search(
        &self,
        provider: &dyn SearchProvider,
        trigger: &str,
        kind: &SearchKind,
        terms: &str,
        mut link_text: String,
        request: &DispatchRequest,
    ) -> SearchResult {
        let search = SearchRequest {
            trigger,
            kind,
            terms,
            link_text: &link_text,
            config: &request.config,
        };

        let hit = match provider.search(&search) {
            Ok(Some(hit)) if !hit.url.is_empty() => hit,
            Ok(_) => return SearchResult::failure(ErrorKind::NoResults, terms, link_text),
            Err(ProviderError::InvalidInput(message)) => {
                return SearchResult::failure(ErrorKind::NoResults, message, link_text);
            }
            Err(err) => {
                tracing::warn!(trigger, error = %err, "Search failed");
                return SearchResult::failure(ErrorKind::NoResults, terms, link_text);
            }
        };

        let result_kind = match hit.kind {
            HitKind::Link => ResultKind::Normal,
            HitKind::Embed => ResultKind::Embed,
            HitKind::Spelling => ResultKind::SpellingCorrection,
        };

        let mut title = hit.title.unwrap_or_default();
        if let Some(text) = hit.link_text {
            link_text = text;
        }
        if result_kind == ResultKind::Normal
            && title.is_empty()
            && (request.titleize || request.config.include_titles)
        {
            title = self.fetch_title(&hit.url);
        }
        if link_text.is_empty() {
            link_text = if request.titleize {
                title.clone()
            } else {
                terms.to_owned()
            };
        }

        let mut notes = hit.notes;
        if request.config.validate_links && result_kind == ResultKind::Normal {
            match self.validate(&hit.url, progress_level(&request.config)) {
                Validation::Invalid => {
                    let mut failure = SearchResult::failure(ErrorKind::NotFound, hit.url, link_text);
                    failure.notes = notes;
                    return failure;
                }
                Validation::Blocked(reason) => notes.push(Note::new(
                    ErrorKind::LinkValidation,
                    format!("Validation blocked: {} ({reason})", hit.url),
                )),
                Validation::Unknown(reason) => notes.push(Note::new(
                    ErrorKind::LinkValidation,
                    format!("Possibly invalid => {} ({reason})", hit.url),
                )),
                Validation::Valid => {}
            }
        }

        SearchResult {
            url: hit.url,
            title,
            link_text,
            kind: result_kind,
            force_title: kind.forces_title(),
            notes,
        }
    }

    /// Plain replacement: the terms are the URL.
    fn replace(&self, url: &str, link_text: String, config: &Config) -> SearchResult {
        if config.validate_links && self.validate(url, progress_level(config)) == Validation::Invalid {
            return SearchResult::failure(ErrorKind::NotFound, format!("Link not valid: {url}"), link_text);
        }
        let link_text = if link_text.is_empty() {
            url.to_owned()
        } else {
            link_text
        };
        SearchResult::link(url, link_text.clone(), link_text)
    }

    fn validate(&self, url: &str, level: Level) -> Validation {
        match &self.validator {
            Some(validator) => {
                progress!(level, url, "Validating");
                validator.validate(url)
            }
            None => Validation::Valid,
        }
    }

    fn fetch_title(&self, url: &str) -> String {
        self.titles
            .as_ref()
            .and_then(|titles| titles.fetch_title(url))
            .unwrap_or_default()
    }

    fn throttle(&self, invocation: usize, level: Level) {
        if self.throttle_every == 0 || self.throttle_delay.is_zero() {
            return;
        }
        if invocation > 0 && invocation % self.throttle_every == 0 {
            progress!(level, delay_ms = self.throttle_delay.as_millis(), "Throttling");
            std::thread::sleep(self.throttle_delay);
        }
    }
}
