//! Capability traits implemented by search adapters.
//!
//! The engine never performs I/O itself. Search providers, the link validator
//! and the title fetcher are trait objects supplied by the caller; the
//! `searchlink-providers` crate contains the HTTP and filesystem adapters.

use searchlink_config::Config;

use crate::registry::SearchKind;
use crate::result::Note;

/// Error returned by a provider.
///
/// Every provider error is converted into a failed result at the dispatcher
/// boundary; none escapes a run.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The terms are not acceptable to this provider (message is user-facing).
    #[error("{0}")]
    InvalidInput(String),
    /// A required local resource or tool is missing.
    #[error("{0} is not available")]
    Unavailable(String),
    /// Transport, parsing or I/O failure inside the adapter.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Wrap an adapter error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// A search handed to a provider.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Trigger as written (`g`, `amsonge`, `hcb`).
    pub trigger: &'a str,
    pub kind: &'a SearchKind,
    pub terms: &'a str,
    /// Link text from the directive, possibly empty.
    pub link_text: &'a str,
    /// Effective configuration for the directive.
    pub config: &'a Config,
}

/// How a hit is substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitKind {
    #[default]
    Link,
    /// The title is markup substituted as is.
    Embed,
    /// The URL is replacement text substituted as is.
    Spelling,
}

/// A provider's answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hit {
    pub url: String,
    pub title: Option<String>,
    /// Overrides the directive's link text.
    pub link_text: Option<String>,
    pub kind: HitKind,
    pub notes: Vec<Note>,
}

impl Hit {
    /// A link with a title.
    #[must_use]
    pub fn link(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// A link whose title is unknown.
    #[must_use]
    pub fn untitled(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Markup substituted in place of the directive.
    #[must_use]
    pub fn embed(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(markup.into()),
            kind: HitKind::Embed,
            ..Self::default()
        }
    }

    /// Corrected text substituted in place of the directive.
    #[must_use]
    pub fn spelling(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            url: text.clone(),
            title: Some(text),
            kind: HitKind::Spelling,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_link_text(mut self, link_text: impl Into<String>) -> Self {
        self.link_text = Some(link_text.into());
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

/// Resolves searches for one or more triggers.
pub trait SearchProvider: Send + Sync {
    /// Run a search.
    ///
    /// Returns `Ok(None)` when the search produced nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the search could not be performed.
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError>;
}

impl<F> SearchProvider for F
where
    F: Fn(&SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> + Send + Sync,
{
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        self(request)
    }
}

/// Outcome of checking that a URL resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid,
    /// The server refused to answer; treated as valid.
    Blocked(String),
    /// The check itself failed; treated as valid.
    Unknown(String),
}

/// Checks that links resolve.
pub trait LinkValidator: Send + Sync {
    fn validate(&self, url: &str) -> Validation;
}

/// Fetches page titles.
pub trait TitleFetcher: Send + Sync {
    /// Title of the page at `url`, if one can be determined.
    fn fetch_title(&self, url: &str) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn echo(request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        Ok(Some(Hit::untitled(format!("https://example.org/{}", request.terms))))
    }

    #[test]
    fn test_function_is_a_provider() {
        let provider = echo;
        let config = Config::default();
        let request = SearchRequest {
            trigger: "g",
            kind: &SearchKind::Web,
            terms: "x",
            link_text: "",
            config: &config,
        };
        let hit = provider.search(&request).unwrap().unwrap();
        assert_eq!(hit.url, "https://example.org/x");
        assert_eq!(hit.title, None);
    }

    #[test]
    fn test_spelling_hit() {
        let hit = Hit::spelling("receive");
        assert_eq!(hit.url, "receive");
        assert_eq!(hit.kind, HitKind::Spelling);
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err = ProviderError::backend(std::io::Error::other("connection reset"));
        assert_eq!(err.to_string(), "connection reset");
    }
}
