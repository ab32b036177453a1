//! Resolution results and annotation kinds.

use std::fmt;

/// Kind of an annotation recorded while processing a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown trigger that does not look like a bare domain.
    InvalidTrigger {
        /// Close known triggers, best first.
        suggestions: Vec<String>,
    },
    /// Neither link text nor search terms.
    EmptyInput,
    /// The provider produced no URL.
    NoResults,
    /// Link validation rejected the URL.
    NotFound,
    /// The validator could not decide; the link was kept.
    LinkValidation,
    /// A definition search changed the spelling of its terms.
    Spelling,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTrigger { suggestions } if suggestions.is_empty() => {
                f.write_str("Invalid search")
            }
            Self::InvalidTrigger { suggestions } => {
                let list = suggestions
                    .iter()
                    .map(|s| format!("!{s}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Invalid search, did you mean {list}?")
            }
            Self::EmptyInput => f.write_str("No input"),
            Self::NoResults => f.write_str("No results"),
            Self::NotFound => f.write_str("Not found"),
            Self::LinkValidation => f.write_str("Link validation"),
            Self::Spelling => f.write_str("Spelling"),
        }
    }
}

/// A side annotation produced while resolving a directive that still succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub kind: ErrorKind,
    pub message: String,
}

impl Note {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// How a resolved result is substituted into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    /// A link rendered in the configured output form.
    Normal,
    /// Raw markup (the title) substituted without link syntax.
    Embed,
    /// Replacement text substituted without link syntax.
    SpellingCorrection,
    /// Resolution failed; the directive is left unchanged.
    Failure(ErrorKind),
}

/// Outcome of resolving one directive.
///
/// On failure `url` is empty and `title` carries the failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub link_text: String,
    pub kind: ResultKind,
    /// Render the title even when titles are not included by default.
    pub force_title: bool,
    /// Annotations to record alongside the substitution.
    pub notes: Vec<Note>,
}

impl SearchResult {
    #[must_use]
    pub fn link(url: impl Into<String>, title: impl Into<String>, link_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            link_text: link_text.into(),
            kind: ResultKind::Normal,
            force_title: false,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>, link_text: impl Into<String>) -> Self {
        Self {
            url: String::new(),
            title: message.into(),
            link_text: link_text.into(),
            kind: ResultKind::Failure(kind),
            force_title: false,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, ResultKind::Failure(_))
    }

    /// Text substituted when the output has no link wrapper.
    #[must_use]
    pub fn bare_text(&self) -> &str {
        match self.kind {
            ResultKind::Embed => &self.title,
            _ => &self.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invalid_trigger_label() {
        let kind = ErrorKind::InvalidTrigger {
            suggestions: vec!["g".to_owned(), "gh".to_owned()],
        };
        assert_eq!(kind.to_string(), "Invalid search, did you mean !g, !gh?");
        assert_eq!(
            ErrorKind::InvalidTrigger {
                suggestions: Vec::new()
            }
            .to_string(),
            "Invalid search"
        );
    }

    #[test]
    fn test_bare_text() {
        let mut result = SearchResult::link("embed", "<iframe></iframe>", "x");
        assert_eq!(result.bare_text(), "embed");
        result.kind = ResultKind::Embed;
        assert_eq!(result.bare_text(), "<iframe></iframe>");
    }

    #[test]
    fn test_failure_carries_message() {
        let result = SearchResult::failure(ErrorKind::NoResults, "rust book", "");
        assert!(result.is_failure());
        assert_eq!(result.title, "rust book");
        assert!(result.url.is_empty());
    }
}
