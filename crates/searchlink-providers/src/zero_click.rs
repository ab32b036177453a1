//! DuckDuckGo instant answers and dictionary definitions.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use searchlink_engine::{ErrorKind, Hit, Note, ProviderError, SearchProvider, SearchRequest};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::{HttpClient, encode};
use crate::spelling::Aspell;
use crate::web::WebSearch;

const INSTANT_ANSWER_URL: &str = "https://api.duckduckgo.com/";

const WORDNIK_URL: &str = "https://www.wordnik.com/words/";

static FIRST_DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)id="define".*?<li>(.*?)</li>"#).unwrap());

static PART_OF_SPEECH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)<abbr title="partOfSpeech">(.*?)</abbr>\s*(.*?)$"#).unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]*>").unwrap());

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Instant answer API response, reduced to the fields used.
#[derive(Debug, Default, Deserialize)]
pub struct InstantAnswer {
    #[serde(default, rename = "AbstractURL")]
    pub abstract_url: String,
    #[serde(default, rename = "Redirect")]
    pub redirect: String,
    #[serde(default, rename = "Heading")]
    pub heading: String,
}

impl InstantAnswer {
    /// The answer's link and heading, when both are present.
    #[must_use]
    pub fn link(&self) -> Option<(&str, &str)> {
        let url = if self.abstract_url.is_empty() {
            &self.redirect
        } else {
            &self.abstract_url
        };
        (!url.is_empty() && !self.heading.is_empty()).then_some((url.as_str(), self.heading.as_str()))
    }
}

fn instant_answer_url(query: &str) -> String {
    format!(
        "{INSTANT_ANSWER_URL}?q={}&format=json&no_redirect=1&no_html=1&skip_disambig=1",
        encode(query)
    )
}

/// `(part of speech) definition` from a Wordnik word page.
#[must_use]
pub fn wordnik_definition(body: &str) -> Option<String> {
    let item = FIRST_DEFINITION_RE.captures(body)?;
    let parts = PART_OF_SPEECH_RE.captures(&item[1])?;
    let text = format!("({}) {}", &parts[1], &parts[2]);
    let text = TAG_RE.replace_all(&text, "");
    Some(SPACES_RE.replace_all(&text, " ").trim().to_owned())
}

/// Instant answer provider for `z` and `zero`, falling back to web search.
#[derive(Debug, Clone)]
pub struct ZeroClick {
    http: Arc<HttpClient>,
    web: WebSearch,
}

impl ZeroClick {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        let web = WebSearch::new(Arc::clone(&http));
        Self { http, web }
    }
}

impl SearchProvider for ZeroClick {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let answer: InstantAnswer = self.http.get_json(&instant_answer_url(request.terms))?;
        if let Some((url, heading)) = answer.link() {
            return Ok(Some(Hit::link(url, heading)));
        }
        debug!(terms = request.terms, "no instant answer, using web search");
        Ok(self.web.first_result(request.terms)?.map(Hit::untitled))
    }
}

/// Dictionary definition provider for `def`.
///
/// Terms are spell-checked first when `aspell` is installed.
#[derive(Debug, Clone)]
pub struct Definition {
    http: Arc<HttpClient>,
    aspell: Option<Aspell>,
}

impl Definition {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, aspell: Option<Aspell>) -> Self {
        Self { http, aspell }
    }

    fn define(&self, terms: &str) -> Result<Option<Hit>, ProviderError> {
        let answer: InstantAnswer = self.http.get_json(&instant_answer_url(&format!("!def {terms}")))?;
        if !answer.redirect.is_empty() {
            return Ok(Some(Hit::link(answer.redirect, terms)));
        }

        let url = format!("{WORDNIK_URL}{}", encode(terms));
        let body = self.http.get_text(&url)?;
        Ok(wordnik_definition(&body).map(|title| Hit::link(url, title)))
    }
}

impl SearchProvider for Definition {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let mut terms = request.terms.to_owned();
        let mut note = None;

        if let Some(aspell) = &self.aspell {
            let fix = aspell.correct(&terms).unwrap_or_else(|err| {
                warn!(error = %err, "spell check failed");
                terms.clone()
            });
            if fix.to_lowercase() != terms.to_lowercase() {
                info!(from = %terms, to = %fix, "spelling altered");
                note = Some(Note::new(
                    ErrorKind::Spelling,
                    format!("Spelling altered for '{terms}' to '{fix}'"),
                ));
                terms = fix;
            }
        }

        let Some(hit) = self.define(&terms)? else {
            return Ok(None);
        };
        Ok(Some(match note {
            Some(note) => hit.with_link_text(terms).with_note(note),
            None => hit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instant_answer_prefers_abstract() {
        let answer: InstantAnswer = serde_json::from_str(
            r#"{"AbstractURL":"https://en.wikipedia.org/wiki/Rust","Redirect":"","Heading":"Rust","Extra":1}"#,
        )
        .unwrap();
        assert_eq!(answer.link(), Some(("https://en.wikipedia.org/wiki/Rust", "Rust")));
    }

    #[test]
    fn test_instant_answer_uses_redirect() {
        let answer: InstantAnswer =
            serde_json::from_str(r#"{"AbstractURL":"","Redirect":"https://x.example","Heading":"X"}"#).unwrap();
        assert_eq!(answer.link(), Some(("https://x.example", "X")));
    }

    #[test]
    fn test_instant_answer_requires_heading() {
        let answer: InstantAnswer =
            serde_json::from_str(r#"{"AbstractURL":"https://x.example","Heading":""}"#).unwrap();
        assert_eq!(answer.link(), None);
        assert_eq!(InstantAnswer::default().link(), None);
    }

    #[test]
    fn test_instant_answer_url_escapes_query() {
        assert_eq!(
            instant_answer_url("!def ferrous"),
            "https://api.duckduckgo.com/?q=%21def%20ferrous&format=json&no_redirect=1&no_html=1&skip_disambig=1"
        );
    }

    #[test]
    fn test_wordnik_definition() {
        let body = r#"<div id="define"><ul>
<li><abbr title="partOfSpeech">adj.</abbr> Of, relating to, or containing <i>iron</i>.
</li></ul></div>"#;
        assert_eq!(
            wordnik_definition(body),
            Some("(adj.) Of, relating to, or containing iron.".to_owned())
        );
        assert_eq!(wordnik_definition("<html></html>"), None);
    }
}
