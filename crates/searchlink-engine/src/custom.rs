//! User-defined search shortcuts (`custom_site_searches`).
//!
//! A shortcut value is either a site (`brettterpstra.com`), which turns the
//! search into `site:<value> <terms>` on the default web search, or a URL
//! template (`https://example.com/$term1/$term2s`), which becomes a plain
//! replacement with the terms substituted into it.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

use crate::registry::{DEFAULT_TRIGGER, REPLACE_TRIGGER};
use crate::scope::strip_flags;

/// Characters left unescaped in substituted terms: A-Z a-z 0-9 - . _ ~
const TERM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

static POSITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$term(\d+)([ds]?)").unwrap());

static WHOLE_TERMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$term([ds]?)").unwrap());

static SLUG_INVALID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

static DASH_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Search produced by expanding a shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub trigger: String,
    pub terms: String,
}

/// Lowercase, replace everything outside `[a-z0-9_]` with `-`, collapse dashes.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let dashed = SLUG_INVALID_RE.replace_all(&lower, "-");
    DASH_RUN_RE.replace_all(&dashed, "-").into_owned()
}

fn url_encode(text: &str) -> String {
    utf8_percent_encode(text, TERM_ENCODE_SET).to_string()
}

/// Apply a `d` (lowercase) or `s` (slug) transform.
fn transform(value: &str, suffix: &str) -> String {
    match suffix {
        "d" | "D" => value.to_lowercase(),
        "s" | "S" => slugify(value),
        _ => value.to_owned(),
    }
}

/// Whether a shortcut value is a URL template rather than a site.
fn is_template(value: &str) -> bool {
    value.starts_with('/')
        || value
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
}

/// Split `terms` across `slots` positions; the last slot takes the remainder.
fn fill_slots(terms: &str, slots: usize) -> Vec<String> {
    let words: Vec<&str> = terms.split_whitespace().collect();
    if slots == 0 {
        return Vec::new();
    }
    if words.len() > slots {
        let mut filled: Vec<String> = words[..slots - 1].iter().map(|w| (*w).to_owned()).collect();
        filled.push(words[slots - 1..].join(" "));
        filled
    } else {
        words.into_iter().map(str::to_owned).collect()
    }
}

/// Expand a shortcut value for `terms`.
///
/// Inline flags in the value are removed; applying them is up to the caller.
#[must_use]
pub fn expand(value: &str, terms: &str) -> Expansion {
    let (value, _) = strip_flags(value);
    let value = value.trim();

    if !is_template(value) {
        return Expansion {
            trigger: DEFAULT_TRIGGER.to_owned(),
            terms: format!("site:{value} {terms}"),
        };
    }

    let highest = POSITIONAL_RE
        .captures_iter(value)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .max();

    let expanded = if let Some(highest) = highest {
        let slots = fill_slots(terms, highest);
        POSITIONAL_RE
            .replace_all(value, |caps: &Captures<'_>| {
                let index = caps
                    .get(1)
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .unwrap_or(1);
                let slot = index
                    .checked_sub(1)
                    .and_then(|i| slots.get(i))
                    .map_or("", String::as_str);
                let suffix = caps.get(2).map_or("", |m| m.as_str());
                url_encode(&transform(slot, suffix))
            })
            .into_owned()
    } else {
        WHOLE_TERMS_RE
            .replace_all(value, |caps: &Captures<'_>| {
                let suffix = caps.get(1).map_or("", |m| m.as_str());
                url_encode(&transform(terms, suffix))
            })
            .into_owned()
    };

    Expansion {
        trigger: REPLACE_TRIGGER.to_owned(),
        terms: expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world-");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("a  --  b"), "a-b");
    }

    #[test]
    fn test_site_shortcut() {
        let expansion = expand("brettterpstra.com", "markdown tools");
        assert_eq!(
            expansion,
            Expansion {
                trigger: "g".to_owned(),
                terms: "site:brettterpstra.com markdown tools".to_owned(),
            }
        );
    }

    #[test]
    fn test_positional_template_with_remainder() {
        let expansion = expand("https://example.com/$term1d/$term2s", "Rust Ownership And Borrowing");
        assert_eq!(expansion.trigger, "r");
        assert_eq!(
            expansion.terms,
            "https://example.com/rust/ownership-and-borrowing"
        );
    }

    #[test]
    fn test_positional_template_encodes_values() {
        let expansion = expand("https://example.com/?a=$term1&b=$term2", "C++ two words");
        assert_eq!(expansion.terms, "https://example.com/?a=C%2B%2B&b=two%20words");
    }

    #[test]
    fn test_missing_positional_slot_is_empty() {
        let expansion = expand("/search/$term1/$term2", "only");
        assert_eq!(expansion.terms, "/search/only/");
    }

    #[test]
    fn test_whole_terms_token() {
        assert_eq!(
            expand("https://example.com/tag/$terms", "Static Site").terms,
            "https://example.com/tag/static-site"
        );
        assert_eq!(
            expand("https://example.com/?q=$term", "two words").terms,
            "https://example.com/?q=two%20words"
        );
        assert_eq!(
            expand("HTTPS://example.com/$termd", "MiXeD").terms,
            "HTTPS://example.com/mixed"
        );
    }

    #[test]
    fn test_template_flags_are_removed() {
        assert_eq!(
            expand("https://example.com/$term ++t", "x").terms,
            "https://example.com/x"
        );
    }
}
