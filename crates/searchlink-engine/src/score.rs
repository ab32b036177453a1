//! Token-based fuzzy and exact text scoring.
//!
//! Shared by trigger suggestions and by providers that rank local candidates
//! (bookmarks, Pinboard). Terms are split on whitespace; each term becomes a
//! case-insensitive pattern with punctuation removed.

use regex::Regex;

/// Maximum score returned by [`score`].
pub const MAX_SCORE: f64 = 10.0;

/// Remove everything except ASCII letters, digits and spaces.
fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}

/// Build one pattern per whitespace-delimited term.
///
/// Terms that are empty after punctuation removal are skipped.
fn term_patterns(terms: &str, start_word: bool) -> Vec<Regex> {
    let bound = if start_word { r"\b" } else { "" };
    terms
        .split_whitespace()
        .map(|term| {
            term.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        })
        .filter(|term| !term.is_empty())
        .filter_map(|term| Regex::new(&format!("(?i){bound}{}", regex::escape(&term))).ok())
        .collect()
}

/// Fraction of `terms` found in `text`, scaled to [`MAX_SCORE`].
///
/// Each term must start at a word boundary.
#[must_use]
pub fn score(text: &str, terms: &str) -> f64 {
    score_with(text, terms, true)
}

/// Like [`score`], optionally matching terms anywhere inside words.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_with(text: &str, terms: &str, start_word: bool) -> f64 {
    let patterns = term_patterns(terms, start_word);
    if patterns.is_empty() {
        return 0.0;
    }
    let matched = patterns.iter().filter(|rx| rx.is_match(text)).count();
    (matched as f64 / patterns.len() as f64) * MAX_SCORE
}

/// Whether `terms` appear in `text`, in order, as one phrase.
///
/// Punctuation and case are ignored on both sides.
#[must_use]
pub fn exact_match(text: &str, terms: &str) -> bool {
    let stripped_terms = strip_punctuation(terms);
    let words: Vec<String> = stripped_terms
        .split_whitespace()
        .map(regex::escape)
        .collect();
    if words.is_empty() {
        return false;
    }
    let pattern = format!(r"(?i)\b{}", words.join(" +"));
    Regex::new(&pattern).is_ok_and(|rx| rx.is_match(&strip_punctuation(text)))
}

/// Whether any term matches the punctuation-stripped text.
#[must_use]
pub fn matches_any(text: &str, terms: &str) -> bool {
    let comp = strip_punctuation(text);
    term_patterns(terms, true).iter().any(|rx| rx.is_match(&comp))
}

/// Whether every term matches the punctuation-stripped text.
#[must_use]
pub fn matches_all(text: &str, terms: &str) -> bool {
    let comp = strip_punctuation(text);
    term_patterns(terms, true).iter().all(|rx| rx.is_match(&comp))
}

/// Whether no term matches the punctuation-stripped text.
#[must_use]
pub fn matches_none(text: &str, terms: &str) -> bool {
    !matches_any(text, terms)
}

/// Whether `a` and `b` differ by exactly one insertion, deletion or substitution.
pub(crate) fn one_edit_apart(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    match long.len() - short.len() {
        0 => short.iter().zip(long.iter()).filter(|(x, y)| x != y).count() == 1,
        1 => {
            let prefix = short
                .iter()
                .zip(long.iter())
                .take_while(|(x, y)| x == y)
                .count();
            short[prefix..] == long[prefix + 1..]
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_punctuation_and_case() {
        assert!(exact_match("Hello, World! (notes)", "hello world"));
    }

    #[test]
    fn test_exact_match_requires_order() {
        assert!(!exact_match("Hello, World!", "world hello"));
    }

    #[test]
    fn test_exact_match_requires_word_start() {
        assert!(!exact_match("Othello world", "hello world"));
    }

    #[test]
    fn test_exact_match_empty_terms() {
        assert!(!exact_match("anything", "  !! "));
    }

    #[test]
    fn test_score_half_of_terms() {
        let value = score("the quick brown fox", "quick dog");
        assert!((value - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_all_and_none() {
        assert!((score("The Quick Brown Fox", "quick fox") - MAX_SCORE).abs() < f64::EPSILON);
        assert!(score("the quick brown fox", "cat").abs() < f64::EPSILON);
        assert!(score("anything", "").abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_word_boundary() {
        assert!(score("ddg", "dg").abs() < f64::EPSILON);
        assert!((score_with("ddg", "dg", false) - MAX_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_helpers() {
        let text = "Rust: the book (2nd edition)";
        assert!(matches_any(text, "python book"));
        assert!(matches_all(text, "rust edition"));
        assert!(!matches_all(text, "rust python"));
        assert!(matches_none(text, "python perl"));
    }

    #[test]
    fn test_one_edit_apart() {
        assert!(one_edit_apart("gh", "g"));
        assert!(one_edit_apart("g", "gh"));
        assert!(one_edit_apart("wiki", "wika"));
        assert!(one_edit_apart("def", "de"));
        assert!(!one_edit_apart("zzz", "z"));
        assert!(!one_edit_apart("same", "same"));
    }
}
