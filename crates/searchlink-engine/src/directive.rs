//! Directive scanning and parsing.
//!
//! A directive is Markdown link syntax `[link text](link info)` whose info is
//! not an ordinary URL. Parsing decides what kind of directive a span is and
//! extracts the trigger, terms and modifiers. Inline flags must already be
//! stripped from the info.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());

/// A backtick not escaped by a backslash.
static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|[^\\])`").unwrap());

/// Info that is already a link target, optionally with a title.
static URL_INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(#.*|https?://\S+|/\S+|\S+/|[^!]\S+\.\S+)(\s+".*?")?$"#).unwrap()
});

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""(.*?)""#).unwrap());

static LEADING_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[!^]\S+").unwrap());

static TRAILING_COLON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*:\s*$").unwrap());

static OUTER_QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^["']|["']$"#).unwrap());

static CLIPBOARD_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!!)?\^(!!)?$").unwrap());

static URL_ONLY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!!\^?$").unwrap());

static MODIFIER_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!!)?\^?(!!)?$").unwrap());

/// A `[text](info)` span within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    /// Byte range of the whole match in the line.
    pub range: Range<usize>,
    pub text: &'a str,
    pub link_text: &'a str,
    pub info: &'a str,
}

/// Every `[text](info)` span in `line`, left to right.
#[must_use]
pub fn find_spans(line: &str) -> Vec<Span<'_>> {
    DIRECTIVE_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Span {
                range: whole.range(),
                text: whole.as_str(),
                link_text: caps.get(1)?.as_str(),
                info: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Whether the document contains anything that looks like a directive.
#[must_use]
pub fn has_spans(text: &str) -> bool {
    DIRECTIVE_RE.is_match(text)
}

/// Whether a match starting after `before` sits inside an inline code span.
#[must_use]
pub fn in_inline_code(before: &str) -> bool {
    BACKTICK_RE.find_iter(before).count() % 2 == 1
}

/// Whether the info is an ordinary link target.
#[must_use]
pub fn is_url_info(info: &str) -> bool {
    URL_INFO_RE.is_match(info)
}

/// Output modifiers attached to a directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// `^` suffix: emit only the URL and mark the run as clipboard output.
    pub clipboard: bool,
    /// `!!` suffix: emit only the URL.
    pub url_only: bool,
    /// Whole line directive ending in `:`: emit a reference definition.
    pub ref_title: bool,
    /// `%` link text: use the page title as link text.
    pub titleize: bool,
}

/// A search directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub link_text: String,
    /// Trigger without `!`; `None` means the default search.
    pub trigger: Option<String>,
    pub terms: String,
    pub modifiers: Modifiers,
}

/// What a span turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Search(Directive),
    /// `[text](^note)`: inline footnote.
    Footnote { link_text: String, note: String },
    /// Ordinary link, left alone.
    Link,
    /// Neither link text nor terms.
    Empty,
    /// `!` with no trigger name.
    MissingTrigger,
}

/// Parse a span's link text and info.
///
/// `whole_line` is set when the span is the only content of its line, which
/// enables the reference definition form.
#[must_use]
pub fn parse(link_text: &str, info: &str, whole_line: bool) -> Parsed {
    let mut link_text = link_text.to_owned();
    let mut info = info.trim().to_owned();

    if link_text.trim().is_empty()
        && let Some(caps) = QUOTED_RE.captures(&info)
    {
        link_text = caps[1].to_owned();
        info = QUOTED_RE.replace_all(&info, "$1").into_owned();
    }

    if let Some(note) = info.strip_prefix('^') {
        let note = note.trim();
        if !note.is_empty() {
            return Parsed::Footnote {
                link_text,
                note: note.to_owned(),
            };
        }
    }

    let ref_title = whole_line && info.ends_with(':');
    if ref_title {
        info = TRAILING_COLON_RE.replace(&info, "").into_owned();
    }

    if link_text.trim().is_empty() && LEADING_TRIGGER_RE.replace(&info, "").trim().is_empty() {
        return Parsed::Empty;
    }

    if is_url_info(&info) {
        return Parsed::Link;
    }

    if info.is_empty() {
        info.clone_from(&link_text);
    }

    let (trigger, terms) = match info.strip_prefix('!') {
        Some(rest) => {
            let (token, remainder) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if token.is_empty() {
                return Parsed::MissingTrigger;
            }
            (Some(token.to_owned()), remainder.trim().to_owned())
        }
        None => (None, info),
    };

    let terms = OUTER_QUOTES_RE.replace_all(&terms, "");
    let clipboard = CLIPBOARD_SUFFIX_RE.is_match(&terms);
    let url_only = URL_ONLY_SUFFIX_RE.is_match(&terms);
    let mut terms = MODIFIER_SUFFIX_RE.replace(&terms, "").trim().to_owned();

    let mut titleize = false;
    if link_text == "%" && !terms.is_empty() {
        titleize = true;
        link_text.clear();
    }
    if terms.is_empty() {
        terms.clone_from(&link_text);
    }
    if let Some(rest) = terms.strip_prefix('+')
        && !rest.starts_with('+')
    {
        terms = format!("{link_text} {}", rest.trim_start());
    }

    Parsed::Search(Directive {
        link_text,
        trigger,
        terms,
        modifiers: Modifiers {
            clipboard,
            url_only,
            ref_title,
            titleize,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn search(link_text: &str, trigger: Option<&str>, terms: &str) -> Parsed {
        Parsed::Search(Directive {
            link_text: link_text.to_owned(),
            trigger: trigger.map(str::to_owned),
            terms: terms.to_owned(),
            modifiers: Modifiers::default(),
        })
    }

    fn modifiers(parsed: &Parsed) -> Modifiers {
        match parsed {
            Parsed::Search(directive) => directive.modifiers,
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn test_find_spans() {
        let spans = find_spans("See [a](!g x) and [b](https://b.example).");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range, 4..13);
        assert_eq!(spans[0].link_text, "a");
        assert_eq!(spans[0].info, "!g x");
        assert_eq!(spans[1].text, "[b](https://b.example)");
        assert!(has_spans("[x]()"));
        assert!(!has_spans("no links"));
    }

    #[test]
    fn test_inline_code_detection() {
        assert!(in_inline_code("Use `"));
        assert!(!in_inline_code("Use `code` then "));
        assert!(!in_inline_code(r"Escaped \` tick "));
        assert!(in_inline_code("``"));
        assert!(!in_inline_code(""));
    }

    #[test]
    fn test_url_info() {
        for info in [
            "https://example.com",
            "http://example.com \"Title\"",
            "#anchor",
            "/relative/path",
            "docs/",
            "example.com",
        ] {
            assert!(is_url_info(info), "{info}");
        }
        for info in ["!g rust", "rust book", "!example.com docs"] {
            assert!(!is_url_info(info), "{info}");
        }
    }

    #[test]
    fn test_plain_search_uses_link_text() {
        assert_eq!(parse("Rust", "", false), search("Rust", None, "Rust"));
        assert_eq!(parse("Rust", "!wiki", false), search("Rust", Some("wiki"), "Rust"));
    }

    #[test]
    fn test_trigger_and_terms() {
        assert_eq!(
            parse("", "!gh rust-lang/rust", false),
            search("", Some("gh"), "rust-lang/rust")
        );
        assert_eq!(
            parse("x", "!g \"quoted terms\"", false),
            search("x", Some("g"), "quoted terms")
        );
    }

    #[test]
    fn test_quoted_info_supplies_link_text() {
        assert_eq!(
            parse("", "!g \"Rust Book\" online", false),
            search("Rust Book", Some("g"), "Rust Book online")
        );
    }

    #[test]
    fn test_plus_appends_to_link_text() {
        assert_eq!(
            parse("Marked", "!s +mac", false),
            search("Marked", Some("s"), "Marked mac")
        );
    }

    #[test]
    fn test_footnote() {
        assert_eq!(
            parse("note1", "^A useful aside.", false),
            Parsed::Footnote {
                link_text: "note1".to_owned(),
                note: "A useful aside.".to_owned()
            }
        );
        assert!(matches!(parse("", "^An aside", false), Parsed::Footnote { .. }));
    }

    #[test]
    fn test_empty_directive() {
        assert_eq!(parse("", "!g", false), Parsed::Empty);
        assert_eq!(parse("", "", false), Parsed::Empty);
        assert_eq!(parse(" ", "  ", false), Parsed::Empty);
    }

    #[test]
    fn test_ordinary_links_are_left_alone() {
        assert_eq!(parse("Rust", "https://rust-lang.org", false), Parsed::Link);
        assert_eq!(parse("Top", "#top", false), Parsed::Link);
    }

    #[test]
    fn test_missing_trigger() {
        assert_eq!(parse("x", "! rust", false), Parsed::MissingTrigger);
    }

    #[test]
    fn test_suffix_modifiers() {
        let parsed = parse("Rust", "!g rust^", false);
        assert_eq!(
            modifiers(&parsed),
            Modifiers {
                clipboard: true,
                ..Modifiers::default()
            }
        );
        assert!(matches!(&parsed, Parsed::Search(d) if d.terms == "rust"));

        let parsed = parse("Rust", "!g rust!!", false);
        assert!(modifiers(&parsed).url_only);
        assert!(matches!(&parsed, Parsed::Search(d) if d.terms == "rust"));

        let parsed = parse("Rust", "rust lang!!^", false);
        let m = modifiers(&parsed);
        assert!(m.url_only && m.clipboard);
    }

    #[test]
    fn test_suffix_alone_falls_back_to_link_text() {
        assert!(matches!(parse("Marked", "!g ^", false), Parsed::Search(d) if d.terms == "Marked"));
    }

    #[test]
    fn test_reference_title_requires_whole_line() {
        let parsed = parse("Rust", "!g rust lang:", true);
        assert!(modifiers(&parsed).ref_title);
        assert!(matches!(&parsed, Parsed::Search(d) if d.terms == "rust lang"));

        let parsed = parse("Rust", "!g rust lang:", false);
        assert!(!modifiers(&parsed).ref_title);
    }

    #[test]
    fn test_titleize_marker() {
        let parsed = parse("%", "!g rust", false);
        let m = modifiers(&parsed);
        assert!(m.titleize);
        assert!(matches!(&parsed, Parsed::Search(d) if d.link_text.is_empty()));
    }
}
