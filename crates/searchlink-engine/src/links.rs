//! Reference links, markers and the document footer.

use std::collections::HashMap;
use std::sync::LazyLock;

use rand::RngExt;
use regex::Regex;

/// Existing reference definition: `[marker]: url ...`.
static REFERENCE_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}\[([^\]^][^\]]*)\]:\s+(\S+)").unwrap());

/// Numeric reference marker, with optional random prefix.
static LINK_COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}\[(?:\d{4}-)?(\d+)\]: ").unwrap());

/// Generated footnote marker, with optional random prefix.
static FOOTNOTE_COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}\[\^(?:\d{4}-)?fn(\d+)\]: ").unwrap());

static EXISTING_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{4}-)\d+\]: \S+").unwrap());

/// Line that is itself a reference or footnote definition.
static DEFINITION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}\[\^?[^\]]+\]: ").unwrap());

static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n+\s*").unwrap());

static UTM_AMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&utm_[a-z_]+=[^&\s]*").unwrap());

static UTM_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?utm_[a-z_]+=[^&\s]*&?").unwrap());

static DANGLING_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?(\s|$)").unwrap());

/// Whether `line` is a reference or footnote definition.
#[must_use]
pub fn is_definition_line(line: &str) -> bool {
    DEFINITION_LINE_RE.is_match(line)
}

/// URL to marker mapping for one run, in insertion order.
#[derive(Debug, Default)]
pub struct LinkTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LinkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from reference definitions already in the document.
    ///
    /// Footnote definitions are skipped. The first marker seen for a URL wins.
    #[must_use]
    pub fn from_document(text: &str) -> Self {
        let mut table = Self::new();
        for caps in REFERENCE_DEF_RE.captures_iter(text) {
            table.insert(&caps[2], &caps[1]);
        }
        table
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&str> {
        self.index
            .get(url)
            .map(|&position| self.entries[position].1.as_str())
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Record a marker for `url`. Returns `false` when the URL already has one.
    pub fn insert(&mut self, url: &str, marker: &str) -> bool {
        if self.index.contains_key(url) {
            return false;
        }
        self.index.insert(url.to_owned(), self.entries.len());
        self.entries.push((url.to_owned(), marker.to_owned()));
        true
    }

    /// `(url, marker)` pairs in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(url, marker)| (url.as_str(), marker.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generates reference and footnote markers.
///
/// Counters continue from the highest markers already in the document. The
/// random prefix is chosen once, on first use, reusing a prefix found in the
/// document when there is one.
#[derive(Debug, Default)]
pub struct Markers {
    link_count: u64,
    footnote_count: u64,
    existing_prefix: Option<String>,
    prefix: Option<String>,
}

impl Markers {
    #[must_use]
    pub fn from_document(text: &str) -> Self {
        let highest = |re: &Regex| {
            re.captures_iter(text)
                .filter_map(|caps| caps[1].parse::<u64>().ok())
                .max()
                .unwrap_or(0)
        };
        Self {
            link_count: highest(&LINK_COUNTER_RE),
            footnote_count: highest(&FOOTNOTE_COUNTER_RE),
            existing_prefix: EXISTING_PREFIX_RE
                .captures(text)
                .map(|caps| caps[1].to_owned()),
            prefix: None,
        }
    }

    /// Next reference marker (`0001` or `4821-0001`).
    pub fn next_link(&mut self, random_prefix: bool) -> String {
        self.link_count = self.link_count.saturating_add(1);
        format!("{}{:04}", self.prefix(random_prefix), self.link_count)
    }

    /// Next footnote id (`fn0001` or `4821-fn0001`).
    pub fn next_footnote(&mut self, random_prefix: bool) -> String {
        self.footnote_count = self.footnote_count.saturating_add(1);
        format!("{}fn{:04}", self.prefix(random_prefix), self.footnote_count)
    }

    fn prefix(&mut self, random_prefix: bool) -> String {
        if !random_prefix {
            return String::new();
        }
        self.prefix
            .get_or_insert_with(|| {
                self.existing_prefix.clone().unwrap_or_else(|| {
                    format!("{:04}-", rand::rng().random_range(0..10_000u32))
                })
            })
            .clone()
    }
}

/// Reference and footnote definitions appended after the body.
#[derive(Debug, Default)]
pub struct Footer {
    references: Vec<String>,
    footnotes: Vec<String>,
}

impl Footer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reference(&mut self, line: String) {
        self.references.push(line);
    }

    pub fn add_footnote(&mut self, line: String) {
        self.footnotes.push(line);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.footnotes.is_empty()
    }

    /// References sorted one per line, then footnotes separated by blank lines.
    #[must_use]
    pub fn render(&self) -> String {
        let mut references = self.references.clone();
        references.sort();
        let references = references.join("\n");
        let footnotes = self.footnotes.join("\n\n");
        match (references.is_empty(), footnotes.is_empty()) {
            (false, false) => format!("{references}\n\n{footnotes}"),
            (false, true) => references,
            (true, _) => footnotes,
        }
    }
}

/// Output form of a resolved link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkForm {
    /// `[text](url "title")`
    Inline,
    /// `[text][marker]`
    Reference,
    /// `[marker]: url "title"`
    Definition,
}

/// Render a link. `target` is the URL, or the marker for [`LinkForm::Reference`].
#[must_use]
pub fn render_link(form: LinkForm, text: &str, target: &str, title: Option<&str>) -> String {
    let title = title
        .map(clean_title)
        .filter(|title| !title.is_empty())
        .map(|title| format!(" \"{title}\""))
        .unwrap_or_default();
    match form {
        LinkForm::Inline => format!("[{text}]({target}{title})"),
        LinkForm::Reference => format!("[{text}][{target}]"),
        LinkForm::Definition => format!("[{text}]: {target}{title}"),
    }
}

/// Make a title safe for a link title attribute.
///
/// Newlines become spaces, quotes become `&quot;`, pipes become dashes and
/// `utm_` tracking parameters are dropped.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let title = NEWLINES_RE.replace_all(title.trim(), " ");
    let title = UTM_AMP_RE.replace_all(&title, "");
    let title = UTM_QUERY_RE.replace_all(&title, "?");
    let title = DANGLING_QUERY_RE.replace_all(&title, "$1");
    title.replace('"', "&quot;").replace('|', "-").trim().to_owned()
}
