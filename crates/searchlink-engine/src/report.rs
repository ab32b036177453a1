//! Run report and error log, rendered as HTML comments.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static REPORT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\n?<!-- Report:.*?-->\n?").unwrap());

static ERRORS_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\n?<!-- Errors:.*?-->\n?").unwrap());

/// Remove report and error comments left by a previous run.
#[must_use]
pub fn strip_previous_blocks(text: &str) -> String {
    let text = REPORT_BLOCK_RE.replace(text, "");
    ERRORS_BLOCK_RE.replace(&text, "").into_owned()
}

/// Where a directive was found: 1-based line, byte column and match length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

/// One logged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub position: Option<Position>,
    pub message: String,
}

impl LogEntry {
    #[must_use]
    pub fn new(position: Option<Position>, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "({}:{}:{}): {}", pos.line, pos.column, pos.length, self.message),
            None => write!(f, "(?:?:?): {}", self.message),
        }
    }
}

/// Errors grouped by label, groups in first-seen order.
#[derive(Debug, Default)]
pub struct ErrorLog {
    groups: Vec<(String, Vec<LogEntry>)>,
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, entry: LogEntry) {
        let label = label.into();
        match self.groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, entries)) => entries.push(entry),
            None => self.groups.push((label, vec![entry])),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, entries)| entries.len()).sum()
    }

    /// Every entry as `(Label) (pos): message`, grouped.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|(label, entries)| entries.iter().map(move |entry| format!("({label}) {entry}")))
            .collect()
    }

    /// Render as a multi-line comment block, or a single-line comment when
    /// `inline` is set. Empty when there are no errors.
    #[must_use]
    pub fn render(&self, inline: bool) -> String {
        if self.is_empty() {
            return String::new();
        }
        let lines = self.lines();
        if inline {
            format!(" <!-- Errors: {} -->", lines.join("; "))
        } else {
            format!("\n<!-- Errors:\n{}\n-->\n", lines.join("\n"))
        }
    }
}

/// Per-directive processing report.
#[derive(Debug, Default)]
pub struct ReportLog {
    entries: Vec<LogEntry>,
}

impl ReportLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = self.entries.iter().map(ToString::to_string).collect();
        format!("\n<!-- Report:\n{}\n-->\n", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(line: usize, column: usize, length: usize) -> Option<Position> {
        Some(Position {
            line,
            column,
            length,
        })
    }

    #[test]
    fn test_entry_display() {
        assert_eq!(LogEntry::new(at(3, 4, 12), "msg").to_string(), "(3:4:12): msg");
        assert_eq!(LogEntry::new(None, "done").to_string(), "(?:?:?): done");
    }

    #[test]
    fn test_errors_group_by_label_in_first_seen_order() {
        let mut log = ErrorLog::new();
        log.push("No results", LogEntry::new(at(1, 0, 5), "a"));
        log.push("Invalid search", LogEntry::new(at(2, 0, 5), "b"));
        log.push("No results", LogEntry::new(at(3, 0, 5), "c"));

        assert_eq!(log.len(), 3);
        assert_eq!(
            log.lines(),
            vec![
                "(No results) (1:0:5): a",
                "(No results) (3:0:5): c",
                "(Invalid search) (2:0:5): b",
            ]
        );
        assert_eq!(
            log.render(false),
            "\n<!-- Errors:\n(No results) (1:0:5): a\n(No results) (3:0:5): c\n(Invalid search) (2:0:5): b\n-->\n"
        );
    }

    #[test]
    fn test_inline_errors() {
        let mut log = ErrorLog::new();
        log.push("No input", LogEntry::new(at(1, 0, 6), "[](!g)"));
        assert_eq!(log.render(true), " <!-- Errors: (No input) (1:0:6): [](!g) -->");
        assert_eq!(ErrorLog::new().render(true), "");
    }

    #[test]
    fn test_report_block() {
        let mut report = ReportLog::new();
        report.push(LogEntry::new(at(1, 0, 7), "[x](!g) => https://x.example"));
        report.push(LogEntry::new(None, "Processed: 1 links, 0 errors."));
        assert_eq!(
            report.render(),
            "\n<!-- Report:\n(1:0:7): [x](!g) => https://x.example\n(?:?:?): Processed: 1 links, 0 errors.\n-->\n"
        );
    }

    #[test]
    fn test_strip_previous_blocks() {
        let text = "Body\n\n<!-- Report:\n(1:0:1): x\n-->\n\n<!-- Errors:\n(No results) (1:0:1): y\n-->\n";
        assert_eq!(strip_previous_blocks(text), "Body\n");
    }
}
