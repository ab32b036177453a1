//! Code block detection.
//!
//! Directives inside fenced or indented code are never rewritten. Lines are
//! classified one at a time in document order.

use std::sync::LazyLock;

use regex::Regex;

/// Indented code: four spaces or a tab, not followed by a list marker.
static INDENTED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( {4,}|\t+)[^*+\-]").unwrap());

/// Deepest indent at which a fence can open; more is indented code.
const MAX_FENCE_INDENT: usize = 3;

/// How a line relates to code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Opening or closing fence marker.
    Fence,
    /// Inside a fenced block.
    Fenced,
    /// Indented code block line.
    Indented,
    /// Ordinary Markdown.
    Text,
}

impl LineKind {
    /// Whether directives on this line are left alone.
    #[must_use]
    pub fn is_code(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Tracks fenced code blocks across lines.
///
/// Fences use backticks or tildes (three or more). A fence closes on a line
/// of the same character at least as long as the opener.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Classify the next line and advance the fence state.
    pub fn classify(&mut self, line: &str) -> LineKind {
        let trimmed = line.trim_start();

        if let Some((fence_char, fence_len)) = self.open {
            if closes_fence(trimmed, fence_char, fence_len) {
                self.open = None;
                return LineKind::Fence;
            }
            return LineKind::Fenced;
        }

        if is_indented_code(line) {
            return LineKind::Indented;
        }

        let indent = line.len() - trimmed.len();
        if indent <= MAX_FENCE_INDENT
            && !line.starts_with('\t')
            && let Some(opener) = opening_fence(trimmed)
        {
            self.open = Some(opener);
            return LineKind::Fence;
        }

        LineKind::Text
    }
}

/// Whether a line outside any fence is indented code.
#[must_use]
pub fn is_indented_code(line: &str) -> bool {
    INDENTED_CODE_RE.is_match(line)
}

fn opening_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn closes_fence(trimmed: &str, fence_char: char, min_len: usize) -> bool {
    let count = trimmed.chars().take_while(|&c| c == fence_char).count();
    count > 0 && count >= min_len && trimmed[count..].trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(lines: &[&str]) -> Vec<LineKind> {
        let mut tracker = FenceTracker::new();
        lines.iter().map(|line| tracker.classify(line)).collect()
    }

    #[test]
    fn test_backtick_fence() {
        assert_eq!(
            kinds(&["```rust", "[x](!g)", "```", "[y](!g)"]),
            vec![
                LineKind::Fence,
                LineKind::Fenced,
                LineKind::Fence,
                LineKind::Text
            ]
        );
    }

    #[test]
    fn test_tilde_fence_ignores_backticks() {
        assert_eq!(
            kinds(&["~~~", "```", "~~~"]),
            vec![LineKind::Fence, LineKind::Fenced, LineKind::Fence]
        );
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let mut tracker = FenceTracker::new();
        tracker.classify("````");
        assert_eq!(tracker.classify("```"), LineKind::Fenced);
        assert!(tracker.in_fence());
        assert_eq!(tracker.classify("`````  "), LineKind::Fence);
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_info_string_does_not_close() {
        let mut tracker = FenceTracker::new();
        tracker.classify("```");
        assert_eq!(tracker.classify("```rust"), LineKind::Fenced);
    }

    #[test]
    fn test_indented_fence_markers() {
        assert_eq!(
            kinds(&["   ```", "x", "  ```"]),
            vec![LineKind::Fence, LineKind::Fenced, LineKind::Fence]
        );
    }

    #[test]
    fn test_indented_backticks_do_not_open_fence() {
        assert_eq!(
            kinds(&["    ```", "[Rust](!g rust)"]),
            vec![LineKind::Indented, LineKind::Text]
        );
        assert_eq!(
            kinds(&["\t~~~", "[Rust](!g rust)"]),
            vec![LineKind::Indented, LineKind::Text]
        );
    }

    #[test]
    fn test_inline_backticks_are_text() {
        assert_eq!(kinds(&["``code`` [x](!g)"]), vec![LineKind::Text]);
    }

    #[test]
    fn test_indented_code() {
        assert!(is_indented_code("    [x](!g)"));
        assert!(is_indented_code("\t[x](!g)"));
        assert!(!is_indented_code("    - [x](!g)"));
        assert!(!is_indented_code("    * item"));
        assert!(!is_indented_code("   [x](!g)"));
        assert_eq!(kinds(&["        code"]), vec![LineKind::Indented]);
        assert!(LineKind::Indented.is_code());
        assert!(!LineKind::Text.is_code());
    }
}
