//! Span edits against a read-only source line.
//!
//! Resolution never mutates the text it scans. Each substitution is
//! recorded against the byte range it replaces in the original line, and the
//! edited line is built in one pass afterwards, so earlier substitutions can
//! never shift later match positions.

use std::ops::Range;

/// Substitutions for one line, keyed by byte range in the original text.
///
/// ```
/// use searchlink_engine::LineEdits;
///
/// let mut edits = LineEdits::new();
/// edits.add(0..9, "[a][1]");
/// edits.add(14..23, "[b][2]");
///
/// assert_eq!(edits.apply("[a](!g x) and [b](!g y)."), "[a][1] and [b][2].");
/// ```
#[derive(Debug, Default)]
pub struct LineEdits {
    items: Vec<(Range<usize>, String)>,
}

impl LineEdits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Replace `range` of the source with `to`.
    pub fn add(&mut self, range: Range<usize>, to: impl Into<String>) {
        self.items.push((range, to.into()));
    }

    /// Build the edited line.
    ///
    /// Edits are applied in source order. An edit overlapping an earlier one,
    /// or falling outside the source, is skipped.
    #[must_use]
    pub fn apply(mut self, source: &str) -> String {
        if self.items.is_empty() {
            return source.to_owned();
        }

        self.items.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for (range, to) in self.items {
            if range.start < cursor || range.end > source.len() {
                tracing::debug!(?range, "Skipping overlapping edit");
                continue;
            }
            let (Some(kept), Some(_)) = (source.get(cursor..range.start), source.get(range.clone()))
            else {
                continue;
            };
            out.push_str(kept);
            out.push_str(&to);
            cursor = range.end;
        }
        out.push_str(&source[cursor..]);
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_edits_returns_source() {
        assert_eq!(LineEdits::new().apply("unchanged"), "unchanged");
    }

    #[test]
    fn test_edits_apply_in_source_order() {
        let mut edits = LineEdits::with_capacity(2);
        edits.add(6..11, "there");
        edits.add(0..5, "Hi");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits.apply("hello world!"), "Hi there!");
    }

    #[test]
    fn test_identical_text_is_replaced_per_span() {
        let mut edits = LineEdits::new();
        edits.add(10..17, "[x][2]");
        assert_eq!(
            edits.apply("[x](!g) / [x](!g)"),
            "[x](!g) / [x][2]"
        );
    }

    #[test]
    fn test_overlapping_edit_is_skipped() {
        let mut edits = LineEdits::new();
        edits.add(0..4, "A");
        edits.add(2..6, "B");
        assert_eq!(edits.apply("abcdefg"), "Aefg");
    }

    #[test]
    fn test_out_of_bounds_edit_is_skipped() {
        let mut edits = LineEdits::new();
        edits.add(2..40, "x");
        assert!(!edits.is_empty());
        assert_eq!(edits.apply("short"), "short");
    }
}
