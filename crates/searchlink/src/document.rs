//! Input classification and file writing.

use std::fs;
use std::path::{Path, PathBuf};

use searchlink_engine::directive;

use crate::error::CliError;

/// How an input should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    /// A single line without directive syntax, searched as a whole.
    Query,
    /// Markdown with directives. `inline` is set for a one-line input
    /// holding exactly one directive, which is rewritten to an inline link.
    Document { inline: bool },
}

pub(crate) fn classify(input: &str) -> InputMode {
    let content = input.trim_end_matches(['\n', '\r']);
    let single_line = !content.contains('\n');

    if single_line && !directive::has_spans(content) {
        if content.trim().is_empty() {
            return InputMode::Document { inline: false };
        }
        return InputMode::Query;
    }

    InputMode::Document {
        inline: single_line && directive::find_spans(content).len() == 1,
    }
}

/// Backup location: the file name with `.bak` appended.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

pub(crate) fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite `path` with `content`, first copying the old file aside when
/// `backup` is set. Returns the backup path.
pub(crate) fn write(path: &Path, content: &str, backup: bool) -> Result<Option<PathBuf>, CliError> {
    let file_error = |source| CliError::File {
        path: path.to_path_buf(),
        source,
    };

    let saved = if backup {
        let target = backup_path(path);
        fs::copy(path, &target).map_err(file_error)?;
        Some(target)
    } else {
        None
    };
    fs::write(path, content).map_err(file_error)?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_bare_query() {
        assert_eq!(classify("rust language\n"), InputMode::Query);
        assert_eq!(classify("!wiki Rust^"), InputMode::Query);
    }

    #[test]
    fn test_classify_single_directive_is_inline() {
        assert_eq!(classify("[Rust](!g rust)\n"), InputMode::Document { inline: true });
        assert_eq!(
            classify("[Rust](!g rust) and [Go](!g golang)"),
            InputMode::Document { inline: false }
        );
    }

    #[test]
    fn test_classify_multiline_document() {
        assert_eq!(
            classify("# Notes\n\n[Rust](!g rust)\n"),
            InputMode::Document { inline: false }
        );
        assert_eq!(classify("first\nsecond\n"), InputMode::Document { inline: false });
        assert_eq!(classify("\n"), InputMode::Document { inline: false });
    }

    #[test]
    fn test_backup_path_appends_extension() {
        assert_eq!(backup_path(Path::new("notes/post.md")), PathBuf::from("notes/post.md.bak"));
    }

    #[test]
    fn test_write_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "[Rust](!g rust)\n").unwrap();

        let saved = write(&path, "[Rust](https://www.rust-lang.org)\n", true).unwrap();

        assert_eq!(saved, Some(dir.path().join("post.md.bak")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[Rust](https://www.rust-lang.org)\n");
        assert_eq!(fs::read_to_string(dir.path().join("post.md.bak")).unwrap(), "[Rust](!g rust)\n");
    }

    #[test]
    fn test_write_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "old").unwrap();

        assert_eq!(write(&path, "new", false).unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("post.md.bak").exists());
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.md");
        let err = read(&path).unwrap_err();
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }
}
