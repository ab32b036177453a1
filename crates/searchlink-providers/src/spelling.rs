//! Spelling correction through `aspell`'s pipe mode.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use searchlink_engine::{Hit, ProviderError, SearchProvider, SearchRequest};
use tracing::debug;

use crate::error::FetchError;

const ASPELL_LOCATIONS: &[&str] = &["/usr/local/bin/aspell", "/opt/homebrew/bin/aspell", "/usr/bin/aspell"];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+").unwrap());

/// Find an `aspell` binary in the usual install locations or on `PATH`.
#[must_use]
pub fn locate_aspell() -> Option<PathBuf> {
    let known = ASPELL_LOCATIONS.iter().map(PathBuf::from);
    let on_path = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).map(|dir| dir.join("aspell")).collect::<Vec<_>>())
        .unwrap_or_default();
    known.chain(on_path).find(|path| path.is_file())
}

/// First suggestion from one pipe-mode result line.
///
/// `*` and `#` lines (correct, or no suggestions) yield `None`. When the
/// phrase starts lowercase, capitalized suggestions are skipped.
#[must_use]
pub fn suggestion(line: &str, lowercase: bool) -> Option<String> {
    if !line.starts_with('&') {
        return None;
    }
    let (_, list) = line.split_once(": ")?;
    list.split(", ")
        .map(str::trim)
        .find(|word| !word.is_empty() && !(lowercase && word.chars().any(char::is_uppercase)))
        .map(str::to_owned)
}

/// Result lines of a pipe-mode session, one per checked word.
fn result_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| !line.starts_with("@(#)") && !line.trim().is_empty())
        .collect()
}

/// Replace each word of `phrase` by its correction, keeping everything else.
#[must_use]
pub fn apply_corrections(phrase: &str, corrections: &[Option<String>]) -> String {
    let mut output = String::with_capacity(phrase.len());
    let mut last = 0;
    for (found, correction) in WORD_RE.find_iter(phrase).zip(corrections) {
        output.push_str(&phrase[last..found.start()]);
        output.push_str(correction.as_deref().unwrap_or(found.as_str()));
        last = found.end();
    }
    output.push_str(&phrase[last..]);
    output
}

/// An `aspell` installation.
#[derive(Debug, Clone)]
pub struct Aspell {
    program: PathBuf,
}

impl Aspell {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `aspell` from a standard location, if installed.
    #[must_use]
    pub fn locate() -> Option<Self> {
        locate_aspell().map(Self::new)
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Correct every misspelled word of `phrase`.
    pub fn correct(&self, phrase: &str) -> Result<String, FetchError> {
        let words: Vec<&str> = WORD_RE.find_iter(phrase).map(|m| m.as_str()).collect();
        if words.is_empty() {
            return Ok(phrase.to_owned());
        }

        let mut child = Command::new(&self.program)
            .args(["--sug-mode=bad-spellers", "-C", "pipe"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // `^` marks each line as text to check rather than a command.
            let input: String = words.iter().map(|word| format!("^{word}\n")).collect();
            stdin.write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let lowercase = phrase.starts_with(|c: char| c.is_ascii_lowercase());
        let corrections: Vec<Option<String>> = result_lines(&stdout)
            .into_iter()
            .map(|line| suggestion(line, lowercase))
            .collect();
        let corrected = apply_corrections(phrase, &corrections);
        debug!(phrase, corrected = %corrected, "spelling");
        Ok(corrected)
    }
}

/// Spelling provider for `sp` and `spell`.
#[derive(Debug, Clone, Default)]
pub struct Spelling {
    aspell: Option<Aspell>,
}

impl Spelling {
    #[must_use]
    pub fn new(aspell: Option<Aspell>) -> Self {
        Self { aspell }
    }
}

impl SearchProvider for Spelling {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let aspell = self
            .aspell
            .as_ref()
            .ok_or_else(|| ProviderError::Unavailable("aspell".to_owned()))?;
        let corrected = aspell.correct(request.terms)?;
        Ok(Some(Hit::spelling(corrected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchlink_config::Config;
    use searchlink_engine::SearchKind;

    #[test]
    fn test_suggestion_lines() {
        assert_eq!(suggestion("*", false), None);
        assert_eq!(suggestion("# xyzzy 0", false), None);
        assert_eq!(
            suggestion("& recieve 5 0: receive, relieve, Rieve", false),
            Some("receive".to_owned())
        );
    }

    #[test]
    fn test_lowercase_phrase_skips_capitalized() {
        assert_eq!(
            suggestion("& parris 3 0: Paris, parries, pariahs", true),
            Some("parries".to_owned())
        );
        assert_eq!(
            suggestion("& parris 3 0: Paris, parries", false),
            Some("Paris".to_owned())
        );
    }

    #[test]
    fn test_result_lines_skip_header_and_blanks() {
        let output = "@(#) International Ispell Version 3.1.20 (but really Aspell 0.60.8)\n*\n\n& teh 3 0: the, tech\n\n";
        assert_eq!(result_lines(output), vec!["*", "& teh 3 0: the, tech"]);
    }

    #[test]
    fn test_apply_corrections_keeps_separators() {
        let corrected = apply_corrections(
            "I recieve teh mail, twice.",
            &[None, Some("receive".to_owned()), Some("the".to_owned()), None, None],
        );
        assert_eq!(corrected, "I receive the mail, twice.");
    }

    #[test]
    fn test_missing_aspell_is_unavailable() {
        let config = Config::default();
        let request = SearchRequest {
            trigger: "sp",
            kind: &SearchKind::Spelling,
            terms: "recieve",
            link_text: "",
            config: &config,
        };
        let err = Spelling::new(None).search(&request).unwrap_err();
        assert_eq!(err.to_string(), "aspell is not available");
    }
}
