//! Effective configuration with line-scoped overrides.
//!
//! Inline flags (`++t`, `--no-debug`) change options for the current line
//! only. Each line opens a scope with [`ScopeStack::begin_line`]; flags applied
//! while it is open record the prior value, and [`ScopeStack::restore`] puts
//! every prior value back. `key: value` lines change the running configuration
//! for the rest of the document and survive restores.

use std::sync::LazyLock;

use regex::Regex;
use searchlink_config::{Config, ConfigKey, ConfigValue};

static FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|\s)(?:(\+\+|--)([dirtv]+)\b|--(no-)?(debug|inline|prefix_random|include_titles|validate_links)\b)",
    )
    .unwrap()
});

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *([a-z_]+):\s+(\S+)\s*$").unwrap());

/// Extract inline flags from `text`.
///
/// Returns the text with every flag removed, and the flags in order of
/// appearance as `(key, enabled)` pairs.
#[must_use]
pub fn strip_flags(text: &str) -> (String, Vec<(ConfigKey, bool)>) {
    let mut flags = Vec::new();
    for caps in FLAG_RE.captures_iter(text) {
        if let (Some(sign), Some(codes)) = (caps.get(1), caps.get(2)) {
            let enabled = sign.as_str() == "++";
            flags.extend(
                codes
                    .as_str()
                    .chars()
                    .filter_map(ConfigKey::from_short)
                    .map(|key| (key, enabled)),
            );
        } else if let Some(key) = caps.get(4).and_then(|m| ConfigKey::from_name(m.as_str())) {
            flags.push((key, caps.get(3).is_none()));
        }
    }
    let stripped = FLAG_RE.replace_all(text, "").into_owned();
    (stripped, flags)
}

/// Parse a `key: value` line into a persistent assignment.
///
/// Only keys that documents may set are recognised; boolean keys require
/// `true` or `false`.
#[must_use]
pub fn parse_assignment(line: &str) -> Option<(ConfigKey, ConfigValue)> {
    let caps = ASSIGNMENT_RE.captures(line)?;
    let key = ConfigKey::from_name(caps.get(1)?.as_str())?;
    let value = ConfigValue::parse_for(key, caps.get(2)?.as_str())?;
    Some((key, value))
}

/// Marks the scope depth to return to.
#[must_use = "a line scope must be restored"]
#[derive(Debug)]
pub struct RestoreToken {
    depth: usize,
}

/// Current configuration plus the stack of open line scopes.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    config: Config,
    /// Prior values recorded per open scope, oldest first.
    frames: Vec<Vec<(ConfigKey, ConfigValue)>>,
}

impl ScopeStack {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            frames: Vec::new(),
        }
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the stack, returning the configuration with persistent changes.
    ///
    /// Open scopes are restored first.
    #[must_use]
    pub fn into_config(mut self) -> Config {
        self.restore(RestoreToken { depth: 0 });
        self.config
    }

    /// Open a scope for one line.
    pub fn begin_line(&mut self) -> RestoreToken {
        self.frames.push(Vec::new());
        RestoreToken {
            depth: self.frames.len() - 1,
        }
    }

    /// Apply every inline flag in `text` to the innermost open scope.
    ///
    /// Returns `text` with the flags removed. Without an open scope the flags
    /// are stripped but not applied.
    pub fn apply_flags(&mut self, text: &str) -> String {
        let (stripped, flags) = strip_flags(text);
        if flags.is_empty() {
            return stripped;
        }
        let Some(frame) = self.frames.last_mut() else {
            tracing::warn!(text, "Inline flags outside a line scope ignored");
            return stripped;
        };
        for (key, enabled) in flags {
            if !frame.iter().any(|(recorded, _)| *recorded == key) {
                frame.push((key, self.config.get(key)));
            }
            self.config.set(key, ConfigValue::Bool(enabled));
            tracing::debug!(key = %key, value = enabled, "Line config");
        }
        stripped
    }

    /// Open a scope for `line` and apply the flags it contains.
    pub fn apply_line_flags(&mut self, line: &str) -> RestoreToken {
        let token = self.begin_line();
        let _ = self.apply_flags(line);
        token
    }

    /// Close every scope opened since `token` was issued, restoring prior values.
    pub fn restore(&mut self, token: RestoreToken) {
        while self.frames.len() > token.depth {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            for (key, value) in frame.into_iter().rev() {
                tracing::debug!(key = %key, value = %value, "Reset config");
                self.config.set(key, value);
            }
        }
    }

    /// Set an option for the rest of the run.
    ///
    /// Open scopes that recorded a prior value for the key are updated so that
    /// closing them keeps the new value.
    pub fn set_persistent(&mut self, key: ConfigKey, value: ConfigValue) {
        tracing::info!(key = %key, value = %value, "Global config");
        for frame in &mut self.frames {
            for (recorded, prior) in frame.iter_mut() {
                if *recorded == key {
                    *prior = value.clone();
                }
            }
        }
        self.config.set(key, value);
    }

    /// Apply `line` as a persistent assignment if it is one.
    ///
    /// Returns whether the line was an assignment.
    pub fn apply_assignment(&mut self, line: &str) -> bool {
        match parse_assignment(line) {
            Some((key, value)) => {
                self.set_persistent(key, value);
                true
            }
            None => false,
        }
    }
}
