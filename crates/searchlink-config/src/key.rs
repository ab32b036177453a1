//! Option keys that can be changed while a document is being processed.
//!
//! Documents change configuration in two ways: inline flags (`++t`,
//! `--no-debug`) that last for a single line, and `key: value` lines that last
//! for the rest of the run. Both address options through [`ConfigKey`].

use std::fmt;

/// A configuration option addressable from inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Debug,
    Report,
    CountryCode,
    Inline,
    PrefixRandom,
    IncludeTitles,
    ValidateLinks,
    EmptyUsesPageTitle,
}

impl ConfigKey {
    /// Keys that inline flags (`--key`, `--no-key`) may toggle.
    pub const FLAGS: [Self; 5] = [
        Self::Debug,
        Self::Inline,
        Self::PrefixRandom,
        Self::IncludeTitles,
        Self::ValidateLinks,
    ];

    /// Keys that a `key: value` line may set for the rest of a run.
    pub const PERSISTENT: [Self; 8] = [
        Self::Debug,
        Self::Report,
        Self::CountryCode,
        Self::Inline,
        Self::PrefixRandom,
        Self::IncludeTitles,
        Self::ValidateLinks,
        Self::EmptyUsesPageTitle,
    ];

    /// Long name, as used in the config file and in `--flag` form.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Report => "report",
            Self::CountryCode => "country_code",
            Self::Inline => "inline",
            Self::PrefixRandom => "prefix_random",
            Self::IncludeTitles => "include_titles",
            Self::ValidateLinks => "validate_links",
            Self::EmptyUsesPageTitle => "empty_uses_page_title",
        }
    }

    /// Look up a key by its long name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::PERSISTENT.into_iter().find(|key| key.name() == name)
    }

    /// Map a short flag letter (`++dt`, `--v`) to its key.
    #[must_use]
    pub fn from_short(code: char) -> Option<Self> {
        match code {
            'd' => Some(Self::Debug),
            'i' => Some(Self::Inline),
            'r' => Some(Self::PrefixRandom),
            't' => Some(Self::IncludeTitles),
            'v' => Some(Self::ValidateLinks),
            _ => None,
        }
    }

    /// Whether the option holds a boolean.
    #[must_use]
    pub fn is_flag(self) -> bool {
        !matches!(self, Self::CountryCode)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of an addressable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Text(String),
}

impl ConfigValue {
    /// Parse a raw `key: value` right-hand side for the given key.
    ///
    /// Boolean keys accept `true`/`false` in any case. Returns `None` when a
    /// boolean key receives anything else.
    #[must_use]
    pub fn parse_for(key: ConfigKey, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if key.is_flag() {
            if raw.eq_ignore_ascii_case("true") {
                Some(Self::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Some(Self::Bool(false))
            } else {
                None
            }
        } else {
            Some(Self::Text(raw.to_owned()))
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}
