//! Search directive rewrite engine.
//!
//! Finds `[link text](!trigger terms)` directives in Markdown, resolves each
//! one through a search provider and substitutes a link in its place. Every
//! byte outside the directives is preserved.
//!
//! # Architecture
//!
//! - [`Registry`]: maps triggers to [`SearchKind`]s and their providers
//! - [`Dispatcher`]: expands shortcuts, calls providers, validates links
//! - [`Engine`]: walks the document, tracks code blocks and inline flags,
//!   and assembles links, reference markers, footnotes and logs
//!
//! The engine performs no I/O. Providers, the link validator and the title
//! fetcher are trait objects supplied by the caller.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use searchlink_config::Config;
//! use searchlink_engine::{Engine, Hit, ProviderError, Registry, SearchRequest};
//!
//! fn lookup(request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
//!     Ok(Some(Hit::link("https://www.rust-lang.org", request.terms)))
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("g", Arc::new(lookup));
//!
//! let config = Config {
//!     inline: true,
//!     ..Config::default()
//! };
//! let engine = Engine::new(config, registry);
//! let rewrite = engine.rewrite("Learn [Rust](!g rust language).");
//!
//! assert_eq!(rewrite.output, "Learn [Rust](https://www.rust-lang.org).");
//! ```

pub mod custom;
pub mod directive;
mod dispatch;
mod edits;
mod engine;
mod fence;
mod links;
mod provider;
mod registry;
mod report;
mod result;
mod scope;
pub mod score;

pub use dispatch::{
    DEFAULT_THROTTLE_DELAY, DEFAULT_THROTTLE_EVERY, DispatchRequest, Dispatcher, is_domain_trigger,
    progress_level,
};
pub use edits::LineEdits;
pub use engine::{Engine, Rewrite};
pub use fence::{FenceTracker, LineKind, is_indented_code};
pub use links::{Footer, LinkForm, LinkTable, Markers, clean_title, render_link};
pub use provider::{
    Hit, HitKind, LinkValidator, ProviderError, SearchProvider, SearchRequest, TitleFetcher,
    Validation,
};
pub use registry::{
    AppleMusic, DEFAULT_TRIGGER, Itunes, LastFm, REPLACE_TRIGGER, Registry, Resolution, SearchKind,
    Site, Social, Tmdb, parse_history_trigger,
};
pub use report::{ErrorLog, LogEntry, Position, ReportLog};
pub use result::{ErrorKind, Note, ResultKind, SearchResult};
pub use scope::{RestoreToken, ScopeStack, parse_assignment, strip_flags};
