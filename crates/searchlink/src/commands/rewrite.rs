//! Rewrite files or standard input.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Args;
use searchlink_config::{CliSettings, Config};
use searchlink_engine::{Engine, Rewrite};
use searchlink_providers::Providers;
use tracing::{info, warn};

use super::searches;
use crate::clipboard;
use crate::document::{self, InputMode};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for a rewrite run.
#[derive(Args)]
pub(crate) struct RewriteArgs {
    /// Markdown files to rewrite in place. Reads stdin when omitted.
    files: Vec<PathBuf>,

    /// Print results to stdout instead of overwriting files.
    #[arg(short, long)]
    stdout: bool,

    /// Do not keep a `.bak` copy of rewritten files.
    #[arg(long)]
    no_backup: bool,

    /// Append a report of processed directives to each document.
    #[arg(long)]
    report: bool,

    /// Configuration file path (default: ~/.searchlink.toml).
    #[arg(short, long, env = "SEARCHLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(long)]
    pub(crate) verbose: bool,

    /// Resolve the searches of a document concurrently.
    #[arg(long)]
    parallel: bool,

    /// List available searches and exit.
    #[arg(long)]
    list_searches: bool,
}

impl RewriteArgs {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            backup: self.no_backup.then_some(false),
            report: self.report.then_some(true),
        }
    }

    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let providers = Providers::default();
        let build = |config: Config| build_engine(config, &providers, self.parallel);

        if self.list_searches {
            output.document(&searches::format_listing(build(config).registry()))?;
            return Ok(());
        }

        if self.files.is_empty() {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            return rewrite_stdin(&input, config, build, output);
        }

        let engine = build(config);
        for path in &self.files {
            let input = document::read(path)?;
            let rewrite = engine.rewrite(&input);
            report_errors(output, &rewrite, engine.config().debug);

            if self.stdout {
                output.document(&rewrite.output)?;
                continue;
            }
            if rewrite.output == input {
                output.info(&format!("{}: nothing to rewrite", path.display()));
                continue;
            }

            let saved = document::write(path, &rewrite.output, engine.config().backup)?;
            if let Some(saved) = saved {
                info!(backup = %saved.display(), "backup written");
            }
            output.success(&format!("Updated {} ({} links)", path.display(), rewrite.links));
        }
        Ok(())
    }
}

fn build_engine(config: Config, providers: &Providers, parallel: bool) -> Engine {
    Engine::new(config, providers.registry())
        .with_validator(providers.validator())
        .with_title_fetcher(providers.title_fetcher())
        .with_parallel(parallel)
}

/// Rewrite standard input. A lone directive becomes an inline link and a
/// line without directives is searched as a query.
fn rewrite_input(input: &str, mut config: Config, build: impl FnOnce(Config) -> Engine) -> (Rewrite, bool) {
    match document::classify(input) {
        InputMode::Query => {
            let debug = config.debug;
            (build(config).resolve_query(input), debug)
        }
        InputMode::Document { inline } => {
            if inline {
                config.inline = true;
            }
            let debug = config.debug;
            (build(config).rewrite(input), debug)
        }
    }
}

fn rewrite_stdin(
    input: &str,
    config: Config,
    build: impl FnOnce(Config) -> Engine,
    output: &Output,
) -> Result<(), CliError> {
    let (rewrite, debug) = rewrite_input(input, config, build);
    report_errors(output, &rewrite, debug);

    if rewrite.clipboard {
        clipboard::copy(rewrite.output.trim_end())?;
        output.document(input)?;
        output.highlight("Copied to clipboard");
    } else {
        output.document(&rewrite.output)?;
    }
    Ok(())
}

/// Errors are written into the document only in debug mode; otherwise
/// surface them on stderr.
fn report_errors(output: &Output, rewrite: &Rewrite, debug: bool) {
    if debug {
        return;
    }
    for error in &rewrite.errors {
        warn!(error = %error, "search failed");
        output.warning(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use searchlink_engine::{Hit, ProviderError, Registry, SearchRequest};
    use std::sync::Arc;
    use std::time::Duration;

    fn lookup(request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let slug = request.terms.replace(' ', "-");
        Ok(Some(Hit::link(format!("https://example.org/{slug}"), request.terms)))
    }

    fn stub_engine(config: Config) -> Engine {
        let mut registry = Registry::new();
        registry.register("g", Arc::new(lookup));
        Engine::new(config, registry).with_throttle(0, Duration::ZERO)
    }

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RewriteArgs,
    }

    fn settings(argv: &[&str]) -> CliSettings {
        TestCli::try_parse_from(argv).unwrap().args.cli_settings()
    }

    #[test]
    fn test_cli_settings_override_config() {
        let defaults = settings(&["searchlink"]);
        assert_eq!((defaults.backup, defaults.report), (None, None));

        let overridden = settings(&["searchlink", "--no-backup", "--report", "post.md"]);
        assert_eq!((overridden.backup, overridden.report), (Some(false), Some(true)));
    }

    #[test]
    fn test_single_directive_is_inlined() {
        let (rewrite, _) = rewrite_input("[Rust](!g rust)\n", Config::default(), stub_engine);
        assert_eq!(rewrite.output, "[Rust](https://example.org/rust)\n");
        assert!(!rewrite.clipboard);
    }

    #[test]
    fn test_document_keeps_configured_link_form() {
        let input = "# Notes\n\n[Rust](!g rust)\n";
        let (rewrite, _) = rewrite_input(input, Config::default(), stub_engine);
        assert!(rewrite.output.contains("[Rust][0001]"), "{}", rewrite.output);
    }

    #[test]
    fn test_bare_line_is_a_query() {
        let (rewrite, _) = rewrite_input("!g rust lang\n", Config::default(), stub_engine);
        assert_eq!(rewrite.output.trim_end(), "[rust lang](https://example.org/rust-lang)");
    }

    #[test]
    fn test_clipboard_modifier_is_reported() {
        let (rewrite, _) = rewrite_input("[Rust](!g rust^)\n", Config::default(), stub_engine);
        assert!(rewrite.clipboard);
    }

    #[test]
    fn test_debug_flag_is_returned() {
        let config = Config {
            debug: false,
            ..Config::default()
        };
        let (_, debug) = rewrite_input("[Rust](!g rust)", config, stub_engine);
        assert!(!debug);
    }
}
