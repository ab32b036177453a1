//! SearchLink CLI.
//!
//! Rewrites search directives in Markdown files in place, or filters
//! standard input to standard output when no files are given.

mod clipboard;
mod commands;
mod document;
mod error;
mod output;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use commands::RewriteArgs;
use output::Output;

/// SearchLink - turn search directives into Markdown links.
#[derive(Parser)]
#[command(name = "searchlink", version, about, disable_version_flag = true)]
struct Cli {
    #[command(flatten)]
    rewrite: RewriteArgs,

    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: (),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.rewrite.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.rewrite.execute(&output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_and_long_version_flags() {
        for flag in ["-v", "--version"] {
            let err = Cli::try_parse_from(["searchlink", flag]).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn test_files_and_flags() {
        let cli = Cli::try_parse_from(["searchlink", "--verbose", "post.md"]).unwrap();
        assert!(cli.rewrite.verbose);
    }
}
