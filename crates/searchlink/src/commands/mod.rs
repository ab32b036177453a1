//! CLI command implementations.

mod rewrite;
mod searches;

pub(crate) use rewrite::RewriteArgs;
