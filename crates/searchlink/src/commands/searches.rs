//! `--list-searches`: print every trigger with its description.

use std::fmt::Write;

use searchlink_engine::Registry;

/// One line per trigger, triggers left-aligned in a column.
pub(super) fn format_listing(registry: &Registry) -> String {
    let searches = registry.describe_all();
    let width = searches.iter().map(|(trigger, _)| trigger.len() + 1).max().unwrap_or(0);

    let mut listing = String::new();
    for (trigger, description) in searches {
        let trigger = format!("!{trigger}");
        let _ = writeln!(listing, "{trigger:<width$}  {description}");
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_listing_includes_custom_searches() {
        let mut registry = Registry::new();
        registry.set_custom_searches(&BTreeMap::from([(
            "rdoc".to_owned(),
            "docs.rs".to_owned(),
        )]));
        let listing = format_listing(&registry);

        let first = listing.lines().next().unwrap();
        assert!(first.starts_with('!'));
        let custom = listing.lines().find(|line| line.starts_with("!rdoc")).unwrap();
        assert_eq!(custom.trim_start_matches("!rdoc").trim(), "Custom: docs.rs");
    }
}
