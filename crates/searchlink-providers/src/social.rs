//! Social network profile links.

use std::sync::LazyLock;

use regex::Regex;
use searchlink_engine::{Hit, ProviderError, SearchKind, SearchProvider, SearchRequest, Social};

static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^@?[0-9a-z_]+$").unwrap());

static MASTODON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^@?([0-9a-z_]+)@([0-9a-z_.]+)$").unwrap());

static URL_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://(www\.)?").unwrap());

/// Profile URL and display handle for `handle` on `network`.
pub fn profile(network: Social, handle: &str) -> Result<(String, String), ProviderError> {
    let handle = handle.trim();
    let user = match network {
        Social::Mastodon => {
            let caps = MASTODON_RE.captures(handle).ok_or_else(|| invalid(network, handle))?;
            let (user, host) = (&caps[1], &caps[2]);
            return Ok((format!("https://{host}/@{user}"), format!("@{user}@{host}")));
        }
        _ if HANDLE_RE.is_match(handle) => handle.trim_start_matches('@'),
        _ => return Err(invalid(network, handle)),
    };
    let url = match network {
        Social::Twitter => format!("https://twitter.com/{user}"),
        Social::Facebook => format!("https://www.facebook.com/{user}"),
        Social::Instagram => format!("https://www.instagram.com/{user}/"),
        Social::LinkedIn => format!("https://www.linkedin.com/in/{user}/"),
        Social::Mastodon => format!("https://mastodon.social/@{user}"),
    };
    let display = match network {
        Social::Twitter | Social::Instagram => format!("@{user}"),
        _ => user.to_owned(),
    };
    Ok((url, display))
}

fn invalid(network: Social, handle: &str) -> ProviderError {
    let noun = match network {
        Social::Twitter => "handle",
        _ => "username",
    };
    ProviderError::InvalidInput(format!("{handle} is not a valid {} {noun}", network.label()))
}

/// Fill a `%user%`, `%service%`, `%url%` title template.
#[must_use]
pub fn render_template(template: &str, user: &str, service: &str, url: &str) -> String {
    let short_url = URL_PREFIX_RE.replace(url, "");
    let short_url = short_url.trim_end_matches('/');
    template
        .replacen("%user%", user, 1)
        .replacen("%service%", service, 1)
        .replacen("%url%", short_url, 1)
}

/// Social provider for `@t`, `@f`, `@i`, `@l` and `@m`.
///
/// Needs no network access; the title is the rendered template and also
/// becomes the link text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocialProfiles;

impl SearchProvider for SocialProfiles {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let SearchKind::SocialHandle(network) = request.kind else {
            return Ok(None);
        };
        let (url, user) = profile(*network, request.terms)?;
        let title = render_template(&request.config.social_template, &user, network.label(), &url);
        Ok(Some(Hit::link(url, title.clone()).with_link_text(title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use searchlink_config::Config;

    #[test]
    fn test_profiles() {
        assert_eq!(
            profile(Social::Twitter, "@rustlang").unwrap(),
            ("https://twitter.com/rustlang".to_owned(), "@rustlang".to_owned())
        );
        assert_eq!(
            profile(Social::LinkedIn, "ferris").unwrap().0,
            "https://www.linkedin.com/in/ferris/"
        );
        assert_eq!(
            profile(Social::Mastodon, "@rust@fosstodon.org").unwrap(),
            ("https://fosstodon.org/@rust".to_owned(), "@rust@fosstodon.org".to_owned())
        );
    }

    #[test]
    fn test_invalid_handles() {
        assert_eq!(
            profile(Social::Twitter, "not a handle").unwrap_err().to_string(),
            "not a handle is not a valid Twitter handle"
        );
        assert_eq!(
            profile(Social::Mastodon, "rust").unwrap_err().to_string(),
            "rust is not a valid Mastodon username"
        );
    }

    #[test]
    fn test_render_template() {
        assert_eq!(
            render_template("%service%/%user%", "@rustlang", "Twitter", "https://twitter.com/rustlang"),
            "Twitter/@rustlang"
        );
        assert_eq!(
            render_template("%user% (%url%)", "ferris", "LinkedIn", "https://www.linkedin.com/in/ferris/"),
            "ferris (linkedin.com/in/ferris)"
        );
    }

    #[test]
    fn test_link_text_is_title() {
        let config = Config::default();
        let kind = SearchKind::SocialHandle(Social::Twitter);
        let request = SearchRequest {
            trigger: "@t",
            kind: &kind,
            terms: "rustlang",
            link_text: "",
            config: &config,
        };
        let hit = SocialProfiles.search(&request).unwrap().unwrap();
        assert_eq!(hit.url, "https://twitter.com/rustlang");
        assert_eq!(hit.title.as_deref(), Some("Twitter/@rustlang"));
        assert_eq!(hit.link_text.as_deref(), Some("Twitter/@rustlang"));
    }
}
