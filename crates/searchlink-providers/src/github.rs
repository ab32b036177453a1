//! GitHub repositories, users and gists.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use searchlink_engine::{Hit, ProviderError, SearchKind, SearchProvider, SearchRequest};
use tracing::{debug, info};

use crate::http::HttpClient;
use crate::web::WebSearch;

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ /]+").unwrap());

static GIST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z0-9]{32})(?:[#/](.*?))?$").unwrap());

static GIST_USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)/([a-z0-9]{32})(?:[#/](.*?))?$").unwrap());

static GIST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https://gist\.github\.com/\w+/[a-z0-9]{32})(?:[#/](.*?))?$").unwrap()
});

static GIST_PARTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://gist\.github\.com/(\w+)/([a-z0-9]+?)(?:[#/](.*?))?$").unwrap()
});

/// Direct profile or repository URL for `user` or `user/repo` terms.
#[must_use]
pub fn repository_url(terms: &str) -> Option<String> {
    let parts: Vec<&str> = SPLIT_RE.split(terms.trim()).filter(|part| !part.is_empty()).collect();
    match parts.as_slice() {
        [user, repo] => Some(format!("https://github.com/{user}/{repo}")),
        [user] => Some(format!("https://github.com/{user}")),
        _ => None,
    }
}

/// How gist terms identify a gist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GistTarget {
    /// Bare id; the owner is found by following the redirect.
    Id { id: String, file: Option<String> },
    /// Fully known URL, with an optional file anchor.
    Url { url: String, file: Option<String> },
    /// Anything else is searched for.
    Search(String),
}

#[must_use]
pub fn parse_gist_terms(terms: &str) -> GistTarget {
    let terms = terms.trim();
    let file = |m: Option<regex::Match<'_>>| m.map(|m| m.as_str().to_owned()).filter(|f| !f.is_empty());

    if let Some(caps) = GIST_ID_RE.captures(terms) {
        return GistTarget::Id {
            id: caps[1].to_owned(),
            file: file(caps.get(2)),
        };
    }
    if let Some(caps) = GIST_URL_RE.captures(terms) {
        return GistTarget::Url {
            url: caps[1].to_owned(),
            file: file(caps.get(2)),
        };
    }
    if let Some(caps) = GIST_USER_ID_RE.captures(terms) {
        return GistTarget::Url {
            url: format!("https://gist.github.com/{}/{}", &caps[1], &caps[2]),
            file: file(caps.get(3)),
        };
    }
    GistTarget::Search(terms.to_owned())
}

/// File name from a gist anchor: `file-hello-rs` is `hello.rs`.
#[must_use]
pub fn gist_file_name(anchor: &str) -> String {
    let name = anchor.strip_prefix("file-").unwrap_or(anchor);
    match name.rsplit_once('-') {
        Some((stem, ext)) => format!("{stem}.{ext}"),
        None => name.to_owned(),
    }
}

/// `<script>` embed for a gist URL.
#[must_use]
pub fn gist_embed(url: &str) -> Option<String> {
    let caps = GIST_PARTS_RE.captures(url)?;
    let (user, id) = (&caps[1], &caps[2]);
    let src = match caps.get(3).map(|m| m.as_str()).filter(|f| !f.is_empty()) {
        Some(file) => format!("https://gist.github.com/{user}/{id}.js?file={}", gist_file_name(file)),
        None => format!("https://gist.github.com/{user}/{id}.js"),
    };
    Some(format!("<script src=\"{src}\"></script>"))
}

/// Provider for `gh`, `gist` and `giste`.
#[derive(Debug, Clone)]
pub struct GitHub {
    http: Arc<HttpClient>,
    web: WebSearch,
}

impl GitHub {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        let web = WebSearch::new(Arc::clone(&http));
        Self { http, web }
    }

    fn exists(&self, url: &str) -> bool {
        matches!(self.http.head_status(url), Ok(status) if status < 400)
    }

    fn repository(&self, terms: &str) -> Result<Option<Hit>, ProviderError> {
        if let Some(url) = repository_url(terms) {
            if self.exists(&url) {
                return Ok(Some(Hit::untitled(url)));
            }
            info!(url = %url, "repository not found, searching");
        }
        Ok(self.web.site_result("github.com", terms)?.map(Hit::untitled))
    }

    fn gist(&self, terms: &str, embed: bool) -> Result<Option<Hit>, ProviderError> {
        let (url, file) = match parse_gist_terms(terms) {
            GistTarget::Id { id, file } => {
                let location = self
                    .http
                    .redirect_location(&format!("https://gist.github.com/{id}"))?;
                let Some(url) = location else {
                    return Ok(None);
                };
                (url, file)
            }
            GistTarget::Url { url, file } => (url, file),
            GistTarget::Search(terms) => {
                let Some(url) = self.web.site_result("gist.github.com", &terms)? else {
                    return Ok(None);
                };
                (url, None)
            }
        };
        let url = match file {
            Some(file) => format!("{url}#{file}"),
            None => url,
        };
        debug!(url = %url, "gist");

        if !GIST_PARTS_RE.is_match(&url) {
            return Ok(None);
        }
        if embed {
            return Ok(gist_embed(&url).map(|markup| Hit::embed("embed", markup)));
        }
        Ok(Some(Hit::untitled(url)))
    }
}

impl SearchProvider for GitHub {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        match request.kind {
            SearchKind::Gist { embed } => self.gist(request.terms, *embed),
            _ => self.repository(request.terms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_repository_url() {
        assert_eq!(
            repository_url("rust-lang/rust"),
            Some("https://github.com/rust-lang/rust".to_owned())
        );
        assert_eq!(repository_url("rust-lang rust"), repository_url("rust-lang/rust"));
        assert_eq!(repository_url("ttscoff"), Some("https://github.com/ttscoff".to_owned()));
        assert_eq!(repository_url("a fast web framework"), None);
    }

    #[test]
    fn test_gist_terms() {
        assert_eq!(
            parse_gist_terms(ID),
            GistTarget::Id {
                id: ID.to_owned(),
                file: None
            }
        );
        assert_eq!(
            parse_gist_terms(&format!("ttscoff/{ID}#file-hello-rs")),
            GistTarget::Url {
                url: format!("https://gist.github.com/ttscoff/{ID}"),
                file: Some("file-hello-rs".to_owned())
            }
        );
        assert_eq!(
            parse_gist_terms("markdown table script"),
            GistTarget::Search("markdown table script".to_owned())
        );
    }

    #[test]
    fn test_gist_url_terms() {
        let url = format!("https://gist.github.com/ttscoff/{ID}");
        assert_eq!(
            parse_gist_terms(&url),
            GistTarget::Url {
                url: url.clone(),
                file: None
            }
        );
    }

    #[test]
    fn test_gist_file_name() {
        assert_eq!(gist_file_name("file-hello-rs"), "hello.rs");
        assert_eq!(gist_file_name("file-my-script-sh"), "my-script.sh");
        assert_eq!(gist_file_name("README"), "README");
    }

    #[test]
    fn test_gist_embed() {
        assert_eq!(
            gist_embed(&format!("https://gist.github.com/ttscoff/{ID}")),
            Some(format!("<script src=\"https://gist.github.com/ttscoff/{ID}.js\"></script>"))
        );
        assert_eq!(
            gist_embed(&format!("https://gist.github.com/ttscoff/{ID}#file-hello-rs")),
            Some(format!(
                "<script src=\"https://gist.github.com/ttscoff/{ID}.js?file=hello.rs\"></script>"
            ))
        );
        assert_eq!(gist_embed("https://github.com/ttscoff"), None);
    }
}
