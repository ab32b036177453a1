//! iTunes Search API: App Store, Mac App Store, movies, podcasts, music and
//! Apple Music links and embeds.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use searchlink_engine::{AppleMusic, Hit, Itunes, ProviderError, SearchKind, SearchProvider, SearchRequest};
use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpClient, encode};

const SEARCH_URL: &str = "https://itunes.apple.com/search";

static QUERY_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?[^/]+=").unwrap());

const SONG_EMBED_HEIGHT: u32 = 150;
const ALBUM_EMBED_HEIGHT: u32 = 450;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<Item>,
}

/// One search result; which fields are set depends on `wrapper_type`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub wrapper_type: Option<String>,
    pub kind: Option<String>,
    pub track_id: Option<u64>,
    pub collection_id: Option<u64>,
    pub track_name: Option<String>,
    pub collection_name: Option<String>,
    pub artist_name: Option<String>,
    pub track_view_url: Option<String>,
    pub collection_view_url: Option<String>,
    pub artist_link_url: Option<String>,
    pub seller_url: Option<String>,
}

impl Item {
    fn by_artist(&self, name: Option<&String>) -> Option<String> {
        let name = name?;
        Some(match &self.artist_name {
            Some(artist) => format!("{name} by {artist}"),
            None => name.clone(),
        })
    }

    /// Link and title by wrapper type: track, collection or artist.
    fn music_link(&self) -> Option<(String, String)> {
        match self.wrapper_type.as_deref()? {
            "track" => Some((self.track_view_url.clone()?, self.by_artist(self.track_name.as_ref())?)),
            "collection" => Some((
                self.collection_view_url.clone()?,
                self.by_artist(self.collection_name.as_ref())?,
            )),
            "artist" => Some((self.artist_link_url.clone()?, self.artist_name.clone()?)),
            _ => None,
        }
    }
}

/// Search API entity for an iTunes trigger.
#[must_use]
pub fn entity(kind: Itunes) -> &'static str {
    match kind {
        Itunes::IosApp { .. } => "iPadSoftware",
        Itunes::MacApp { .. } => "macSoftware",
        Itunes::Movie => "movie",
        Itunes::Podcast => "podcast",
        Itunes::Song => "song",
        Itunes::Artist => "musicArtist",
        Itunes::Album => "album",
    }
}

/// Search API `media` and `entity` for an Apple Music trigger.
#[must_use]
pub fn media_entity(target: AppleMusic) -> (&'static str, &'static str) {
    match target {
        AppleMusic::Podcast => ("podcast", ""),
        AppleMusic::Artist => ("music", "musicArtist"),
        AppleMusic::Album => ("music", "album"),
        AppleMusic::Song => ("music", "musicTrack"),
        AppleMusic::Any => ("music", ""),
    }
}

/// Link and title of an iTunes result, before the affiliate string.
#[must_use]
pub fn itunes_link(kind: Itunes, item: &Item) -> Option<(String, String)> {
    match kind {
        Itunes::Movie => Some((item.track_view_url.clone()?, item.track_name.clone()?)),
        Itunes::IosApp { developer } | Itunes::MacApp { developer } => {
            let url = if developer {
                item.seller_url.clone().or_else(|| item.track_view_url.clone())
            } else {
                item.track_view_url.clone()
            };
            Some((url?, item.track_name.clone()?))
        }
        Itunes::Podcast => Some((item.collection_view_url.clone()?, item.collection_name.clone()?)),
        Itunes::Song | Itunes::Artist | Itunes::Album => item.music_link(),
    }
}

/// Turn an iTunes link into an Apple Music link.
#[must_use]
pub fn to_apple_music(url: &str) -> String {
    let url = url.replacen("://itunes.apple.com", "://geo.itunes.apple.com", 1);
    if QUERY_PARAM_RE.is_match(&url) {
        format!("{url}&app=music")
    } else {
        format!("{url}?app=music")
    }
}

/// An Apple Music result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicResult {
    Song { id: u64, album: u64, url: String, title: String },
    Album { id: u64, url: String, title: String },
    Artist { url: String, title: String },
    Podcast { url: String, title: String },
}

impl MusicResult {
    /// Classify a result; URLs are converted to Apple Music links.
    #[must_use]
    pub fn from_item(item: &Item) -> Option<Self> {
        match item.wrapper_type.as_deref()? {
            "track" if item.kind.as_deref() == Some("podcast") => Some(Self::Podcast {
                url: to_apple_music(item.collection_view_url.as_deref()?),
                title: item.collection_name.clone()?,
            }),
            "track" => Some(Self::Song {
                id: item.track_id?,
                album: item.collection_id?,
                url: to_apple_music(item.track_view_url.as_deref()?),
                title: item.by_artist(item.track_name.as_ref())?,
            }),
            "collection" => Some(Self::Album {
                id: item.collection_id?,
                url: to_apple_music(item.collection_view_url.as_deref()?),
                title: item.by_artist(item.collection_name.as_ref())?,
            }),
            "artist" => Some(Self::Artist {
                url: to_apple_music(item.artist_link_url.as_deref()?),
                title: item.artist_name.clone()?,
            }),
            _ => None,
        }
    }

    fn link(&self) -> (&str, &str) {
        match self {
            Self::Song { url, title, .. }
            | Self::Album { url, title, .. }
            | Self::Artist { url, title }
            | Self::Podcast { url, title } => (url, title),
        }
    }

    /// Player iframe for songs and albums.
    #[must_use]
    pub fn embed(&self, country_code: &str, affiliate: &str) -> Option<String> {
        let country = country_code.to_lowercase();
        let (src, height) = match self {
            Self::Song { id, album, .. } => (
                format!("https://embed.music.apple.com/{country}/album/{album}?i={id}&app=music{affiliate}"),
                SONG_EMBED_HEIGHT,
            ),
            Self::Album { id, .. } => (
                format!("https://embed.music.apple.com/{country}/album/{id}?app=music{affiliate}"),
                ALBUM_EMBED_HEIGHT,
            ),
            Self::Artist { .. } | Self::Podcast { .. } => return None,
        };
        Some(format!(
            "<iframe src=\"{src}\" allow=\"autoplay *; encrypted-media *;\" frameborder=\"0\" \
             height=\"{height}\" style=\"width:100%;max-width:660px;overflow:hidden;background:transparent;\" \
             sandbox=\"allow-forms allow-popups allow-same-origin allow-scripts \
             allow-top-navigation-by-user-activation\"></iframe>"
        ))
    }
}

/// Provider for the iTunes and Apple Music triggers.
#[derive(Debug, Clone)]
pub struct ItunesSearch {
    http: Arc<HttpClient>,
}

impl ItunesSearch {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    fn first(&self, query: &str) -> Result<Option<Item>, ProviderError> {
        let url = format!("{SEARCH_URL}?{query}");
        let response: SearchResponse = self.http.get_json(&url)?;
        debug!(count = response.result_count, "iTunes search");
        if response.result_count == 0 {
            return Ok(None);
        }
        Ok(response.results.into_iter().next())
    }

    fn itunes(&self, kind: Itunes, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let query = format!(
            "term={}&country={}&entity={}",
            encode(request.terms),
            request.config.country_code,
            entity(kind)
        );
        let Some(item) = self.first(&query)? else {
            return Ok(None);
        };
        let Some((url, title)) = itunes_link(kind, &item) else {
            return Ok(None);
        };
        let developer = matches!(
            kind,
            Itunes::IosApp { developer: true } | Itunes::MacApp { developer: true }
        );
        let url = if developer {
            url
        } else {
            format!("{url}{}", request.config.itunes_affiliate)
        };
        Ok(Some(Hit::link(url, title)))
    }

    fn apple_music(
        &self,
        target: AppleMusic,
        embed: bool,
        request: &SearchRequest<'_>,
    ) -> Result<Option<Hit>, ProviderError> {
        let (media, entity) = media_entity(target);
        let query = format!(
            "term={}&country={}&media={media}&entity={entity}",
            encode(request.terms),
            request.config.country_code
        );
        let Some(result) = self.first(&query)?.as_ref().and_then(MusicResult::from_item) else {
            return Ok(None);
        };

        let affiliate = &request.config.itunes_affiliate;
        if embed && let Some(markup) = result.embed(&request.config.country_code, affiliate) {
            return Ok(Some(Hit::embed("embed", markup)));
        }
        let (url, title) = result.link();
        Ok(Some(Hit::link(format!("{url}{affiliate}"), title)))
    }
}

impl SearchProvider for ItunesSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        match request.kind {
            SearchKind::Itunes(kind) => self.itunes(*kind, request),
            SearchKind::AppleMusic { target, embed } => self.apple_music(*target, *embed, request),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SONG: &str = r#"{"resultCount":1,"results":[{"wrapperType":"track","kind":"song",
        "trackId":1440857781,"collectionId":1440857000,"trackName":"Heroes","artistName":"David Bowie",
        "trackViewUrl":"https://music.apple.com/us/album/heroes/1440857000?i=1440857781&uo=4"}]}"#;

    fn first_item(json: &str) -> Item {
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        response.results.into_iter().next().unwrap()
    }

    #[test]
    fn test_itunes_song_title() {
        let item = first_item(SONG);
        let (url, title) = itunes_link(Itunes::Song, &item).unwrap();
        assert_eq!(title, "Heroes by David Bowie");
        assert!(url.starts_with("https://music.apple.com/"));
    }

    #[test]
    fn test_developer_link_prefers_seller_url() {
        let item = Item {
            track_name: Some("Marked 2".to_owned()),
            track_view_url: Some("https://apps.apple.com/app/id890031187".to_owned()),
            seller_url: Some("https://marked2app.com".to_owned()),
            ..Item::default()
        };
        assert_eq!(
            itunes_link(Itunes::MacApp { developer: true }, &item).unwrap().0,
            "https://marked2app.com"
        );
        assert_eq!(
            itunes_link(Itunes::MacApp { developer: false }, &item).unwrap().0,
            "https://apps.apple.com/app/id890031187"
        );
    }

    #[test]
    fn test_to_apple_music() {
        assert_eq!(
            to_apple_music("https://itunes.apple.com/us/album/x/123"),
            "https://geo.itunes.apple.com/us/album/x/123?app=music"
        );
        assert_eq!(
            to_apple_music("https://music.apple.com/us/album/x/1?i=2"),
            "https://music.apple.com/us/album/x/1?i=2&app=music"
        );
    }

    #[test]
    fn test_song_embed() {
        let result = MusicResult::from_item(&first_item(SONG)).unwrap();
        let markup = result.embed("US", "&at=x").unwrap();
        assert!(markup.starts_with(
            "<iframe src=\"https://embed.music.apple.com/us/album/1440857000?i=1440857781&app=music&at=x\""
        ));
        assert!(markup.contains("height=\"150\""));
        assert!(markup.ends_with("></iframe>"));
    }

    #[test]
    fn test_artist_has_no_embed() {
        let item = Item {
            wrapper_type: Some("artist".to_owned()),
            artist_name: Some("David Bowie".to_owned()),
            artist_link_url: Some("https://music.apple.com/us/artist/david-bowie/539".to_owned()),
            ..Item::default()
        };
        let result = MusicResult::from_item(&item).unwrap();
        assert_eq!(result.embed("US", ""), None);
        assert_eq!(
            result.link(),
            ("https://music.apple.com/us/artist/david-bowie/539?app=music", "David Bowie")
        );
    }

    #[test]
    fn test_podcast_track_is_podcast() {
        let item = Item {
            wrapper_type: Some("track".to_owned()),
            kind: Some("podcast".to_owned()),
            collection_name: Some("Overtired".to_owned()),
            collection_view_url: Some("https://podcasts.apple.com/us/podcast/overtired/id944".to_owned()),
            ..Item::default()
        };
        assert!(matches!(MusicResult::from_item(&item), Some(MusicResult::Podcast { .. })));
    }
}
