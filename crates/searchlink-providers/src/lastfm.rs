//! Last.fm track, artist and album search.

use std::sync::Arc;

use searchlink_engine::{Hit, LastFm, ProviderError, SearchKind, SearchProvider, SearchRequest};
use serde::Deserialize;
use tracing::debug;

use crate::http::{HttpClient, encode};

const API_URL: &str = "https://ws.audioscrobbler.com/2.0/";

#[derive(Debug, Default, Deserialize)]
pub struct LastFmResponse {
    pub results: Option<Matches>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Matches {
    pub trackmatches: Option<TrackMatches>,
    pub artistmatches: Option<ArtistMatches>,
    pub albummatches: Option<AlbumMatches>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackMatches {
    #[serde(default)]
    pub track: Vec<LastFmItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistMatches {
    #[serde(default)]
    pub artist: Vec<LastFmItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumMatches {
    #[serde(default)]
    pub album: Vec<LastFmItem>,
}

/// A matched track, artist or album. Artists have no `artist` field.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LastFmItem {
    pub name: String,
    pub artist: Option<String>,
    pub url: String,
}

impl LastFmItem {
    fn title(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{} by {artist}", self.name),
            None => self.name.clone(),
        }
    }
}

/// URL and title of the first match for `entity`.
#[must_use]
pub fn lastfm_link(entity: LastFm, response: &LastFmResponse) -> Option<(String, String)> {
    let matches = response.results.as_ref()?;
    let item = match entity {
        LastFm::Track => matches.trackmatches.as_ref()?.track.first(),
        LastFm::Artist => matches.artistmatches.as_ref()?.artist.first(),
        LastFm::Album => matches.albummatches.as_ref()?.album.first(),
    }?;
    if item.url.is_empty() {
        return None;
    }
    Some((item.url.clone(), item.title()))
}

#[derive(Debug, Clone)]
pub struct LastFmSearch {
    http: Arc<HttpClient>,
}

impl LastFmSearch {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

impl SearchProvider for LastFmSearch {
    fn search(&self, request: &SearchRequest<'_>) -> Result<Option<Hit>, ProviderError> {
        let SearchKind::LastFm(entity) = request.kind else {
            return Ok(None);
        };
        let key = request.config.lastfm_api_key.as_str();
        if key.is_empty() {
            return Err(ProviderError::Unavailable("Last.fm API key".to_owned()));
        }

        let name = entity.entity();
        let url = format!(
            "{API_URL}?method={name}.search&{name}={}&api_key={}&format=json",
            encode(request.terms),
            encode(key)
        );
        let response: LastFmResponse = self.http.get_json(&url)?;
        let found = lastfm_link(*entity, &response);
        debug!(entity = name, found = found.is_some(), "Last.fm search");
        Ok(found.map(|(url, title)| Hit::link(url, title)))
    }
}
