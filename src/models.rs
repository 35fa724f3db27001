use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum MediaKind {
    #[default]
    Movie,
    Series,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
    pub poster: Option<String>,
    pub kind: MediaKind,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub title: String,
    pub url: String,
    pub kind: MediaKind,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub tags: Vec<String>,
    pub year: Option<u32>,
    pub rating: Option<f32>,
    pub cast: Vec<String>,
    pub trailer: Option<String>,
    pub recommendations: Vec<CatalogEntry>,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub url: String,
    pub name: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl Episode {
    /// Episodes without a season belong to one implicit first season.
    pub fn sort_key(&self) -> (u32, u32) {
        (self.season.unwrap_or(1), self.episode.unwrap_or(0))
    }
}

pub fn sort_episodes(episodes: &mut [Episode]) {
    episodes.sort_by_key(Episode::sort_key);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LinkKind {
    Hls,
    Direct,
}

impl LinkKind {
    pub fn from_url(url: &str) -> LinkKind {
        if url.contains(".m3u8") {
            LinkKind::Hls
        } else {
            LinkKind::Direct
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLink {
    pub url: String,
    pub label: String,
    pub referer: String,
    pub kind: LinkKind,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub label: String,
    pub language: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExtractedMedia {
    pub streams: Vec<ResolvedLink>,
    pub subtitles: Vec<SubtitleTrack>,
}

impl ExtractedMedia {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.subtitles.is_empty()
    }
}
