use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod embed;
mod resolve;
pub mod seasons;
mod store;

pub use resolve::{FandubResolver, ResolvedEpisode, ResolvedTitle, ResolverOptions};
pub use seasons::{EpisodeEmbed, RawSeasons, SeasonEmbed};
pub use store::{CatalogFile, CatalogSource, JsonCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Movie,
}

impl MediaKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Tv => "tv",
            MediaKind::Movie => "movie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCredit {
    pub character: String,
    pub voice_actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_image: Option<String>,
}

/// One fan-curated title as stored in `fandubs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FandubEntry {
    pub tmdb_id: i64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub studio: Studio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<RawSeasons>,
    #[serde(default)]
    pub cast: Vec<VoiceCredit>,
}

impl FandubEntry {
    pub fn normalized_embed_url(&self) -> Option<String> {
        self.embed_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(embed::normalize)
    }
}

#[derive(Debug, Error)]
pub enum FandubError {
    #[error("Fandub entry {0} not found")]
    EntryNotFound(i64),

    #[error("Episode S{season}E{episode} not found for fandub {id}")]
    EpisodeNotFound { id: i64, season: u32, episode: u32 },

    #[error("Metadata fetch failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Catalog unreadable: {0}")]
    Catalog(String),
}
