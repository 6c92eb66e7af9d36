use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::seasons::{self, SeasonEmbed};
use super::{CatalogSource, FandubEntry, FandubError, MediaKind, Studio, VoiceCredit};
use crate::config::Config;
use crate::tmdb::{TitleMetadata, TmdbApi};

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    pub fetch_timeout: Duration,
    pub concurrency: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(8),
            concurrency: 4,
        }
    }
}

impl From<&Config> for ResolverOptions {
    fn from(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout,
            concurrency: config.fetch_concurrency,
        }
    }
}

/// Provider metadata with the catalog's fields laid over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTitle {
    #[serde(flatten)]
    pub metadata: TitleMetadata,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub is_fandub: bool,
    pub studio: Studio,
    pub cast: Vec<VoiceCredit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<SeasonEmbed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEpisode {
    pub season: u32,
    pub episode: u32,
    pub url: String,
}

pub struct FandubResolver {
    catalog: Arc<dyn CatalogSource>,
    tmdb: Arc<dyn TmdbApi>,
    options: ResolverOptions,
}

impl FandubResolver {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        tmdb: Arc<dyn TmdbApi>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            catalog,
            tmdb,
            options,
        }
    }

    /// Every catalog entry whose metadata could be fetched, in catalog order.
    pub async fn list(&self) -> Result<Vec<ResolvedTitle>, FandubError> {
        let entries = self.catalog.load().await?;
        let total = entries.len();

        let resolved: Vec<ResolvedTitle> = stream::iter(entries)
            .map(|entry| async move {
                match self.fetch_metadata(&entry).await {
                    Ok(meta) => Some(overlay(meta, &entry)),
                    Err(e) => {
                        warn!(
                            tmdb_id = entry.tmdb_id,
                            "Skipping fandub '{}' in listing: {}", entry.title, e
                        );
                        None
                    }
                }
            })
            .buffered(self.options.concurrency.max(1))
            .filter_map(|r| async move { r })
            .collect()
            .await;

        info!("Resolved {}/{} fandub entries", resolved.len(), total);
        Ok(resolved)
    }

    pub async fn get(&self, tmdb_id: i64) -> Result<ResolvedTitle, FandubError> {
        let entry = self.find_entry(tmdb_id).await?;
        let meta = self.fetch_metadata(&entry).await?;

        let mut resolved = overlay(meta, &entry);
        if let Some(raw) = entry.seasons.as_ref() {
            resolved.seasons = Some(seasons::organize_seasons(raw));
            resolved.total_episodes = Some(seasons::total_episode_count(raw));
        }
        debug!(tmdb_id, "Resolved fandub '{}'", entry.title);
        Ok(resolved)
    }

    pub async fn episode(
        &self,
        tmdb_id: i64,
        season: u32,
        episode: u32,
    ) -> Result<ResolvedEpisode, FandubError> {
        let entry = self.find_entry(tmdb_id).await?;
        let url = entry
            .seasons
            .as_ref()
            .and_then(|raw| seasons::episode_url(raw, season, episode))
            .ok_or(FandubError::EpisodeNotFound {
                id: tmdb_id,
                season,
                episode,
            })?;
        Ok(ResolvedEpisode {
            season,
            episode,
            url,
        })
    }

    async fn find_entry(&self, tmdb_id: i64) -> Result<FandubEntry, FandubError> {
        self.catalog
            .find(tmdb_id)
            .await?
            .ok_or(FandubError::EntryNotFound(tmdb_id))
    }

    async fn fetch_metadata(&self, entry: &FandubEntry) -> Result<TitleMetadata, FandubError> {
        let fetch = self.tmdb.fetch_title(entry.kind, entry.tmdb_id);
        match tokio::time::timeout(self.options.fetch_timeout, fetch).await {
            Ok(Ok(meta)) => Ok(meta),
            Ok(Err(e)) => Err(FandubError::Upstream(e)),
            Err(_) => Err(FandubError::Upstream(anyhow!(
                "timed out after {:?} fetching {} {}",
                self.options.fetch_timeout,
                entry.kind.as_path(),
                entry.tmdb_id
            ))),
        }
    }
}

fn overlay(mut meta: TitleMetadata, entry: &FandubEntry) -> ResolvedTitle {
    meta.id = entry.tmdb_id;
    if meta.display_title().is_none() {
        match entry.kind {
            MediaKind::Movie => meta.title = Some(entry.title.clone()),
            MediaKind::Tv => meta.name = Some(entry.title.clone()),
        }
    }
    ResolvedTitle {
        metadata: meta,
        kind: entry.kind,
        is_fandub: true,
        studio: entry.studio.clone(),
        cast: entry.cast.clone(),
        embed_url: entry.normalized_embed_url(),
        seasons: None,
        total_episodes: None,
    }
}
