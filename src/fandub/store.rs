use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{FandubEntry, FandubError};

/// On-disk shape: `{ "fandubs": [ ... ] }`. Entries stay raw until each is checked on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub fandubs: Vec<serde_json::Value>,
}

impl CatalogFile {
    /// Decodes every entry that fits the catalog model; the rest are logged and skipped.
    pub fn into_entries(self) -> Vec<FandubEntry> {
        self.fandubs
            .into_iter()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let tmdb_id = raw.get("tmdbId").cloned();
                match serde_json::from_value::<FandubEntry>(raw) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(
                            "Skipping catalog entry #{} (tmdbId {}): {}",
                            idx,
                            tmdb_id.unwrap_or(serde_json::Value::Null),
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Vec<FandubEntry>, FandubError>;

    async fn find(&self, tmdb_id: i64) -> Result<Option<FandubEntry>, FandubError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|e| e.tmdb_id == tmdb_id))
    }
}

/// Catalog backed by a JSON file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonCatalog {
    async fn load(&self) -> Result<Vec<FandubEntry>, FandubError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No catalog at {}, treating as empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(FandubError::Catalog(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let file: CatalogFile = serde_json::from_slice(&bytes)
            .map_err(|e| FandubError::Catalog(format!("{}: {}", self.path.display(), e)))?;
        Ok(file.into_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fandub::MediaKind;
    use std::io::Write;

    const CATALOG: &str = r#"{
      "fandubs": [
        {
          "tmdbId": 209867,
          "type": "tv",
          "title": "Frieren",
          "studio": { "name": "Estúdio Arcano", "socialLink": "https://instagram.com/arcano" },
          "seasons": { "1": { "1": "https://youtu.be/abc", "2": "https://youtu.be/def" } },
          "cast": [ { "character": "Frieren", "voiceActor": "Ana" } ]
        },
        {
          "tmdbId": 129,
          "type": "movie",
          "title": "A Viagem de Chihiro",
          "studio": { "name": "Dublagem Livre" },
          "embedUrl": "https://drive.google.com/file/d/XYZ/view"
        }
      ]
    }"#;

    #[tokio::test]
    async fn loads_entries_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = JsonCatalog::new(file.path());
        let entries = catalog.load().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, MediaKind::Tv);
        assert_eq!(entries[0].cast[0].voice_actor, "Ana");
        assert_eq!(entries[1].studio.social_link, None);
        assert!(entries[1].cast.is_empty());

        let movie = catalog.find(129).await.unwrap().unwrap();
        assert_eq!(
            movie.normalized_embed_url().as_deref(),
            Some("https://drive.google.com/file/d/XYZ/preview")
        );
        assert!(catalog.find(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::new(dir.path().join("fandubs.json"));
        assert!(catalog.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_a_catalog_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = JsonCatalog::new(file.path()).load().await.unwrap_err();
        assert!(matches!(err, FandubError::Catalog(_)));
    }

    #[tokio::test]
    async fn bad_entries_are_skipped_not_fatal() {
        let raw = r#"{
          "fandubs": [
            { "tmdbId": 1, "type": "tv", "title": "Um", "studio": { "name": "A" } },
            { "tmdbId": 2, "type": "ova", "title": "Dois", "studio": { "name": "B" } },
            { "tmdbId": 3, "type": "tv", "studio": { "name": "C" } },
            { "tmdbId": 4, "type": "tv", "title": "Quatro", "studio": { "name": "D" },
              "seasons": { "1": { "1": null } } },
            { "tmdbId": 5, "type": "movie", "title": "Cinco", "studio": { "name": "E" } }
          ]
        }"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let catalog = JsonCatalog::new(file.path());
        let ids: Vec<i64> = catalog
            .load()
            .await
            .unwrap()
            .iter()
            .map(|e| e.tmdb_id)
            .collect();
        assert_eq!(ids, vec![1, 5]);
        assert!(catalog.find(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fandubs_that_is_not_a_list_is_a_catalog_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "fandubs": { "tmdbId": 1 } }"#).unwrap();

        let err = JsonCatalog::new(file.path()).load().await.unwrap_err();
        assert!(matches!(err, FandubError::Catalog(_)));
    }

    #[tokio::test]
    async fn file_without_fandubs_key_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();
        assert!(JsonCatalog::new(file.path()).load().await.unwrap().is_empty());
    }
}
