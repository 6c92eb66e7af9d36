use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::fandub::MediaKind;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const ANIMATION_GENRE: i32 = 16;
/// v4 read-access tokens are long JWTs; v3 keys are 32 hex chars.
const BEARER_MIN_LEN: usize = 50;

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn fetch_title(&self, kind: MediaKind, id: i64) -> Result<TitleMetadata>;
    async fn discover_by_genre(&self, genre_id: i32) -> Result<Vec<TitleMetadata>>;
}

/// The subset of a TMDB movie/tv record the catalog reads. Everything else is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default, deserialize_with = "genre_names")]
    pub genres: Vec<String>,
}

impl TitleMetadata {
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.name.as_deref().filter(non_blank))
    }
}

fn non_blank(text: &&str) -> bool {
    !text.trim().is_empty()
}

fn genre_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GenreRef {
        Object { name: String },
        Name(String),
    }

    let raw: Option<Vec<GenreRef>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|g| match g {
            GenreRef::Object { name } => name,
            GenreRef::Name(name) => name,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TmdbAuth {
    Bearer(String),
    ApiKey(String),
}

impl TmdbAuth {
    fn from_credential(credential: &str) -> Self {
        if credential.len() > BEARER_MIN_LEN {
            TmdbAuth::Bearer(credential.to_string())
        } else {
            TmdbAuth::ApiKey(credential.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    auth: TmdbAuth,
    language: String,
}

impl TmdbClient {
    pub fn new(credential: &str, language: &str, timeout: Duration) -> Result<Self> {
        let user_agent = format!("grimoire/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            auth: TmdbAuth::from_credential(credential),
            language: language.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.tmdb_token, &config.tmdb_language, config.fetch_timeout)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{TMDB_BASE}{path}");
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("language", self.language.clone()));

        let mut req = self.client.get(&url);
        match &self.auth {
            TmdbAuth::Bearer(token) => req = req.bearer_auth(token),
            TmdbAuth::ApiKey(key) => query.push(("api_key", key.clone())),
        }

        let res = req.query(&query).send().await.context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TMDB {} -> {}: {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_title(&self, kind: MediaKind, id: i64) -> Result<TitleMetadata> {
        let path = format!("/{}/{}", kind.as_path(), id);
        self.get_json(&path, &[])
            .await
            .with_context(|| format!("fetching TMDB {} {}", kind.as_path(), id))
    }

    async fn discover_by_genre(&self, genre_id: i32) -> Result<Vec<TitleMetadata>> {
        #[derive(Deserialize)]
        struct DiscoverResponse {
            #[serde(default)]
            results: Vec<TitleMetadata>,
        }

        let genres = if genre_id == ANIMATION_GENRE {
            ANIMATION_GENRE.to_string()
        } else {
            format!("{ANIMATION_GENRE},{genre_id}")
        };
        let params = [
            ("with_genres", genres),
            ("with_original_language", "ja".to_string()),
            ("sort_by", "popularity.desc".to_string()),
        ];
        let data: DiscoverResponse = self
            .get_json("/discover/tv", &params)
            .await
            .with_context(|| format!("discovering TMDB genre {}", genre_id))?;
        Ok(data.results)
    }
}
