use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LANGUAGE: &str = "pt-BR";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
const DEFAULT_FETCH_CONCURRENCY: usize = 4;
const DEFAULT_DAILY_GENRES: usize = 3;

pub const FANDUBS_FILE: &str = "fandubs.json";
pub const AVATARS_FILE: &str = "avatars.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub tmdb_token: String,
    pub tmdb_language: String,
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub daily_genre_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_token = get("TMDB_ACCESS_TOKEN")
            .ok_or_else(|| anyhow!("Missing required environment variable: TMDB_ACCESS_TOKEN"))?;
        let port: u16 = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let timeout_secs: u64 = parse_or(
            get("FETCH_TIMEOUT_SECS"),
            "FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than zero");
        }
        let fetch_concurrency: usize = parse_or(
            get("FETCH_CONCURRENCY"),
            "FETCH_CONCURRENCY",
            DEFAULT_FETCH_CONCURRENCY,
        )?;
        let daily_genre_count: usize = parse_or(
            get("DAILY_GENRE_COUNT"),
            "DAILY_GENRE_COUNT",
            DEFAULT_DAILY_GENRES,
        )?;

        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            tmdb_token,
            tmdb_language: get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            fetch_timeout: Duration::from_secs(timeout_secs),
            fetch_concurrency: fetch_concurrency.max(1),
            daily_genre_count,
        })
    }

    pub fn fandubs_path(&self) -> PathBuf {
        self.data_dir.join(FANDUBS_FILE)
    }

    pub fn avatars_path(&self) -> PathBuf {
        self.data_dir.join(AVATARS_FILE)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("TMDB_ACCESS_TOKEN", "abc")])).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.tmdb_language, "pt-BR");
        assert_eq!(config.fetch_timeout, Duration::from_secs(8));
        assert_eq!(config.fetch_concurrency, 4);
        assert_eq!(config.daily_genre_count, 3);
        assert_eq!(config.fandubs_path(), PathBuf::from("data/fandubs.json"));
        assert_eq!(config.avatars_path(), PathBuf::from("data/avatars.json"));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TMDB_ACCESS_TOKEN", "abc"),
            ("PORT", "8080"),
            ("TMDB_LANGUAGE", "en-US"),
            ("DATA_DIR", "/srv/grimoire"),
            ("FETCH_TIMEOUT_SECS", "2"),
            ("FETCH_CONCURRENCY", "0"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.tmdb_language, "en-US");
        assert_eq!(config.fetch_timeout, Duration::from_secs(2));
        assert_eq!(config.fetch_concurrency, 1);
        assert_eq!(
            config.fandubs_path(),
            PathBuf::from("/srv/grimoire/fandubs.json")
        );
    }

    #[test]
    fn requires_token() {
        let err = Config::from_lookup(lookup(&[("TMDB_ACCESS_TOKEN", "  ")])).unwrap_err();
        assert!(err.to_string().contains("TMDB_ACCESS_TOKEN"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Config::from_lookup(lookup(&[
            ("TMDB_ACCESS_TOKEN", "abc"),
            ("PORT", "eighty")
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("TMDB_ACCESS_TOKEN", "abc"),
            ("FETCH_TIMEOUT_SECS", "0")
        ]))
        .is_err());
    }
}
