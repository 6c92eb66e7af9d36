//! Season/episode index over a catalog entry's raw `{season: {episode: url}}` map.
//!
//! Storage keeps numbers as strings with no ordering guarantee. Everything in
//! here works on the parsed numeric view of those keys, so lookups, counts and
//! ordering agree with each other. Keys that are not integers are ignored.

use serde::Serialize;
use std::collections::HashMap;

use super::embed;

pub type RawEpisodes = HashMap<String, String>;
pub type RawSeasons = HashMap<String, RawEpisodes>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeEmbed {
    pub episode: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonEmbed {
    pub season: u32,
    pub episodes: Vec<EpisodeEmbed>,
}

fn parse_key(key: &str) -> Option<u32> {
    key.trim().parse().ok()
}

/// Entries whose key parses as a number, sorted ascending by that number.
fn numbered<V>(map: &HashMap<String, V>) -> Vec<(u32, &V)> {
    let mut out: Vec<(u32, &V)> = map
        .iter()
        .filter_map(|(key, value)| parse_key(key).map(|n| (n, value)))
        .collect();
    out.sort_by_key(|(n, _)| *n);
    out
}

fn find_numbered<V>(map: &HashMap<String, V>, number: u32) -> Option<&V> {
    map.get(&number.to_string()).or_else(|| {
        map.iter()
            .find(|(key, _)| parse_key(key) == Some(number))
            .map(|(_, value)| value)
    })
}

pub fn organize_seasons(seasons: &RawSeasons) -> Vec<SeasonEmbed> {
    numbered(seasons)
        .into_iter()
        .map(|(season, episodes)| SeasonEmbed {
            season,
            episodes: numbered(episodes)
                .into_iter()
                .map(|(episode, raw)| EpisodeEmbed {
                    episode,
                    url: embed::normalize(raw),
                })
                .collect(),
        })
        .collect()
}

/// Normalized URL for one episode, `None` when the season or episode is missing.
pub fn episode_url(seasons: &RawSeasons, season: u32, episode: u32) -> Option<String> {
    let episodes = find_numbered(seasons, season)?;
    let raw = find_numbered(episodes, episode)?;
    if raw.is_empty() {
        return None;
    }
    Some(embed::normalize(raw))
}

pub fn season_episode_count(seasons: &RawSeasons, season: u32) -> usize {
    find_numbered(seasons, season)
        .map(|episodes| numbered(episodes).len())
        .unwrap_or(0)
}

pub fn total_episode_count(seasons: &RawSeasons) -> usize {
    numbered(seasons)
        .into_iter()
        .map(|(_, episodes)| numbered(episodes).len())
        .sum()
}
