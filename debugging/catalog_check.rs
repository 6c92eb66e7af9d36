//! Load a fandub catalog and print its season/episode layout.
//! Usage:
//!   cargo run --bin catalog_check -- [path/to/fandubs.json]
//! Without an argument, reads $DATA_DIR/fandubs.json (DATA_DIR defaults to `data`, .env supported).
//! Links that only normalize through the blind Drive `/preview` suffix are flagged.

use anyhow::{bail, Result};
use dotenvy::dotenv;
use grimoire::config::FANDUBS_FILE;
use grimoire::fandub::embed::{self, EmbedKind};
use grimoire::fandub::seasons;
use grimoire::fandub::{CatalogSource, JsonCatalog};
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let path = match env::args().nth(1) {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
            .join(FANDUBS_FILE),
    };
    if !path.exists() {
        bail!("No catalog at {}", path.display());
    }

    let entries = JsonCatalog::new(&path).load().await?;
    println!("{} entries in {}", entries.len(), path.display());

    let mut flagged = 0usize;
    for entry in &entries {
        println!(
            "\n[{}] {} ({}) by {}",
            entry.tmdb_id,
            entry.title,
            entry.kind.as_path(),
            entry.studio.name
        );

        if let Some(url) = entry.embed_url.as_deref() {
            println!("  embed: {}", embed::normalize(url));
            if embed::classify(url) == EmbedKind::DriveFallback {
                println!("  !! drive fallback: {}", url);
                flagged += 1;
            }
        }

        let Some(raw) = entry.seasons.as_ref() else {
            continue;
        };
        for season in seasons::organize_seasons(raw) {
            let numbers: Vec<String> = season
                .episodes
                .iter()
                .map(|e| e.episode.to_string())
                .collect();
            println!(
                "  season {}: {} episodes [{}]",
                season.season,
                seasons::season_episode_count(raw, season.season),
                numbers.join(", ")
            );
        }
        println!("  total: {}", seasons::total_episode_count(raw));

        for (season_key, episodes) in raw {
            for (episode_key, url) in episodes {
                if embed::classify(url) == EmbedKind::DriveFallback {
                    println!("  !! drive fallback S{}E{}: {}", season_key, episode_key, url);
                    flagged += 1;
                }
            }
        }
    }

    if flagged > 0 {
        println!("\n{} link(s) rely on the drive fallback rewrite", flagged);
    }
    Ok(())
}
