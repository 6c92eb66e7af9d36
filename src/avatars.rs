use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Avatar gallery from a JSON array of image URLs. A missing file is an empty gallery.
pub async fn load_avatars(path: &Path) -> Result<Vec<String>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    let avatars: Vec<String> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(avatars.into_iter().filter(|a| !a.trim().is_empty()).collect())
}
