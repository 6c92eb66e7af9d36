//! Rewrites share links into URLs a player frame can embed directly.
//!
//! Every function here is total: unknown shapes come back unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

const DRIVE_HOST: &str = "drive.google.com";
const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    /// Drive link with a recognizable file id.
    Drive,
    /// Drive link that only gets the blind `/preview` suffix treatment.
    DriveFallback,
    YouTube,
    /// Anything else, served as-is.
    Direct,
}

pub fn normalize(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if url.contains(DRIVE_HOST) {
        return format_drive_url(url);
    }
    if url.contains("youtube.com") || url.contains("youtu.be") {
        return format_youtube_url(url);
    }
    url.to_string()
}

pub fn classify(url: &str) -> EmbedKind {
    if url.contains(DRIVE_HOST) {
        if drive_file_id(url).is_some() || url.contains("/view") || url.ends_with("/preview") {
            return EmbedKind::Drive;
        }
        return EmbedKind::DriveFallback;
    }
    if (url.contains("youtube.com") || url.contains("youtu.be")) && youtube_video_id(url).is_some()
    {
        return EmbedKind::YouTube;
    }
    EmbedKind::Direct
}

pub fn format_drive_url(url: &str) -> String {
    if url.is_empty() || !url.contains(DRIVE_HOST) {
        return url.to_string();
    }
    if let Some(id) = drive_file_id(url) {
        return format!("https://{DRIVE_HOST}/file/d/{id}/preview");
    }
    if url.contains("/view") {
        return match VIEW_SUFFIX.find(url) {
            Some(m) => format!("{}/preview", &url[..m.start()]),
            None => url.to_string(),
        };
    }
    if !url.ends_with("/preview") {
        return format!("{url}/preview");
    }
    url.to_string()
}

pub fn format_youtube_url(url: &str) -> String {
    match youtube_video_id(url) {
        Some(id) => format!("{YOUTUBE_EMBED}/{id}"),
        None => url.to_string(),
    }
}

static DRIVE_FILE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("drive id regex should compile"));
static VIEW_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/view(\?.*)?$").expect("view suffix regex should compile"));
static WATCH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]v=([A-Za-z0-9_-]+)").expect("watch regex should compile"));
static SHORT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"youtu\.be/([A-Za-z0-9_-]+)").expect("short link regex should compile")
});

/// A `/d/preview` produced by the fallback rewrite is not a file id.
fn drive_file_id(url: &str) -> Option<&str> {
    let id = DRIVE_FILE_ID.captures(url)?.get(1)?.as_str();
    if id == "preview" && url.ends_with("/preview") {
        return None;
    }
    Some(id)
}

fn youtube_video_id(url: &str) -> Option<&str> {
    if url.contains("youtube.com/watch") {
        if let Some(caps) = WATCH_PARAM.captures(url) {
            return caps.get(1).map(|m| m.as_str());
        }
    }
    SHORT_LINK
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
