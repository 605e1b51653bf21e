use serenity::model::id::UserId;
use std::{fmt, time::Duration};
use url::Url;

/// A playable item as resolved by the audio node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub author: String,
    pub uri: Option<String>,
    pub length: Duration,
    pub is_stream: bool,
    /// Opaque track blob the node hands back on resolve and expects on play.
    pub encoded: String,
    pub requested_by: UserId,
}

/// Outcome of resolving a user query against the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    Track(Track),
    Search(Vec<Track>),
    Playlist { name: String, tracks: Vec<Track> },
    Empty,
}

/// Only two modes exist: no repeat, or re-append finished tracks to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    None,
    Queue,
}

impl LoopMode {
    pub fn toggled(self) -> Self {
        match self {
            LoopMode::None => LoopMode::Queue,
            LoopMode::Queue => LoopMode::None,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::None => f.write_str("none"),
            LoopMode::Queue => f.write_str("queue"),
        }
    }
}

fn parse_web_url(query: &str) -> Option<Url> {
    Url::parse(query)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Builds the identifier sent to the node's load endpoint.
///
/// Links go through untouched so the node picks the right source; plain text
/// becomes a search on `platform` (e.g. `ytmsearch:never gonna give you up`).
pub fn search_identifier(query: &str, platform: &str) -> String {
    let query = query.trim();
    if parse_web_url(query).is_some() {
        query.to_string()
    } else {
        format!("{}:{}", platform, query)
    }
}

pub fn is_spotify_url(query: &str) -> bool {
    parse_web_url(query.trim())
        .and_then(|url| url.host_str().map(|host| host.ends_with("spotify.com")))
        .unwrap_or(false)
}
