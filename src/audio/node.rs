use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use thiserror::Error;

use super::track::{LoadResult, Track};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("voice connection failed: {0}")]
    Connect(String),
    #[error("track resolve failed: {0}")]
    Resolve(String),
    #[error("{action} request failed: {reason}")]
    Request { action: &'static str, reason: String },
    #[error("no player exists for guild {0}")]
    NoPlayer(GuildId),
}

impl NodeError {
    pub fn request(action: &'static str, reason: impl ToString) -> Self {
        Self::Request {
            action,
            reason: reason.to_string(),
        }
    }
}

/// Requests this bot makes to the external audio node.
///
/// The node owns decoding and streaming. Everything here is keyed by guild,
/// and a guild has at most one player on the node at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioNode: Send + Sync {
    /// Resolves a free-text query or link into playable tracks.
    async fn resolve(
        &self,
        guild_id: GuildId,
        query: &str,
        requested_by: UserId,
    ) -> Result<LoadResult, NodeError>;

    /// Joins `voice_channel` and creates the node-side player for the guild.
    async fn connect(&self, guild_id: GuildId, voice_channel: ChannelId) -> Result<(), NodeError>;

    /// Replaces whatever the guild's player is doing with `track`.
    async fn play(&self, guild_id: GuildId, track: &Track) -> Result<(), NodeError>;

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<(), NodeError>;

    /// Stops the current track. The node answers with a track-end event.
    async fn stop(&self, guild_id: GuildId) -> Result<(), NodeError>;

    async fn set_volume(&self, guild_id: GuildId, volume: u16) -> Result<(), NodeError>;

    /// Deletes the player and leaves the voice channel.
    async fn destroy(&self, guild_id: GuildId) -> Result<(), NodeError>;
}

/// Why the node ended a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

impl TrackEndReason {
    /// Whether the queue moves on after this end. Only a replaced track
    /// leaves the session as it is.
    pub fn may_start_next(self) -> bool {
        self != TrackEndReason::Replaced
    }

    /// Whether queue loop may put the ended track back. Tracks that failed
    /// to load or were cleaned up by the node are dropped.
    pub fn requeues(self) -> bool {
        matches!(self, TrackEndReason::Finished | TrackEndReason::Stopped)
    }
}

/// Lifecycle notifications published by the node client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    NodeConnected { session_id: String },
    NodeError { reason: String },
    TrackStart { guild_id: GuildId },
    TrackEnd { guild_id: GuildId, reason: TrackEndReason },
}
