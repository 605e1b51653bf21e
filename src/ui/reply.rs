use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    builder::CreateMessage,
    http::Http,
    model::id::ChannelId,
};
use std::sync::Arc;

use crate::{
    audio::{
        session::Session,
        track::{LoopMode, Track},
    },
    bot::commands::Command,
};

use super::embeds;

/// Snapshot of a session for the `status` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub voice_channel: ChannelId,
    pub current: Option<Track>,
    pub playing: bool,
    pub paused: bool,
    pub volume: u16,
    pub loop_mode: LoopMode,
    pub queued: usize,
}

impl From<&Session> for PlayerStatus {
    fn from(session: &Session) -> Self {
        Self {
            voice_channel: session.voice_channel(),
            current: session.current().cloned(),
            playing: session.is_playing(),
            paused: session.is_paused(),
            volume: session.volume(),
            loop_mode: session.loop_mode(),
            queued: session.upcoming().len(),
        }
    }
}

/// Everything the bot can say in a text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Success(String),
    Error(String),
    AddedToQueue { track: Track, position: usize },
    AddedPlaylist { name: String, count: usize },
    NowPlaying(Track),
    QueueList {
        current: Option<Track>,
        upcoming: Vec<Track>,
        loop_mode: LoopMode,
    },
    Status(PlayerStatus),
    Help { prefix: String, commands: Vec<Command> },
    QueueEnded,
}

impl Reply {
    pub fn success(text: impl Into<String>) -> Self {
        Reply::Success(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        Reply::Error(text.into())
    }
}

/// Where replies go. The bot only ever needs to post into a channel.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, channel_id: ChannelId, reply: Reply) -> Result<()>;
}

/// Posts replies as embeds through the Discord REST API.
pub struct ChannelReplySink {
    http: Arc<Http>,
}

impl ChannelReplySink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReplySink for ChannelReplySink {
    async fn send(&self, channel_id: ChannelId, reply: Reply) -> Result<()> {
        channel_id
            .send_message(&self.http, CreateMessage::new().embed(embeds::render(&reply)))
            .await?;
        Ok(())
    }
}
