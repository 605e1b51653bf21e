use dashmap::DashMap;
use rand::{seq::SliceRandom, Rng};
use serenity::model::id::{ChannelId, GuildId};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    node::{AudioNode, NodeError, TrackEndReason},
    track::{LoopMode, Track},
};

/// Playback state of one guild.
///
/// `queue` only holds upcoming tracks; the one being played lives in `current`.
#[derive(Debug, Clone)]
pub struct Session {
    guild_id: GuildId,
    voice_channel: ChannelId,
    text_channel: ChannelId,
    queue: VecDeque<Track>,
    current: Option<Track>,
    paused: bool,
    loop_mode: LoopMode,
    volume: u16,
}

impl Session {
    pub fn new(
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        volume: u16,
    ) -> Self {
        Self {
            guild_id,
            voice_channel,
            text_channel,
            queue: VecDeque::new(),
            current: None,
            paused: false,
            loop_mode: LoopMode::None,
            volume,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn voice_channel(&self) -> ChannelId {
        self.voice_channel
    }

    /// Channel lifecycle messages go to; fixed when the session is created.
    pub fn text_channel(&self) -> ChannelId {
        self.text_channel
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn upcoming(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some() && !self.paused
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && !self.paused
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn volume(&self) -> u16 {
        self.volume
    }

    /// Appends a track and returns its 1-based position among upcoming tracks.
    pub fn enqueue(&mut self, track: Track) -> usize {
        self.queue.push_back(track);
        self.queue.len()
    }

    pub fn enqueue_all(&mut self, tracks: impl IntoIterator<Item = Track>) -> usize {
        let before = self.queue.len();
        self.queue.extend(tracks);
        self.queue.len() - before
    }

    /// Moves to the next track. With [`LoopMode::Queue`] the finished track
    /// goes back to the end of the queue first.
    pub fn advance(&mut self) -> Option<&Track> {
        self.advance_after(TrackEndReason::Finished)
    }

    /// Moves to the next track after the current one ended for `reason`.
    pub fn advance_after(&mut self, reason: TrackEndReason) -> Option<&Track> {
        if let Some(ended) = self.current.take() {
            if self.loop_mode == LoopMode::Queue && reason.requeues() {
                self.queue.push_back(ended);
            }
        }
        self.current = self.queue.pop_front();
        self.paused = false;
        self.current.as_ref()
    }

    /// Removes the upcoming track at 1-based `position`.
    pub fn remove(&mut self, position: usize) -> Option<Track> {
        position
            .checked_sub(1)
            .and_then(|index| self.queue.remove(index))
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.queue.len();
        self.queue.clear();
        removed
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.queue.make_contiguous().shuffle(rng);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_volume(&mut self, volume: u16) {
        self.volume = volume;
    }

    pub fn toggle_loop(&mut self) -> LoopMode {
        self.loop_mode = self.loop_mode.toggled();
        self.loop_mode
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// What happened when a guild's track ended.
#[derive(Debug)]
pub enum Advance {
    Next(Track),
    QueueEnded { text_channel: ChannelId },
    PlaybackFailed { text_channel: ChannelId, error: NodeError },
    NoSession,
}

/// Owns every guild's [`Session`] and is the only way to reach them.
///
/// Commands for one guild are serialized by that session's mutex; different
/// guilds never contend.
pub struct SessionManager {
    node: Arc<dyn AudioNode>,
    sessions: DashMap<GuildId, SessionHandle>,
    default_volume: u16,
}

impl SessionManager {
    pub fn new(node: Arc<dyn AudioNode>, default_volume: u16) -> Self {
        Self {
            node,
            sessions: DashMap::new(),
            default_volume,
        }
    }

    pub fn node(&self) -> &dyn AudioNode {
        self.node.as_ref()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions.get(&guild_id).map(|entry| entry.value().clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Returns the guild's session, connecting to voice first if there is none.
    pub async fn get_or_create(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
    ) -> Result<SessionHandle, NodeError> {
        if let Some(existing) = self.get(guild_id) {
            return Ok(existing);
        }

        self.node.connect(guild_id, voice_channel).await?;
        if self.default_volume != 100 {
            self.node.set_volume(guild_id, self.default_volume).await?;
        }

        let handle = self
            .sessions
            .entry(guild_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Session::new(
                    guild_id,
                    voice_channel,
                    text_channel,
                    self.default_volume,
                )))
            })
            .clone();

        info!("🔊 Sesión creada en guild {} (canal de voz {})", guild_id, voice_channel);
        Ok(handle)
    }

    /// Drops the guild's session and tears down its node player.
    ///
    /// Returns `false` when there was nothing to destroy.
    pub async fn destroy(&self, guild_id: GuildId) -> Result<bool, NodeError> {
        if self.sessions.remove(&guild_id).is_none() {
            return Ok(false);
        }

        self.node.destroy(guild_id).await?;
        info!("👋 Sesión destruida en guild {}", guild_id);
        Ok(true)
    }

    /// Starts the next queued track after the current one ended.
    ///
    /// An exhausted queue destroys the session. If the session was destroyed
    /// or replaced meanwhile (e.g. by `stop`), nothing is reported.
    pub async fn advance(&self, guild_id: GuildId, reason: TrackEndReason) -> Advance {
        let Some(handle) = self.get(guild_id) else {
            debug!("Track end for guild {} without a session", guild_id);
            return Advance::NoSession;
        };

        let mut session = handle.lock().await;
        let text_channel = session.text_channel();
        let next = session.advance_after(reason).cloned();
        drop(session);

        let outcome = match next {
            Some(track) => match self.node.play(guild_id, &track).await {
                Ok(()) => return Advance::Next(track),
                Err(error) => Advance::PlaybackFailed {
                    text_channel,
                    error,
                },
            },
            None => Advance::QueueEnded { text_channel },
        };

        if !self.is_registered(guild_id, &handle) {
            debug!("Sesión de guild {} ya eliminada, fin de cola descartado", guild_id);
            return Advance::NoSession;
        }

        self.destroy_quietly(guild_id).await;
        outcome
    }

    fn is_registered(&self, guild_id: GuildId, handle: &SessionHandle) -> bool {
        self.get(guild_id)
            .is_some_and(|current| Arc::ptr_eq(&current, handle))
    }

    async fn destroy_quietly(&self, guild_id: GuildId) {
        if let Err(e) = self.destroy(guild_id).await {
            warn!("Error al destruir el player de guild {}: {}", guild_id, e);
        }
    }
}
