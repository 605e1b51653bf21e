use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        session::{SessionHandle, SessionManager},
        track::{is_spotify_url, LoadResult, LoopMode, Track},
    },
    bot::{
        commands::{self, Command, ParsedCommand},
        error::CommandError,
    },
    ui::reply::{PlayerStatus, Reply, ReplySink},
};

type CommandResult = Result<Reply, CommandError>;

/// Who sent a message, from where, and which voice channel they sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// `None` for direct messages.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: UserId,
    /// The author's current voice channel in `guild_id`, if any.
    pub voice_channel: Option<ChannelId>,
}

/// Routes prefix commands to their handlers and posts exactly one reply for
/// each recognised command.
pub struct Dispatcher {
    prefix: String,
    sessions: Arc<SessionManager>,
    sink: Arc<dyn ReplySink>,
    spotify_enabled: bool,
}

impl Dispatcher {
    pub fn new(
        prefix: String,
        sessions: Arc<SessionManager>,
        sink: Arc<dyn ReplySink>,
        spotify_enabled: bool,
    ) -> Self {
        Self {
            prefix,
            sessions,
            sink,
            spotify_enabled,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handles one message. Messages without the prefix and unknown command
    /// names are dropped without a reply.
    pub async fn dispatch(&self, invocation: &Invocation, content: &str) {
        let Some(parsed) = commands::parse(&self.prefix, content) else {
            return;
        };
        let Some(command) = Command::from_name(&parsed.name) else {
            debug!("Comando desconocido ignorado: {}", parsed.name);
            return;
        };

        info!(
            "📝 Comando {}{} usado por {} en guild {:?}",
            self.prefix,
            command.name(),
            invocation.author,
            invocation.guild_id
        );

        let reply = match self.execute(command, invocation, &parsed).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_external() {
                    error!(
                        "❌ Error en comando {} (guild {:?}): {}",
                        command.name(),
                        invocation.guild_id,
                        e
                    );
                }
                Reply::error(e.user_message(command.name()))
            }
        };

        if let Err(e) = self.sink.send(invocation.channel_id, reply).await {
            warn!(
                "No se pudo responder en el canal {}: {:?}",
                invocation.channel_id, e
            );
        }
    }

    async fn execute(
        &self,
        command: Command,
        invocation: &Invocation,
        parsed: &ParsedCommand,
    ) -> CommandResult {
        let guild_id = match invocation.guild_id {
            Some(guild_id) => guild_id,
            None if command.guild_only() => return Err(CommandError::GuildOnly),
            None => return Ok(self.handle_help()),
        };
        if command.requires_voice() && invocation.voice_channel.is_none() {
            return Err(CommandError::NotInVoice);
        }

        match command {
            Command::Play => {
                let voice_channel = invocation.voice_channel.ok_or(CommandError::NotInVoice)?;
                self.handle_play(
                    guild_id,
                    voice_channel,
                    invocation.channel_id,
                    invocation.author,
                    &parsed.rest(),
                )
                .await
            }
            Command::Pause => self.handle_pause(guild_id).await,
            Command::Resume => self.handle_resume(guild_id).await,
            Command::Skip => self.handle_skip(guild_id).await,
            Command::Stop => self.handle_stop(guild_id).await,
            Command::Queue => self.handle_queue(guild_id).await,
            Command::NowPlaying => self.handle_nowplaying(guild_id).await,
            Command::Volume => self.handle_volume(guild_id, &parsed.args).await,
            Command::Shuffle => self.handle_shuffle(guild_id).await,
            Command::Loop => self.handle_loop(guild_id).await,
            Command::Remove => self.handle_remove(guild_id, &parsed.args).await,
            Command::Clear => self.handle_clear(guild_id).await,
            Command::Status => self.handle_status(guild_id).await,
            Command::Help => Ok(self.handle_help()),
        }
    }

    fn session(&self, guild_id: GuildId) -> Result<SessionHandle, CommandError> {
        self.sessions.get(guild_id).ok_or(CommandError::NoSession)
    }

    async fn handle_play(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        author: UserId,
        query: &str,
    ) -> CommandResult {
        let query = query.trim();
        if query.is_empty() {
            return Err(CommandError::EmptyQuery);
        }
        if is_spotify_url(query) && !self.spotify_enabled {
            return Err(CommandError::SpotifyDisabled);
        }

        // Resolver antes de crear la sesión: sin resultados no se conecta nada
        let loaded = self.sessions.node().resolve(guild_id, query, author).await?;
        let (tracks, playlist): (Vec<Track>, Option<String>) = match loaded {
            LoadResult::Playlist { name, tracks } if !tracks.is_empty() => (tracks, Some(name)),
            LoadResult::Track(track) => (vec![track], None),
            LoadResult::Search(results) => match results.into_iter().next() {
                Some(first) => (vec![first], None),
                None => return Err(CommandError::NoResults),
            },
            LoadResult::Playlist { .. } | LoadResult::Empty => return Err(CommandError::NoResults),
        };

        let handle = self
            .sessions
            .get_or_create(guild_id, voice_channel, text_channel)
            .await?;
        let mut session = handle.lock().await;

        let reply = match playlist {
            Some(name) => {
                let count = session.enqueue_all(tracks);
                info!("📋 Playlist '{}' agregada ({} canciones) en guild {}", name, count, guild_id);
                Reply::AddedPlaylist { name, count }
            }
            None => {
                let Some(track) = tracks.into_iter().next() else {
                    return Err(CommandError::NoResults);
                };
                let position = session.enqueue(track.clone());
                info!("🎵 '{}' agregada en posición {} en guild {}", track.title, position, guild_id);
                Reply::AddedToQueue { track, position }
            }
        };

        if session.is_idle() {
            if let Some(next) = session.upcoming().front().cloned() {
                self.sessions.node().play(guild_id, &next).await?;
                session.advance();
            }
        }

        Ok(reply)
    }

    async fn handle_pause(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.session(guild_id)?;
        let mut session = handle.lock().await;
        if session.is_paused() {
            return Err(CommandError::AlreadyPaused);
        }

        self.sessions.node().set_paused(guild_id, true).await?;
        session.set_paused(true);
        Ok(Reply::success("Paused the music!"))
    }

    async fn handle_resume(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.session(guild_id)?;
        let mut session = handle.lock().await;
        if !session.is_paused() {
            return Err(CommandError::AlreadyPlaying);
        }

        self.sessions.node().set_paused(guild_id, false).await?;
        session.set_paused(false);
        Ok(Reply::success("Resumed the music!"))
    }

    async fn handle_skip(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.session(guild_id)?;
        let session = handle.lock().await;
        if session.upcoming().is_empty() {
            return Err(CommandError::NothingToSkip);
        }

        // El siguiente track lo arranca el relay al recibir el fin del actual
        self.sessions.node().stop(guild_id).await?;
        Ok(Reply::success("Skipped the current track!"))
    }

    async fn handle_stop(&self, guild_id: GuildId) -> CommandResult {
        if !self.sessions.destroy(guild_id).await? {
            return Err(CommandError::NoSession);
        }
        Ok(Reply::success("Stopped music and cleared queue!"))
    }

    async fn handle_queue(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.session(guild_id)?;
        let session = handle.lock().await;
        if session.current().is_none() && session.upcoming().is_empty() {
            return Err(CommandError::QueueEmpty);
        }

        Ok(Reply::QueueList {
            current: session.current().cloned(),
            upcoming: session.upcoming().iter().cloned().collect(),
            loop_mode: session.loop_mode(),
        })
    }

    async fn handle_nowplaying(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.sessions.get(guild_id).ok_or(CommandError::NoCurrentTrack)?;
        let session = handle.lock().await;
        session
            .current()
            .cloned()
            .map(Reply::NowPlaying)
            .ok_or(CommandError::NoCurrentTrack)
    }

    async fn handle_volume(&self, guild_id: GuildId, args: &[String]) -> CommandResult {
        let handle = self.session(guild_id)?;
        let volume = args
            .first()
            .and_then(|arg| arg.parse::<u16>().ok())
            .filter(|volume| *volume <= 100)
            .ok_or(CommandError::InvalidVolume)?;

        let mut session = handle.lock().await;
        self.sessions.node().set_volume(guild_id, volume).await?;
        session.set_volume(volume);
        Ok(Reply::success(format!("Volume set to {}%", volume)))
    }

    async fn handle_shuffle(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.sessions.get(guild_id).ok_or(CommandError::NothingToShuffle)?;
        let mut session = handle.lock().await;
        if session.upcoming().is_empty() {
            return Err(CommandError::NothingToShuffle);
        }

        session.shuffle(&mut rand::thread_rng());
        Ok(Reply::success("🔀 Queue shuffled!"))
    }

    async fn handle_loop(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.session(guild_id)?;
        let mode = handle.lock().await.toggle_loop();
        let verb = match mode {
            LoopMode::Queue => "Enabled",
            LoopMode::None => "Disabled",
        };
        Ok(Reply::success(format!("{} loop mode!", verb)))
    }

    async fn handle_remove(&self, guild_id: GuildId, args: &[String]) -> CommandResult {
        let handle = self.session(guild_id)?;
        let mut session = handle.lock().await;
        let len = session.upcoming().len();

        let removed = args
            .first()
            .and_then(|arg| arg.parse::<usize>().ok())
            .and_then(|position| session.remove(position))
            .ok_or(CommandError::InvalidPosition { len })?;

        Ok(Reply::success(format!("Removed **{}** from the queue!", removed.title)))
    }

    async fn handle_clear(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.sessions.get(guild_id).ok_or(CommandError::AlreadyEmpty)?;
        let mut session = handle.lock().await;
        if session.clear() == 0 {
            return Err(CommandError::AlreadyEmpty);
        }
        Ok(Reply::success("Cleared the queue!"))
    }

    async fn handle_status(&self, guild_id: GuildId) -> CommandResult {
        let handle = self.sessions.get(guild_id).ok_or(CommandError::NoPlayer)?;
        let session = handle.lock().await;
        Ok(Reply::Status(PlayerStatus::from(&*session)))
    }

    fn handle_help(&self) -> Reply {
        Reply::Help {
            prefix: self.prefix.clone(),
            commands: Command::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{
            node::{MockAudioNode, NodeError},
            session::tests::track,
        },
        ui::reply::tests::RecordingSink,
    };
    use pretty_assertions::assert_eq;

    const GUILD: GuildId = GuildId::new(1);
    const VOICE: ChannelId = ChannelId::new(10);
    const TEXT: ChannelId = ChannelId::new(20);

    fn in_voice() -> Invocation {
        Invocation {
            guild_id: Some(GUILD),
            channel_id: TEXT,
            author: UserId::new(7),
            voice_channel: Some(VOICE),
        }
    }

    fn setup(node: MockAudioNode) -> (Dispatcher, Arc<SessionManager>, Arc<RecordingSink>) {
        let sessions = Arc::new(SessionManager::new(Arc::new(node), 100));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new("!".to_string(), sessions.clone(), sink.clone(), false);
        (dispatcher, sessions, sink)
    }

    fn connecting_node() -> MockAudioNode {
        let mut node = MockAudioNode::new();
        node.expect_connect().returning(|_, _| Ok(()));
        node
    }

    /// Creates a session whose current track is "now" with `queued` behind it.
    async fn playing(sessions: &SessionManager, queued: &[&str]) -> SessionHandle {
        let handle = sessions.get_or_create(GUILD, VOICE, TEXT).await.unwrap();
        {
            let mut session = handle.lock().await;
            session.enqueue(track("now"));
            session.enqueue_all(queued.iter().map(|title| track(title)));
            session.advance();
        }
        handle
    }

    async fn only_reply(dispatcher: &Dispatcher, sink: &RecordingSink, content: &str) -> Reply {
        dispatcher.dispatch(&in_voice(), content).await;
        let mut replies = sink.replies();
        assert_eq!(replies.len(), 1, "expected exactly one reply to {:?}", content);
        replies.remove(0)
    }

    #[tokio::test]
    async fn test_unknown_and_unprefixed_messages_are_ignored() {
        let (dispatcher, sessions, sink) = setup(MockAudioNode::new());

        dispatcher.dispatch(&in_voice(), "!dance").await;
        dispatcher.dispatch(&in_voice(), "play something").await;
        dispatcher.dispatch(&in_voice(), "!").await;

        assert!(sink.sent().is_empty());
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_voice_is_required_except_for_help_and_status() {
        let (dispatcher, _, sink) = setup(MockAudioNode::new());
        let outside = Invocation {
            voice_channel: None,
            ..in_voice()
        };

        dispatcher.dispatch(&outside, "!skip").await;
        dispatcher.dispatch(&outside, "!play lofi").await;
        dispatcher.dispatch(&outside, "!status").await;
        dispatcher.dispatch(&outside, "!help").await;

        let replies = sink.replies();
        assert_eq!(replies[0], Reply::error("You must be in a voice channel!"));
        assert_eq!(replies[1], Reply::error("You must be in a voice channel!"));
        assert_eq!(replies[2], Reply::error("No active player found!"));
        assert!(matches!(replies[3], Reply::Help { .. }));
    }

    #[tokio::test]
    async fn test_direct_messages_only_get_help() {
        let (dispatcher, _, sink) = setup(MockAudioNode::new());
        let dm = Invocation {
            guild_id: None,
            voice_channel: None,
            ..in_voice()
        };

        dispatcher.dispatch(&dm, "!queue").await;
        dispatcher.dispatch(&dm, "!help").await;

        let replies = sink.replies();
        assert_eq!(replies[0], Reply::error("This command only works in a server!"));
        match &replies[1] {
            Reply::Help { prefix, commands } => {
                assert_eq!(prefix, "!");
                assert_eq!(commands.len(), Command::ALL.len());
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_play_without_query() {
        let (dispatcher, sessions, sink) = setup(MockAudioNode::new());
        let reply = only_reply(&dispatcher, &sink, "!play   ").await;
        assert_eq!(reply, Reply::error("Please provide a search query!"));
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_play_without_results_creates_no_session() {
        let mut node = MockAudioNode::new();
        node.expect_resolve().returning(|_, _, _| Ok(LoadResult::Search(Vec::new())));
        let (dispatcher, sessions, sink) = setup(node);

        let reply = only_reply(&dispatcher, &sink, "!play zzzzqqq").await;
        assert_eq!(reply, Reply::error("No results found! Try a different search term."));
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_play_spotify_requires_credentials() {
        let (dispatcher, _, sink) = setup(MockAudioNode::new());
        let reply = only_reply(
            &dispatcher,
            &sink,
            "!play https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT",
        )
        .await;
        assert_eq!(reply, Reply::error("Spotify support is not configured!"));
    }

    #[tokio::test]
    async fn test_playlist_appends_in_order_and_starts_when_idle() {
        let mut node = connecting_node();
        node.expect_resolve()
            .withf(|_, query, _| query == "my mix")
            .returning(|_, _, _| {
                Ok(LoadResult::Playlist {
                    name: "Mix".to_string(),
                    tracks: vec![track("a"), track("b"), track("c")],
                })
            });
        node.expect_play()
            .withf(|_, track| track.title == "a")
            .times(1)
            .returning(|_, _| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);

        let reply = only_reply(&dispatcher, &sink, "!play my   mix").await;
        assert_eq!(
            reply,
            Reply::AddedPlaylist {
                name: "Mix".to_string(),
                count: 3
            }
        );

        let handle = sessions.get(GUILD).unwrap();
        let session = handle.lock().await;
        assert_eq!(session.current().map(|t| t.title.as_str()), Some("a"));
        let upcoming: Vec<_> = session.upcoming().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(upcoming, vec!["b", "c"]);
        assert_eq!(session.text_channel(), TEXT);
    }

    #[tokio::test]
    async fn test_play_while_playing_only_enqueues() {
        let mut node = connecting_node();
        node.expect_resolve()
            .returning(|_, _, _| Ok(LoadResult::Search(vec![track("x"), track("y")])));
        node.expect_play().never();
        let (dispatcher, sessions, sink) = setup(node);
        playing(&sessions, &["q1"]).await;

        let reply = only_reply(&dispatcher, &sink, "!play x").await;
        assert_eq!(
            reply,
            Reply::AddedToQueue {
                track: track("x"),
                position: 2
            }
        );
    }

    fn titles(session: &crate::audio::session::Session) -> Vec<String> {
        session.upcoming().iter().map(|t| t.title.clone()).collect()
    }

    fn mix_node() -> MockAudioNode {
        let mut node = MockAudioNode::new();
        node.expect_connect().times(1).returning(|_, _| Ok(()));
        node.expect_resolve().returning(|_, _, _| {
            Ok(LoadResult::Playlist {
                name: "Mix".to_string(),
                tracks: vec![track("x"), track("y"), track("z")],
            })
        });
        node.expect_play().never();
        node
    }

    #[tokio::test]
    async fn test_playlist_while_playing_only_appends() {
        let (dispatcher, sessions, sink) = setup(mix_node());
        let handle = playing(&sessions, &["q"]).await;

        let reply = only_reply(&dispatcher, &sink, "!play mix").await;
        assert_eq!(
            reply,
            Reply::AddedPlaylist {
                name: "Mix".to_string(),
                count: 3
            }
        );

        let session = handle.lock().await;
        assert_eq!(session.current().map(|t| t.title.as_str()), Some("now"));
        assert_eq!(titles(&session), vec!["q", "x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_playlist_while_paused_only_appends() {
        let (dispatcher, sessions, sink) = setup(mix_node());
        let handle = playing(&sessions, &["q"]).await;
        handle.lock().await.set_paused(true);

        let reply = only_reply(&dispatcher, &sink, "!play mix").await;
        assert!(matches!(reply, Reply::AddedPlaylist { count: 3, .. }));

        let session = handle.lock().await;
        assert!(session.is_paused());
        assert_eq!(session.current().map(|t| t.title.as_str()), Some("now"));
        assert_eq!(titles(&session), vec!["q", "x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_mutating_commands_without_voice_leave_the_session_alone() {
        let mut node = MockAudioNode::new();
        node.expect_connect().times(1).returning(|_, _| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);
        let handle = playing(&sessions, &["a", "b"]).await;
        let outside = Invocation {
            voice_channel: None,
            ..in_voice()
        };

        let commands = [
            "!pause", "!resume", "!skip", "!stop", "!volume 5", "!shuffle", "!loop", "!remove 1",
            "!clear",
        ];
        for content in commands {
            dispatcher.dispatch(&outside, content).await;
        }

        assert_eq!(
            sink.replies(),
            vec![Reply::error("You must be in a voice channel!"); commands.len()]
        );
        assert_eq!(sessions.active_sessions(), 1);
        let session = handle.lock().await;
        assert_eq!(session.current().map(|t| t.title.as_str()), Some("now"));
        assert_eq!(titles(&session), vec!["a", "b"]);
        assert!(!session.is_paused());
        assert_eq!(session.loop_mode(), LoopMode::None);
        assert_eq!(session.volume(), 100);
    }

    #[tokio::test]
    async fn test_play_node_failure_is_reported_generically() {
        let mut node = MockAudioNode::new();
        node.expect_resolve()
            .returning(|_, _, _| Err(NodeError::Resolve("503".to_string())));
        let (dispatcher, _, sink) = setup(node);

        let reply = only_reply(&dispatcher, &sink, "!play anything").await;
        assert_eq!(
            reply,
            Reply::error("Error while trying to play the track. Try again later.")
        );
    }

    #[tokio::test]
    async fn test_commands_without_session() {
        let (dispatcher, _, sink) = setup(MockAudioNode::new());
        for content in ["!pause", "!shuffle", "!clear", "!np", "!status"] {
            dispatcher.dispatch(&in_voice(), content).await;
        }

        assert_eq!(
            sink.replies(),
            vec![
                Reply::error("Nothing is playing!"),
                Reply::error("Not enough tracks to shuffle!"),
                Reply::error("Queue is already empty!"),
                Reply::error("Nothing is currently playing!"),
                Reply::error("No active player found!"),
            ]
        );
    }

    #[tokio::test]
    async fn test_volume_bounds() {
        let mut node = connecting_node();
        node.expect_set_volume()
            .withf(|_, volume| *volume == 55)
            .times(1)
            .returning(|_, _| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);
        let handle = playing(&sessions, &[]).await;

        for content in ["!volume 101", "!volume -1", "!volume loud", "!volume", "!volume 55"] {
            dispatcher.dispatch(&in_voice(), content).await;
        }

        let replies = sink.replies();
        for reply in &replies[..4] {
            assert_eq!(*reply, Reply::error("Volume must be 0-100!"));
        }
        assert_eq!(replies[4], Reply::success("Volume set to 55%"));
        assert_eq!(handle.lock().await.volume(), 55);
    }

    #[tokio::test]
    async fn test_remove_bounds_and_title() {
        let (dispatcher, sessions, sink) = setup(connecting_node());
        let handle = playing(&sessions, &["a", "b", "c"]).await;

        for content in ["!remove 0", "!remove 4", "!remove two", "!remove 2"] {
            dispatcher.dispatch(&in_voice(), content).await;
        }

        let replies = sink.replies();
        for reply in &replies[..3] {
            assert_eq!(*reply, Reply::error("Provide a position between 1 and 3"));
        }
        assert_eq!(replies[3], Reply::success("Removed **b** from the queue!"));

        let session = handle.lock().await;
        let upcoming: Vec<_> = session.upcoming().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(upcoming, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_pause_resume_symmetry() {
        let mut node = connecting_node();
        node.expect_set_paused().times(2).returning(|_, _| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);
        let handle = playing(&sessions, &[]).await;

        for content in ["!resume", "!pause", "!pause", "!resume"] {
            dispatcher.dispatch(&in_voice(), content).await;
        }

        assert_eq!(
            sink.replies(),
            vec![
                Reply::error("Player is already playing!"),
                Reply::success("Paused the music!"),
                Reply::error("Player is already paused!"),
                Reply::success("Resumed the music!"),
            ]
        );
        assert!(handle.lock().await.is_playing());
    }

    #[tokio::test]
    async fn test_loop_toggles() {
        let (dispatcher, sessions, sink) = setup(connecting_node());
        playing(&sessions, &[]).await;

        dispatcher.dispatch(&in_voice(), "!loop").await;
        dispatcher.dispatch(&in_voice(), "!loop").await;

        assert_eq!(
            sink.replies(),
            vec![
                Reply::success("Enabled loop mode!"),
                Reply::success("Disabled loop mode!"),
            ]
        );
    }

    #[tokio::test]
    async fn test_skip_needs_upcoming_tracks() {
        let mut node = connecting_node();
        node.expect_stop().times(1).returning(|_| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);
        let handle = playing(&sessions, &[]).await;

        dispatcher.dispatch(&in_voice(), "!skip").await;
        handle.lock().await.enqueue(track("next"));
        dispatcher.dispatch(&in_voice(), "!skip").await;

        assert_eq!(
            sink.replies(),
            vec![
                Reply::error("No more tracks in queue!"),
                Reply::success("Skipped the current track!"),
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_destroys_session() {
        let mut node = connecting_node();
        node.expect_destroy().times(1).returning(|_| Ok(()));
        let (dispatcher, sessions, sink) = setup(node);
        playing(&sessions, &["a"]).await;

        dispatcher.dispatch(&in_voice(), "!stop").await;
        dispatcher.dispatch(&in_voice(), "!stop").await;

        assert_eq!(
            sink.replies(),
            vec![
                Reply::success("Stopped music and cleared queue!"),
                Reply::error("Nothing is playing!"),
            ]
        );
        assert!(sessions.get(GUILD).is_none());
    }

    #[tokio::test]
    async fn test_queue_and_clear() {
        let (dispatcher, sessions, sink) = setup(connecting_node());
        playing(&sessions, &["a", "b"]).await;

        dispatcher.dispatch(&in_voice(), "!queue").await;
        dispatcher.dispatch(&in_voice(), "!clear").await;
        dispatcher.dispatch(&in_voice(), "!clear").await;
        dispatcher.dispatch(&in_voice(), "!shuffle").await;

        let replies = sink.replies();
        assert_eq!(
            replies[0],
            Reply::QueueList {
                current: Some(track("now")),
                upcoming: vec![track("a"), track("b")],
                loop_mode: LoopMode::None,
            }
        );
        assert_eq!(replies[1], Reply::success("Cleared the queue!"));
        assert_eq!(replies[2], Reply::error("Queue is already empty!"));
        assert_eq!(replies[3], Reply::error("Not enough tracks to shuffle!"));
    }

    #[tokio::test]
    async fn test_replies_go_to_the_invoking_channel() {
        let (dispatcher, _, sink) = setup(MockAudioNode::new());
        dispatcher.dispatch(&in_voice(), "!help").await;
        assert_eq!(sink.sent()[0].0, TEXT);
    }
}
