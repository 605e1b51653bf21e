use async_trait::async_trait;
use lavalink_rs::{
    model::{
        events::{
            Events, Ready, TrackEnd, TrackEndReason as LavalinkEndReason, TrackStart,
            WebSocketClosed,
        },
        http::{UpdatePlayer, UpdatePlayerTrack},
        player::ConnectionInfo,
        track::{TrackData, TrackLoadData},
        GuildId as LavalinkGuildId, UserId as LavalinkUserId,
    },
    node::NodeBuilder,
    prelude::{LavalinkClient, NodeDistributionStrategy, PlayerContext},
};
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::Songbird;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::audio::{
    node::{AudioNode, NodeError, NodeEvent, TrackEndReason},
    track::{search_identifier, LoadResult, Track},
};
use crate::config::Config;

/// Data attached to the lavalink client so hooks can reach the relay.
struct HookData {
    events: UnboundedSender<NodeEvent>,
}

/// [`AudioNode`] backed by one or more Lavalink v4 nodes.
///
/// Voice gateway negotiation goes through songbird in gateway-only mode; the
/// resulting session/token/endpoint are handed to the node, which streams.
pub struct LavalinkNode {
    client: LavalinkClient,
    voice: Arc<Songbird>,
    search_platform: String,
}

impl LavalinkNode {
    pub async fn new(
        config: &Config,
        user_id: UserId,
        voice: Arc<Songbird>,
        events: UnboundedSender<NodeEvent>,
    ) -> Self {
        let nodes = config
            .nodes
            .iter()
            .map(|node| {
                info!(
                    "🎼 Nodo Lavalink '{}' en {}:{} (ssl: {})",
                    node.name, node.host, node.port, node.secure
                );
                NodeBuilder {
                    hostname: format!("{}:{}", node.host, node.port),
                    is_ssl: node.secure,
                    events: Events::default(),
                    password: node.password.clone(),
                    user_id: LavalinkUserId(user_id.get()),
                    session_id: None,
                }
            })
            .collect();

        let hooks = Events {
            ready: Some(ready_event),
            track_start: Some(track_start_event),
            track_end: Some(track_end_event),
            websocket_closed: Some(websocket_closed_event),
            ..Default::default()
        };

        let client = LavalinkClient::new_with_data(
            hooks,
            nodes,
            NodeDistributionStrategy::round_robin(),
            Arc::new(HookData { events }),
        )
        .await;

        Self {
            client,
            voice,
            search_platform: config.search_platform.clone(),
        }
    }

    fn player(&self, guild_id: GuildId) -> Result<PlayerContext, NodeError> {
        self.client
            .get_player_context(lavalink_guild(guild_id))
            .ok_or(NodeError::NoPlayer(guild_id))
    }
}

#[async_trait]
impl AudioNode for LavalinkNode {
    async fn resolve(
        &self,
        guild_id: GuildId,
        query: &str,
        requested_by: UserId,
    ) -> Result<LoadResult, NodeError> {
        let identifier = search_identifier(query, &self.search_platform);
        let loaded = self
            .client
            .load_tracks(lavalink_guild(guild_id), &identifier)
            .await
            .map_err(|e| NodeError::Resolve(format!("{:?}", e)))?;

        let to_track = |data: TrackData| to_track(data, requested_by);
        let result = match loaded.data {
            Some(TrackLoadData::Track(data)) => LoadResult::Track(to_track(data)),
            Some(TrackLoadData::Search(results)) => {
                LoadResult::Search(results.into_iter().map(to_track).collect())
            }
            Some(TrackLoadData::Playlist(playlist)) => LoadResult::Playlist {
                name: playlist.info.name,
                tracks: playlist.tracks.into_iter().map(to_track).collect(),
            },
            Some(TrackLoadData::Error(exception)) => {
                return Err(NodeError::Resolve(format!("{:?}", exception)));
            }
            None => LoadResult::Empty,
        };

        Ok(result)
    }

    async fn connect(&self, guild_id: GuildId, voice_channel: ChannelId) -> Result<(), NodeError> {
        let (info, call) = self
            .voice
            .join_gateway(guild_id, voice_channel)
            .await
            .map_err(|e| NodeError::Connect(e.to_string()))?;

        if let Err(e) = call.lock().await.deafen(true).await {
            warn!("No se pudo ensordecer al bot en guild {}: {}", guild_id, e);
        }

        let connection = ConnectionInfo {
            endpoint: info.endpoint,
            token: info.token,
            session_id: info.session_id,
        };
        self.client
            .create_player_context(lavalink_guild(guild_id), connection)
            .await
            .map_err(|e| NodeError::Connect(format!("{:?}", e)))?;

        info!("Conectado al canal {} en guild {}", voice_channel, guild_id);
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, track: &Track) -> Result<(), NodeError> {
        let update = UpdatePlayer {
            track: Some(UpdatePlayerTrack {
                encoded: Some(track.encoded.clone()),
                ..Default::default()
            }),
            paused: Some(false),
            ..Default::default()
        };
        self.player(guild_id)?
            .update_player(&update, false)
            .await
            .map_err(failed("play"))?;
        Ok(())
    }

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<(), NodeError> {
        self.player(guild_id)?
            .set_pause(paused)
            .await
            .map_err(failed("pause"))?;
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> Result<(), NodeError> {
        self.player(guild_id)?
            .stop_now()
            .await
            .map_err(failed("stop"))?;
        Ok(())
    }

    async fn set_volume(&self, guild_id: GuildId, volume: u16) -> Result<(), NodeError> {
        self.player(guild_id)?
            .set_volume(volume)
            .await
            .map_err(failed("volume"))?;
        Ok(())
    }

    async fn destroy(&self, guild_id: GuildId) -> Result<(), NodeError> {
        self.client
            .delete_player(lavalink_guild(guild_id))
            .await
            .map_err(failed("destroy"))?;

        if let Err(e) = self.voice.remove(guild_id).await {
            warn!("Error al salir del canal de voz en guild {}: {}", guild_id, e);
        }

        Ok(())
    }
}

fn failed<E: Debug>(action: &'static str) -> impl FnOnce(E) -> NodeError {
    move |e| NodeError::request(action, format!("{:?}", e))
}

fn lavalink_guild(guild_id: GuildId) -> LavalinkGuildId {
    LavalinkGuildId(guild_id.get())
}

fn serenity_guild(guild_id: &LavalinkGuildId) -> GuildId {
    GuildId::new(guild_id.0)
}

fn to_track(data: TrackData, requested_by: UserId) -> Track {
    Track {
        title: data.info.title,
        author: data.info.author,
        uri: data.info.uri,
        length: Duration::from_millis(data.info.length),
        is_stream: data.info.is_stream,
        encoded: data.encoded,
        requested_by,
    }
}

fn publish(client: &LavalinkClient, event: NodeEvent) {
    match client.data::<HookData>() {
        Ok(data) => {
            if data.events.send(event).is_err() {
                warn!("El relay de eventos está cerrado, evento descartado");
            }
        }
        Err(e) => error!("Datos de hooks no disponibles: {:?}", e),
    }
}

#[lavalink_rs::hook]
async fn ready_event(client: LavalinkClient, session_id: String, _event: &Ready) {
    publish(&client, NodeEvent::NodeConnected { session_id });
}

#[lavalink_rs::hook]
async fn track_start_event(client: LavalinkClient, _session_id: String, event: &TrackStart) {
    publish(
        &client,
        NodeEvent::TrackStart {
            guild_id: serenity_guild(&event.guild_id),
        },
    );
}

#[lavalink_rs::hook]
async fn track_end_event(client: LavalinkClient, _session_id: String, event: &TrackEnd) {
    let reason = match event.reason {
        LavalinkEndReason::Finished => TrackEndReason::Finished,
        LavalinkEndReason::LoadFailed => TrackEndReason::LoadFailed,
        LavalinkEndReason::Stopped => TrackEndReason::Stopped,
        LavalinkEndReason::Replaced => TrackEndReason::Replaced,
        LavalinkEndReason::Cleanup => TrackEndReason::Cleanup,
    };

    publish(
        &client,
        NodeEvent::TrackEnd {
            guild_id: serenity_guild(&event.guild_id),
            reason,
        },
    );
}

#[lavalink_rs::hook]
async fn websocket_closed_event(client: LavalinkClient, session_id: String, event: &WebSocketClosed) {
    publish(
        &client,
        NodeEvent::NodeError {
            reason: format!(
                "voice websocket closed for guild {} on session {} (code {}: {})",
                event.guild_id.0, session_id, event.code, event.reason
            ),
        },
    );
}
