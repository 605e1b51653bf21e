use futures::FutureExt;
use serenity::model::id::{ChannelId, GuildId};
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        node::{NodeEvent, TrackEndReason},
        session::{Advance, SessionManager},
    },
    ui::reply::{Reply, ReplySink},
};

/// Consumes node notifications and turns them into queue movement and
/// channel messages.
pub struct EventRelay {
    sessions: Arc<SessionManager>,
    sink: Arc<dyn ReplySink>,
}

impl EventRelay {
    pub fn new(sessions: Arc<SessionManager>, sink: Arc<dyn ReplySink>) -> Self {
        Self { sessions, sink }
    }

    /// Runs until every sender is gone. A panic while handling one event is
    /// logged and the loop continues with the next.
    pub async fn run(self, mut events: UnboundedReceiver<NodeEvent>) {
        info!("📡 Relay de eventos del nodo iniciado");

        while let Some(event) = events.recv().await {
            let description = format!("{:?}", event);
            if AssertUnwindSafe(self.handle(event)).catch_unwind().await.is_err() {
                error!("💥 Pánico procesando evento del nodo: {}", description);
            }
        }

        info!("Relay de eventos finalizado");
    }

    pub async fn handle(&self, event: NodeEvent) {
        match event {
            NodeEvent::NodeConnected { session_id } => {
                info!("✅ Nodo Lavalink conectado (sesión {})", session_id);
            }
            NodeEvent::NodeError { reason } => {
                error!("❌ Error del nodo Lavalink: {}", reason);
            }
            NodeEvent::TrackStart { guild_id } => self.on_track_start(guild_id).await,
            NodeEvent::TrackEnd { guild_id, reason } => self.on_track_end(guild_id, reason).await,
        }
    }

    async fn on_track_start(&self, guild_id: GuildId) {
        let Some(handle) = self.sessions.get(guild_id) else {
            debug!("Inicio de track sin sesión en guild {}", guild_id);
            return;
        };

        let (channel, track) = {
            let session = handle.lock().await;
            (session.text_channel(), session.current().cloned())
        };
        let Some(track) = track else {
            return;
        };

        info!("▶️ Reproduciendo: {} en guild {}", track.title, guild_id);
        self.reply(channel, Reply::NowPlaying(track)).await;
    }

    async fn on_track_end(&self, guild_id: GuildId, reason: TrackEndReason) {
        if !reason.may_start_next() {
            debug!("Fin de track ignorado en guild {} ({:?})", guild_id, reason);
            return;
        }

        match self.sessions.advance(guild_id, reason).await {
            Advance::Next(track) => {
                debug!("Siguiente track en guild {}: {}", guild_id, track.title);
            }
            Advance::QueueEnded { text_channel } => {
                info!("🏁 Cola terminada en guild {}", guild_id);
                self.reply(text_channel, Reply::QueueEnded).await;
            }
            Advance::PlaybackFailed {
                text_channel,
                error,
            } => {
                error!("Error al reproducir siguiente track en guild {}: {}", guild_id, error);
                self.reply(
                    text_channel,
                    Reply::error("Error while trying to play the track. Try again later."),
                )
                .await;
            }
            Advance::NoSession => {}
        }
    }

    async fn reply(&self, channel: ChannelId, reply: Reply) {
        if let Err(e) = self.sink.send(channel, reply).await {
            warn!("No se pudo enviar mensaje al canal {}: {:?}", channel, e);
        }
    }
}
