//! # Bot Module
//!
//! Discord-facing side of Lava Music.
//!
//! This module contains:
//! - Prefix command parsing ([`commands`])
//! - One handler per command behind the [`handlers::Dispatcher`]
//! - The relay that reacts to node events ([`events::EventRelay`])
//! - User-facing command errors ([`error::CommandError`])
//!
//! ## Architecture
//!
//! [`MusicBot`] implements Serenity's [`EventHandler`]. For every message it
//! looks up the author's voice channel in the cache and hands the text to the
//! dispatcher; everything after that is independent of Discord's gateway types.

use serenity::{
    all::{Context, EventHandler, Message, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod commands;
pub mod error;
pub mod events;
pub mod handlers;

use crate::audio::session::SessionManager;
use handlers::{Dispatcher, Invocation};

/// Main Discord event handler.
pub struct MusicBot {
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionManager>,
}

impl MusicBot {
    pub fn new(dispatcher: Arc<Dispatcher>, sessions: Arc<SessionManager>) -> Self {
        Self {
            dispatcher,
            sessions,
        }
    }
}

#[async_trait]
impl EventHandler for MusicBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!("⌨️ Prefijo de comandos: {}", self.dispatcher.prefix());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.content.trim().is_empty() {
            return;
        }
        if !msg.content.starts_with(self.dispatcher.prefix()) {
            return;
        }

        let voice_channel = msg.guild_id.and_then(|guild_id| {
            ctx.cache.guild(guild_id).and_then(|guild| {
                guild
                    .voice_states
                    .get(&msg.author.id)
                    .and_then(|state| state.channel_id)
            })
        });

        let invocation = Invocation {
            guild_id: msg.guild_id,
            channel_id: msg.channel_id,
            author: msg.author.id,
            voice_channel,
        };

        self.dispatcher.dispatch(&invocation, &msg.content).await;
    }

    /// Drops the guild's session when the bot itself is disconnected from
    /// voice (kicked, or the channel was deleted).
    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || new.channel_id.is_some() {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };

        match self.sessions.destroy(guild_id).await {
            Ok(true) => info!("🔌 Bot desconectado en guild {}, sesión eliminada", guild_id),
            Ok(false) => {}
            Err(e) => error!("Error al limpiar la sesión de guild {}: {}", guild_id, e),
        }
    }
}
