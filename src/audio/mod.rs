//! # Audio Module
//!
//! Playback state and the bridge to the external audio node.
//!
//! The node (Lavalink) decodes and streams; this module only decides *what*
//! each guild should be playing.
//!
//! ## Architecture
//!
//! ### [`session`] - Per-guild sessions
//! - [`session::SessionManager`] is the single owner of every guild's state
//! - Upcoming queue, current track, pause flag, loop mode and volume
//! - Auto-advance when the node reports a finished track
//!
//! ### [`node`] - Node contract
//! - [`node::AudioNode`]: resolve, connect, play, pause, stop, volume, destroy
//! - [`node::NodeEvent`]: lifecycle notifications consumed by the event relay
//!
//! ### [`lavalink_client`] - Lavalink implementation
//! - `lavalink-rs` client with hooks feeding the relay channel
//! - Songbird in gateway-only mode for the voice handshake
//!
//! ## Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use lava_music::audio::{node::AudioNode, session::SessionManager};
//! # use serenity::all::{ChannelId, GuildId};
//! # async fn example(node: Arc<dyn AudioNode>) -> anyhow::Result<()> {
//! let sessions = SessionManager::new(node, 100);
//! let guild_id = GuildId::new(123456789);
//!
//! let session = sessions
//!     .get_or_create(guild_id, ChannelId::new(1), ChannelId::new(2))
//!     .await?;
//! session.lock().await.toggle_loop();
//! # Ok(())
//! # }
//! ```

pub mod lavalink_client;
pub mod node;
pub mod session;
pub mod track;
