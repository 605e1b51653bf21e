use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::audio::track::{LoopMode, Track};

use super::reply::{PlayerStatus, Reply};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Lava Music";

/// Canciones de la cola que se listan antes de resumir el resto
const QUEUE_PREVIEW: usize = 10;

/// Convierte una respuesta en el embed que se envía al canal
pub fn render(reply: &Reply) -> CreateEmbed {
    let embed = match reply {
        Reply::Success(text) => CreateEmbed::default()
            .description(text)
            .color(colors::SUCCESS_GREEN),
        Reply::Error(text) => CreateEmbed::default()
            .description(format!("❌ {}", text))
            .color(colors::ERROR_RED),
        Reply::AddedToQueue { track, position } => create_track_added_embed(track, *position),
        Reply::AddedPlaylist { name, count } => create_playlist_added_embed(name, *count),
        Reply::NowPlaying(track) => create_now_playing_embed(track),
        Reply::QueueList {
            current,
            upcoming,
            loop_mode,
        } => create_queue_embed(current.as_ref(), upcoming, *loop_mode),
        Reply::Status(status) => create_status_embed(status),
        Reply::Help { prefix, commands } => {
            let lines = commands
                .iter()
                .map(|c| format!("`{}{}` - {}", prefix, c.usage(), c.description()))
                .collect::<Vec<_>>()
                .join("\n");
            CreateEmbed::default()
                .title("🎵 Commands")
                .description(lines)
                .color(colors::INFO_BLUE)
        }
        Reply::QueueEnded => CreateEmbed::default()
            .description("🏁 Queue has ended. Leaving the voice channel.")
            .color(colors::NEUTRAL_GRAY),
    };

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar la canción actual
pub fn create_now_playing_embed(track: &Track) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Now Playing")
        .description(format!("**{}**", track.title))
        .color(colors::MUSIC_PURPLE)
        .field("🎤 Artist", &track.author, true)
        .field("⏱️ Duration", track_length(track), true)
        .field("👤 Requested by", format!("<@{}>", track.requested_by), true);

    if let Some(uri) = &track.uri {
        embed = embed.url(uri);
    }

    embed
}

fn create_track_added_embed(track: &Track, position: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("✅ Added to Queue")
        .description(format!("**{}**", track.title))
        .color(colors::SUCCESS_GREEN)
        .field("🎤 Artist", &track.author, true)
        .field("⏱️ Duration", track_length(track), true)
        .field("📍 Position", position.to_string(), true);

    if let Some(uri) = &track.uri {
        embed = embed.url(uri);
    }

    embed
}

fn create_playlist_added_embed(name: &str, count: usize) -> CreateEmbed {
    let tracks = if count == 1 { "track" } else { "tracks" };
    CreateEmbed::default()
        .title("📋 Playlist Added")
        .description(format!("**{}**", name))
        .color(colors::MUSIC_PURPLE)
        .field("📊 Tracks", format!("{} {}", count, tracks), true)
}

/// Crea un embed para mostrar la cola de reproducción
fn create_queue_embed(current: Option<&Track>, upcoming: &[Track], loop_mode: LoopMode) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("📋 Queue")
        .color(colors::INFO_BLUE);

    if let Some(current) = current {
        let status = match loop_mode {
            LoopMode::Queue => "🔁",
            LoopMode::None => "▶️",
        };
        embed = embed.field(
            format!("{} Now Playing", status),
            format!("**{}** - {} `[{}]`", current.title, current.author, track_length(current)),
            false,
        );
    }

    if !upcoming.is_empty() {
        let mut description = upcoming
            .iter()
            .take(QUEUE_PREVIEW)
            .enumerate()
            .map(|(i, track)| format!("**{}**. {} `[{}]`", i + 1, track.title, track_length(track)))
            .collect::<Vec<_>>()
            .join("\n");

        if upcoming.len() > QUEUE_PREVIEW {
            description.push_str(&format!("\n...and {} more", upcoming.len() - QUEUE_PREVIEW));
        }

        embed = embed.field("Up Next", description, false);
    }

    let total: Duration = upcoming
        .iter()
        .filter(|track| !track.is_stream)
        .map(|track| track.length)
        .sum();

    embed.field(
        "Info",
        format!(
            "**Total:** {} tracks • **Duration:** {} • **Loop:** {}",
            upcoming.len(),
            format_duration(total),
            loop_mode
        ),
        false,
    )
}

fn create_status_embed(status: &PlayerStatus) -> CreateEmbed {
    let state = if status.playing {
        "▶️ Playing"
    } else if status.paused {
        "⏸️ Paused"
    } else {
        "⏹️ Idle"
    };

    let current = status
        .current
        .as_ref()
        .map(|track| format!("**{}**", track.title))
        .unwrap_or_else(|| "Nothing".to_string());

    CreateEmbed::default()
        .title("📊 Player Status")
        .color(colors::INFO_BLUE)
        .field("State", state, true)
        .field("🔊 Volume", format!("{}%", status.volume), true)
        .field("🔁 Loop", status.loop_mode.to_string(), true)
        .field("📋 Queued", status.queued.to_string(), true)
        .field("🎧 Channel", format!("<#{}>", status.voice_channel), true)
        .field("🎵 Current", current, false)
}

fn track_length(track: &Track) -> String {
    if track.is_stream {
        "🔴 Live".to_string()
    } else {
        format_duration(track.length)
    }
}

/// Formatea una duración como `m:ss` o `h:mm:ss`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
