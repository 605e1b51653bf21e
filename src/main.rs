use anyhow::{Context, Result};
use serenity::{http::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod health;
mod ui;

use crate::audio::{lavalink_client::LavalinkNode, session::SessionManager};
use crate::bot::{events::EventRelay, handlers::Dispatcher, MusicBot};
use crate::config::Config;
use crate::ui::reply::{ChannelReplySink, ReplySink};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lava_music=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?)
                .add_directive("lavalink_rs=info".parse()?),
        )
        .init();

    // Los pánicos van al log en vez de solo a stderr
    std::panic::set_hook(Box::new(|panic| {
        error!("💥 Pánico: {}", panic);
    }));

    info!("🎵 Iniciando Lava Music v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuración inválida: {:#}", e);
            std::process::exit(1);
        }
    };

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return match health::check_running(config.http_port).await {
            Ok(()) => {
                println!("OK");
                Ok(())
            }
            Err(e) => {
                eprintln!("Health check falló: {:#}", e);
                std::process::exit(1);
            }
        };
    }

    info!("{}", config.summary());

    let listener = health::bind(config.http_port).await?;
    tokio::spawn(health::serve(listener));

    let http = Arc::new(Http::new(&config.discord_token));
    let user_id = http
        .get_current_user()
        .await
        .context("No se pudo obtener el usuario del bot, ¿token válido?")?
        .id;

    // Songbird solo negocia la conexión de voz; el audio lo envía Lavalink
    let songbird = Songbird::serenity();

    info!("🎼 Inicializando Lavalink...");
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let node = LavalinkNode::new(&config, user_id, songbird.clone(), events_tx).await;
    let sessions = Arc::new(SessionManager::new(Arc::new(node), config.default_volume));

    let sink: Arc<dyn ReplySink> = Arc::new(ChannelReplySink::new(http));
    tokio::spawn(EventRelay::new(sessions.clone(), sink.clone()).run(events_rx));

    let dispatcher = Arc::new(Dispatcher::new(
        config.prefix.clone(),
        sessions.clone(),
        sink,
        config.spotify_enabled(),
    ));
    let handler = MusicBot::new(dispatcher, sessions);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::DIRECT_MESSAGES;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}
