use anyhow::{Context, Result};
use std::{net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info, warn};

const BODY_OK: &str = "Bot is running.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Request line plus headers; anything past this is never read.
const MAX_REQUEST_BYTES: u64 = 8192;

/// Binds the health endpoint on every interface.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("No se pudo abrir el puerto de health check {}", port))
}

/// Answers health requests until the listener fails.
pub async fn serve(listener: TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        info!("🩺 Health check escuchando en http://{}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(async move {
                    match tokio::time::timeout(REQUEST_TIMEOUT, handle_connection(stream)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            debug!("Conexión de health check con {} falló: {:?}", peer, e)
                        }
                        Err(_) => debug!("Conexión de health check con {} expiró", peer),
                    }
                });
            }
            Err(e) => {
                warn!("Error aceptando conexión de health check: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn handle_connection(stream: TcpStream) -> Result<()> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_BYTES));

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Descartar cabeceras
    let mut header = String::new();
    loop {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header.trim().is_empty() {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    let (status, body) = route(method, path);

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let mut stream = reader.into_inner().into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn route(method: &str, path: &str) -> (&'static str, &'static str) {
    match (method, path) {
        ("GET", "/") => ("200 OK", BODY_OK),
        ("GET", _) => ("404 Not Found", "Not Found"),
        _ => ("405 Method Not Allowed", "Method Not Allowed"),
    }
}

/// Checks a running instance on localhost; used by `--health-check`.
pub async fn check_running(port: u16) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let body = client
        .get(format!("http://127.0.0.1:{}/", port))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if body.trim() != BODY_OK {
        anyhow::bail!("Respuesta inesperada del health check: {:?}", body);
    }
    Ok(())
}
