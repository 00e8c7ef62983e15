//! parley-relay: WebSocket server for live discussion rooms.
//!
//! Accepts WebSocket connections, hands each client's events to the session
//! coordinator and relays WebRTC negotiation between peers. Media never
//! passes through the server.

mod connection;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use parley_common::{ConfigError, ParleyError};
use parley_config::ParleyConfig;
use parley_session::{Coordinator, CoordinatorHandle};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;

#[derive(Parser)]
#[command(name = "parley-relay", about = "Discussion room coordinator and WebRTC signaling relay")]
struct Args {
    /// Path to a config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on. Overrides the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Preparation phase length in seconds. Overrides the config file.
    #[arg(long)]
    prep_duration: Option<u64>,
}

#[tokio::main]
async fn main() -> parley_common::Result<()> {
    let args = Args::parse();

    // An explicitly named config file must load; the platform default may
    // fall back to built-in settings.
    let (config, load_error) = match load(&args) {
        Ok(config) => (config, None),
        Err(e) if args.config.is_some() => return Err(e.into()),
        Err(e) => (ParleyConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .init();

    if let Some(e) = load_error {
        tracing::warn!(error = %e, "Config load failed, using defaults");
    }

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        prep_secs = config.discussion.prep_duration_secs,
        topics = config.discussion.topics.len(),
        "parley-relay listening on {}",
        addr
    );

    let (handle, coordinator) =
        Coordinator::spawn(config.discussion.clone(), config.server.command_capacity);

    // Periodic stats line.
    let stats_handle = handle.clone();
    let interval = Duration::from_secs(config.stats.interval_secs);
    let stats_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match stats_handle.stats().await {
                Ok(stats) => tracing::info!(
                    rooms = stats.rooms,
                    participants = stats.participants,
                    connections = stats.connections,
                    "Stats tick"
                ),
                Err(_) => break,
            }
        }
    });

    let settings = ClientSettings {
        outbound_capacity: config.server.outbound_capacity,
        handshake_timeout: Duration::from_secs(config.server.handshake_timeout_secs),
    };
    serve(listener, handle.clone(), settings, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    })
    .await;

    stats_task.abort();
    if let Err(e) = handle.shutdown().await {
        tracing::debug!(error = %e, "Coordinator already stopped");
    }
    coordinator
        .await
        .map_err(|e| ParleyError::Other(format!("coordinator task failed: {e}")))?;
    tracing::info!("parley-relay stopped");
    Ok(())
}

/// Resolve the config file and apply command-line overrides.
fn load(args: &Args) -> Result<ParleyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => parley_config::load_from_path(path)?,
        None => parley_config::load_default()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(secs) = args.prep_duration {
        config.discussion.prep_duration_secs = secs;
    }
    parley_config::validate(&config)?;
    Ok(config)
}

/// Per-client transport settings.
#[derive(Debug, Clone, Copy)]
struct ClientSettings {
    outbound_capacity: usize,
    handshake_timeout: Duration,
}

/// Accept clients until `shutdown` resolves.
async fn serve(
    listener: TcpListener,
    handle: CoordinatorHandle,
    settings: ClientSettings,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => spawn_client(stream, peer, handle.clone(), settings),
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
            _ = &mut shutdown => break,
        }
    }
}

fn spawn_client(
    stream: TcpStream,
    peer: SocketAddr,
    handle: CoordinatorHandle,
    settings: ClientSettings,
) {
    tokio::spawn(async move {
        match tokio::time::timeout(settings.handshake_timeout, accept_async(stream)).await {
            Ok(Ok(ws)) => handle_connection(ws, peer, handle, settings.outbound_capacity).await,
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
            }
            Err(_) => {
                tracing::warn!(peer = %peer, "WS handshake timed out");
            }
        }
    });
}
