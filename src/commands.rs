use crate::bridge::{BridgeClient, BridgeServer};
use crate::config::Command;
use crate::error::AppError;
use crate::events::{BrowserForwarder, MessageLogger, spawn_event_pump};
use crate::session::{FixtureSession, SessionAdapter, fetch_snapshot};
use crate::tui::{self, SessionBanner};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use wacore::browser::BrowserViewModel;
use wacore::chat_buffer::ChatBufferStore;
use wacore::chat_list::ChatDirectory;
use wacore::types::events::CoreEventBus;

pub async fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Serve { listen, session } => serve(&listen, &session).await,
        Command::Browse { connect } => browse(&connect).await,
        Command::Local { session } => local(&session).await,
    }
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn open_session(path: &Path) -> Result<FixtureSession, AppError> {
    FixtureSession::load(path).await.map_err(AppError::SessionInit)
}

/// Producer: fetch the snapshot, hand it to the first consumer that connects,
/// then keep logging session events until interrupted.
pub async fn serve(listen: &str, session_path: &Path) -> Result<(), AppError> {
    let session = open_session(session_path).await?;
    let snapshot = fetch_snapshot(&session).await?;

    let bus = Arc::new(CoreEventBus::new());
    bus.add_handler(Arc::new(MessageLogger));
    let events = session.events().await.map_err(AppError::SessionInit)?;
    let pump = spawn_event_pump(events, bus);
    let _pump_guard = scopeguard::guard(pump, |pump| pump.abort());

    let server = BridgeServer::listen(listen).await?;
    let Some(connection) = server.accept_until(shutdown_signal()).await? else {
        return Ok(());
    };
    connection.send_snapshot(&snapshot).await?;

    info!("Snapshot handed off, logging session events until Ctrl+C");
    shutdown_signal().await;
    info!("Shutting down");
    Ok(())
}

/// Consumer: receive a snapshot from a producer and browse it.
pub async fn browse(connect: &str) -> Result<(), AppError> {
    let client = BridgeClient::connect(connect).await?;
    let Some(received) = client.receive_snapshot_until(shutdown_signal()).await? else {
        return Ok(());
    };

    let banner = SessionBanner {
        source: connect.to_string(),
        partial: !received.complete,
        skipped: received.skipped,
    };
    // Live events stay with the producer, so transcripts start and stay empty.
    let model = BrowserViewModel::new(
        ChatDirectory::from_snapshot(received.snapshot),
        Arc::new(ChatBufferStore::new()),
    );
    tui::run(model, banner, None).await?;
    Ok(())
}

/// Session and browser in one process, with history and live messages
/// flowing into the transcripts.
pub async fn local(session_path: &Path) -> Result<(), AppError> {
    let session = open_session(session_path).await?;
    let snapshot = fetch_snapshot(&session).await?;

    let store = Arc::new(ChatBufferStore::new());
    let (forwarder, updates) = BrowserForwarder::channel();

    let bus = Arc::new(CoreEventBus::new());
    bus.add_handler(store.clone());
    bus.add_handler(Arc::new(forwarder));
    bus.add_handler(Arc::new(MessageLogger));

    let events = session.events().await.map_err(AppError::SessionInit)?;
    let pump = spawn_event_pump(events, bus);
    let _pump_guard = scopeguard::guard(pump, |pump| pump.abort());

    let model = BrowserViewModel::new(ChatDirectory::from_snapshot(snapshot), store);
    let banner = SessionBanner::new(session_path.display().to_string());
    tui::run(model, banner, Some(updates)).await?;
    Ok(())
}
