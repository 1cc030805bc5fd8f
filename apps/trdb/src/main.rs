//! # TRDB Server
//!
//! This is the main entry point for the **TRDB** database server.
//!
//! The server is composed of multiple internal components organized under
//! the `/crates` directory of this workspace:
//!
//! - `/storage`: Core storage engine handling data persistence and retrieval.
//!
//! This binary is the main executable for the database engine.

use crate::config::EngineConfig;
use crate::engine_environment::EngineEnvironment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use storage_api::{DmsError, Rid};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

mod config;
mod engine_environment;

/// One request, as sent by a client: a length-prefixed JSON frame (a `u32`
/// little-endian byte count followed by that many bytes of UTF-8 JSON).
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Insert { document: serde_json::Value },
    Find { page_id: u32, slot_id: u32 },
    Remove { page_id: u32, slot_id: u32 },
}

/// The matching length-prefixed JSON response frame.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Inserted {
        page_id: u32,
        slot_id: u32,
    },
    Found {
        document: serde_json::Value,
    },
    Removed {
        removed: bool,
    },
    Error {
        error: String,
    },
}

#[tokio::main]
async fn main() {
    let cfg = match EngineConfig::load_from_file("trdb.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let logging_guard = init_logging(&cfg.storage.logs_dir);

    let env = match EngineEnvironment::new(cfg) {
        Ok(env) => Arc::new(env),
        Err(e) => {
            eprintln!("failed to open storage engine: {e}");
            std::process::exit(1);
        }
    };

    let semaphore = Arc::new(Semaphore::new(8));
    let shutdown = CancellationToken::new();

    // Spawn a task that waits for OS shutdown signals and triggers cancellation.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            tracing::info!("shutdown signal received; beginning graceful shutdown");
            shutdown.cancel();
        });
    }

    let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
    tracing::info!("listening on {:?}", listener.local_addr());

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                // Stop accepting new connections.
                tracing::info!("stop accepting new connections");
                break;
            }

            res = listener.accept() => {
                let (socket, addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        if shutdown.is_cancelled() { break; }
                        tracing::warn!("accept failed: {e}");
                        continue;
                    }
                };

                let env_clone = env.clone();
                let semaphore_clone = semaphore.clone();
                let shutdown_clone = shutdown.clone();

                connections.spawn(async move {
                    tracing::info!("client connected: {addr}");
                    handle_client(socket, env_clone, semaphore_clone, shutdown_clone).await;
                    tracing::info!("client disconnected: {addr}");
                });
            }
        }
    }

    tracing::info!("waiting for existing connections to finish");
    while let Some(res) = connections.join_next().await {
        if let Err(join_err) = res {
            tracing::warn!("connection task ended with error: {join_err}");
        }
    }

    drop(logging_guard);
    tracing::info!("shutdown complete");
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt()).expect("sigint handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("sigterm handler");

        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("ctrl_c handler");
    }
}

async fn handle_client(
    socket: TcpStream,
    env: Arc<EngineEnvironment>,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    // Capture peer address early for logging
    let peer = socket.peer_addr().ok();
    tracing::info!("client connected on {:?}", peer);

    // Split the socket so we can read and write concurrently from different tasks.
    let (mut reader, writer) = socket.into_split();

    // mpsc channel for workers to send completed responses to the writer task
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();

    // Spawn a dedicated writer task that serializes all writes to the connection
    let peer_for_writer = peer;
    let writer_handle = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(msg) = rx.recv().await {
            if let Err(e) = writer.write_all(&msg).await {
                tracing::error!(
                    "error while writing response to client {:?}: {}",
                    peer_for_writer,
                    e
                );
                break;
            }
        }
        tracing::info!("writer task exiting for client {:?}", peer_for_writer);
    });

    // Serve multiple requests over the same connection until the client disconnects or shutdown is triggered
    loop {
        let mut len_buf = [0u8; 4];

        let read_res = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown: stop reading new requests");
                return;
            }
            r = reader.read_exact(&mut len_buf) => r,
        };

        if read_res.is_err() {
            tracing::info!("connection closed by client {:?}", peer);
            break;
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        if reader.read_exact(&mut body).await.is_err() {
            tracing::error!("error while reading request body from {:?}", peer);
            break;
        }

        // Acquire an owned permit so it can be moved into the background worker
        let permit = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown: refuse starting new request");
                return;
            }
            p = semaphore.clone().acquire_owned() => p.unwrap(),
        };

        let tx_clone = tx.clone();
        let env_clone = env.clone();

        task::spawn_blocking(move || {
            let response = dispatch(&env_clone, &body);
            let frame = frame_response(&response);
            if tx_clone.send(frame).is_err() {
                tracing::warn!("failed to send response to writer: receiver closed");
            }
        })
        .await
        .unwrap();

        drop(permit);
    }

    // Reader is done (client disconnected or error); drop tx to signal writer to finish
    drop(tx);

    // Wait for writer task to finish before returning
    if let Err(e) = writer_handle.await {
        tracing::warn!("writer task join error: {e}");
    }

    tracing::info!("client handler exiting for {:?}", peer);
}

/// Parses one request frame and runs it against the engine.
fn dispatch(env: &EngineEnvironment, body: &[u8]) -> Response {
    let request: Request = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => return Response::Error { error: format!("malformed request: {e}") },
    };

    match request {
        Request::Insert { document } => {
            let bytes = match serde_json::to_vec(&document) {
                Ok(b) => b,
                Err(e) => return Response::Error { error: format!("bad document: {e}") },
            };
            match env.engine.insert(&bytes) {
                Ok(rid) => Response::Inserted { page_id: rid.page_id, slot_id: rid.slot_id },
                Err(e) => error_response(e),
            }
        }
        Request::Find { page_id, slot_id } => {
            match env.engine.find(Rid::new(page_id, slot_id)) {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(document) => Response::Found { document },
                    Err(e) => Response::Error { error: format!("stored record is not valid JSON: {e}") },
                },
                Err(e) => error_response(e),
            }
        }
        Request::Remove { page_id, slot_id } => {
            match env.engine.remove(Rid::new(page_id, slot_id)) {
                Ok(()) => Response::Removed { removed: true },
                Err(e) => error_response(e),
            }
        }
    }
}

fn error_response(e: DmsError) -> Response {
    Response::Error { error: e.to_string() }
}

/// Serializes a response to JSON and prefixes it with its `u32` little-endian
/// byte length, matching the request framing.
fn frame_response(response: &Response) -> Vec<u8> {
    let body = serde_json::to_vec(response).unwrap_or_else(|_| b"{\"error\":\"internal\"}".to_vec());
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    frame
}

/// Sets up the logging for the server
pub fn init_logging(log_dir: &PathBuf) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    let file_appender = tracing_appender::rolling::daily(log_dir, "trdb.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
