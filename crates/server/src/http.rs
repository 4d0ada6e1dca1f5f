//! axum surface for the host UI.
//!
//! Commands go in over `POST /command`; painted frames come back either by
//! polling `GET /frame` or pushed over the `/ws` WebSocket, which also
//! relays editor events.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use cityblock_engine::catalog::{self, BlockFamily};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

use crate::editor::{Command, EditorHandle, Reply};

pub fn router(handle: EditorHandle) -> Router {
    Router::new()
        .route("/frame", get(frame))
        .route("/command", post(command))
        .route("/export", get(export))
        .route("/catalog", get(catalog_index))
        .route("/minimap", get(minimap))
        .route("/ws", get(ws_upgrade))
        .with_state(handle)
}

/// Also serve `{dir}/{id}.svg` under `{url_prefix}/{id}.svg`.
pub fn with_block_files(router: Router, url_prefix: &str, dir: PathBuf) -> Router {
    let dir = Arc::new(dir);
    let route = format!("{}/:file", url_prefix.trim_end_matches('/'));
    router.route(&route, get(move |Path(file): Path<String>| block_file(Arc::clone(&dir), file)))
}

/// Serve until the listener fails.
pub async fn start(router: Router, bind: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Editor listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn block_file(dir: Arc<PathBuf>, file: String) -> Response {
    // Only `{id}.svg`, so requests cannot leave `dir`.
    let Some(id) = file.strip_suffix(".svg").and_then(|id| id.parse::<u16>().ok()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(dir.join(format!("{id}.svg"))).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/svg+xml")], bytes).into_response(),
        Err(e) => {
            tracing::debug!("Block file {} unavailable: {}", id, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn frame(State(handle): State<EditorHandle>) -> impl IntoResponse {
    Json(handle.latest_frame())
}

async fn minimap(State(handle): State<EditorHandle>) -> impl IntoResponse {
    Json(handle.latest_frame().minimap.clone())
}

async fn command(State(handle): State<EditorHandle>, Json(command): Json<Command>) -> Response {
    match handle.send(command).await {
        Ok(reply @ Reply::Error { .. }) => (StatusCode::BAD_REQUEST, Json(reply)).into_response(),
        Ok(reply) => Json(reply).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn export(State(handle): State<EditorHandle>, Query(params): Query<HashMap<String, String>>) -> Response {
    let date = params.get("date").cloned();
    match handle.send(Command::Export { date }).await {
        Ok(Reply::Exported { xml }) => ([(header::CONTENT_TYPE, "application/xml")], xml).into_response(),
        Ok(other) => internal_error(anyhow::anyhow!("unexpected reply to export: {:?}", other)),
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Request failed: {:#}", e);
    let body = Json(Reply::Error { message: format!("{e:#}") });
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

#[derive(Serialize)]
struct FamilyEntry {
    #[serde(flatten)]
    family: &'static BlockFamily,
    first: u16,
    last: u16,
}

async fn catalog_index() -> impl IntoResponse {
    let families: Vec<FamilyEntry> = catalog::FAMILIES
        .iter()
        .map(|family| FamilyEntry {
            family,
            first: family.first().0,
            last: family.last().0,
        })
        .collect();
    Json(families)
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(handle): State<EditorHandle>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, handle))
}

/// Push frames as they are published, and relay editor events.
async fn handle_socket(mut socket: WebSocket, handle: EditorHandle) {
    let mut frames = handle.frames();
    let mut events = handle.subscribe_events();

    let first = serde_json::json!({ "type": "frame", "data": *frames.borrow_and_update() });
    if send_json(&mut socket, &first).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = frames.changed() => {
                if result.is_err() {
                    break; // editor task gone
                }
                let frame = frames.borrow_and_update().clone();
                let msg = serde_json::json!({ "type": "frame", "data": frame });
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let msg = serde_json::json!({ "type": "event", "data": event });
                        if send_json(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => tracing::debug!("WebSocket client lagged {} events", n),
                    Err(RecvError::Closed) => break,
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        // Clients may also drive the editor over the socket.
                        let reply = match serde_json::from_str::<Command>(&text) {
                            Ok(command) => match handle.send(command).await {
                                Ok(reply) => reply,
                                Err(_) => break,
                            },
                            Err(e) => Reply::Error { message: e.to_string() },
                        };
                        let msg = serde_json::json!({ "type": "reply", "data": reply });
                        if send_json(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

async fn send_json(socket: &mut WebSocket, value: &serde_json::Value) -> Result<(), ()> {
    socket.send(Message::Text(value.to_string())).await.map_err(|_| ())
}
