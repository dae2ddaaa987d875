use crate::supervisor::{Mode, Supervisor};
use crate::viewer::StreamViewer;
use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    /// std Mutex: the supervisor blocks (process teardown), so all access
    /// goes through `spawn_blocking`.
    pub supervisor: Arc<Mutex<Supervisor>>,
    pub viewer: Arc<StreamViewer>,
    pub stream_interval: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mode", get(get_mode).post(post_mode))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_mode(State(state): State<AppState>) -> Result<Json<Mode>, StatusCode> {
    let supervisor = Arc::clone(&state.supervisor);
    let mode = tokio::task::spawn_blocking(move || match supervisor.lock() {
        Ok(mut sup) => Ok(sup.mode()),
        Err(_) => Err(()),
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(mode))
}

async fn post_mode(
    State(state): State<AppState>,
    Json(target): Json<Mode>,
) -> Result<Json<Mode>, (StatusCode, String)> {
    let supervisor = Arc::clone(&state.supervisor);
    let result = tokio::task::spawn_blocking(move || {
        let mut sup = supervisor
            .lock()
            .map_err(|_| anyhow::anyhow!("supervisor lock poisoned"))?;
        sup.set_mode(target)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match result {
        Ok(mode) => Ok(Json(mode)),
        Err(e) => {
            tracing::warn!("Mode switch rejected: {e}");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // No worker, no frames: refuse the stream instead of serving silence.
    let supervisor = Arc::clone(&state.supervisor);
    let mode = tokio::task::spawn_blocking(move || {
        supervisor.lock().map(|mut s| s.mode()).map_err(|_| ())
    })
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "supervisor lock poisoned".into()))?;

    if mode.is_standby() {
        return Err((StatusCode::CONFLICT, "no active mode to stream".into()));
    }

    Ok(ws.on_upgrade(|socket| stream_socket(socket, state)))
}

async fn stream_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("Stream client connected");
    let _guard = state.viewer.attach().await;
    let mut latest = state.viewer.latest();

    let mut ticker = tokio::time::interval(state.stream_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_sent: Option<usize> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // The stream ends with the mode, not just with the client.
                // try_lock: skip the check rather than stall the tick while a
                // mode switch holds the lock.
                if let Ok(mut sup) = state.supervisor.try_lock()
                    && sup.mode().is_standby()
                {
                    tracing::info!("Mode returned to standby, closing stream");
                    break;
                }

                let frame = latest.borrow().clone();
                if let Some(frame) = frame {
                    // Skip if the cell still holds the frame we already sent.
                    let id = Arc::as_ptr(&frame) as usize;
                    if last_sent == Some(id) {
                        continue;
                    }
                    if socket.send(Message::Binary(frame.to_vec())).await.is_err() {
                        break;
                    }
                    last_sent = Some(id);
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Pings are answered by axum; other messages ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    tracing::info!("Stream client disconnected");
    // _guard drop detaches the viewer.
}
