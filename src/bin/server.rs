use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use pacman_maze_engine::config::GameConfig;
use pacman_maze_engine::custom_maps::{store_level_text, Overwrite};
use pacman_maze_engine::driver::{TickDriver, TickListener};
use pacman_maze_engine::error::IntakeError;
use pacman_maze_engine::high_scores::HighScoreStore;
use pacman_maze_engine::level_library::LevelLibrary;
use pacman_maze_engine::protocol::{
    error_message, parse_client_message, pong_message, state_message, ClientMessage,
};
use pacman_maze_engine::session::{GameSession, TickReport};
use pacman_maze_engine::types::Speed;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type SharedState = Arc<AppState>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Renderer bridge for the tile maze engine")]
struct Cli {
    /// Defaults to $PORT, then 8080.
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    levels_dir: Option<PathBuf>,
    #[arg(long)]
    high_scores: Option<PathBuf>,
    /// Starting speed for new connections: fast, normal or slow.
    #[arg(long)]
    speed: Option<String>,
}

struct AppState {
    config: GameConfig,
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    overwrite: Option<bool>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let port = cli.port.unwrap_or_else(|| {
        std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080)
    });
    let config = resolve_config(&cli);
    info!(
        levels_dir = %config.levels_dir.display(),
        high_scores = %config.high_scores_path.display(),
        tick_ms = config.tick_ms,
        "configuration loaded"
    );
    let state = Arc::new(AppState { config });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/high-scores", get(high_scores_handler))
        .route("/api/levels", get(levels_handler))
        .route("/api/levels/{name}", post(upload_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving renderer assets");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("renderer assets not found; set STATIC_DIR to serve them");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    info!(port, "listening");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn resolve_config(cli: &Cli) -> GameConfig {
    let mut config = GameConfig::from_env();
    if let Some(dir) = cli.levels_dir.clone() {
        config.levels_dir = dir;
    }
    if let Some(path) = cli.high_scores.clone() {
        config.high_scores_path = path;
    }
    if let Some(speed) = cli.speed.as_deref() {
        match Speed::parse(speed) {
            Some(speed) => config.tick_ms = speed.period_ms(),
            None => warn!(speed, "unknown speed preset, keeping default"),
        }
    }
    config
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("web/dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn high_scores_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let store = HighScoreStore::with_capacity(
        state.config.high_scores_path.clone(),
        state.config.max_high_scores,
    );
    Json(json!({
        "scores": store.scores(),
        "ranked": store.ranked(),
    }))
}

async fn levels_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let library = LevelLibrary::new(state.config.levels_dir.clone());
    Json(json!({ "levels": library.custom_levels() }))
}

async fn upload_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> impl IntoResponse {
    let overwrite = if query.overwrite.unwrap_or(false) {
        Overwrite::Confirmed
    } else {
        Overwrite::Ask
    };
    match store_level_text(&name, &body, &state.config.levels_dir, overwrite) {
        Ok(stored) => (
            StatusCode::CREATED,
            Json(json!({
                "name": stored.name,
                "replaced": stored.replaced,
            })),
        ),
        Err(error) => {
            let status = intake_status(&error);
            if status.is_server_error() {
                warn!(%error, "level upload failed");
            }
            (status, Json(error_message(&error.to_string())))
        }
    }
}

fn intake_status(error: &IntakeError) -> StatusCode {
    match error {
        IntakeError::Invalid(_) | IntakeError::InvalidName(_) => StatusCode::BAD_REQUEST,
        IntakeError::ReservedName(_) | IntakeError::AlreadyExists { .. } => StatusCode::CONFLICT,
        IntakeError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel::<String>(256);
    let session = Arc::new(Mutex::new(GameSession::new(state.config.clone())));

    let listener_tx = tx.clone();
    let listener: TickListener = Arc::new(move |session: &mut GameSession, _report: &TickReport| {
        // A slow client misses frames rather than stalling the tick loop.
        let _ = listener_tx.try_send(state_message(&session.snapshot(true)).to_string());
    });
    let mut driver = TickDriver::new(session.clone(), Some(listener));
    driver.start().await;
    debug!("client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    send(&tx, state_message(&session.lock().await.snapshot(true)));

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&mut driver, &tx, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(&mut driver, &tx, &text).await;
                } else {
                    send(&tx, error_message("invalid utf8 message"));
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // The listener holds a sender; the writer only finishes once it is gone.
    drop(driver);
    debug!("client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(driver: &mut TickDriver, tx: &mpsc::Sender<String>, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send(tx, error_message("invalid message"));
        return;
    };

    let session = driver.session().clone();
    match message {
        ClientMessage::Input { dir } => session.lock().await.set_intent(dir),
        ClientMessage::Speed { period_ms } => {
            driver.set_speed(period_ms).await;
            send(tx, state_message(&session.lock().await.snapshot(true)));
        }
        ClientMessage::StartCampaign => {
            let mut guard = session.lock().await;
            let result = guard.start_campaign();
            reply(tx, &mut guard, result.map_err(|error| error.to_string()));
        }
        ClientMessage::StartCustom { name } => {
            let mut guard = session.lock().await;
            let result = guard.start_custom(&name);
            reply(tx, &mut guard, result.map_err(|error| error.to_string()));
        }
        ClientMessage::Restart => {
            let mut guard = session.lock().await;
            let result = guard.restart_from_start();
            reply(tx, &mut guard, result.map_err(|error| error.to_string()));
        }
        ClientMessage::Menu => {
            let mut guard = session.lock().await;
            guard.return_to_menu();
            reply(tx, &mut guard, Ok(()));
        }
        ClientMessage::Ping { t } => send(tx, pong_message(t)),
    }
}

fn reply(tx: &mpsc::Sender<String>, session: &mut GameSession, result: Result<(), String>) {
    if let Err(message) = result {
        debug!(%message, "client request rejected");
        send(tx, error_message(&message));
    }
    send(tx, state_message(&session.snapshot(true)));
}

fn send(tx: &mpsc::Sender<String>, message: Value) {
    let _ = tx.try_send(message.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacman_maze_engine::error::LevelError;

    #[test]
    fn intake_errors_map_to_statuses() {
        assert_eq!(
            intake_status(&IntakeError::Invalid(LevelError::Empty)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            intake_status(&IntakeError::InvalidName("..".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            intake_status(&IntakeError::ReservedName("level1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            intake_status(&IntakeError::AlreadyExists {
                name: "arena".to_string(),
                path: PathBuf::from("levels/arena.txt"),
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli {
            port: None,
            levels_dir: Some(PathBuf::from("/srv/levels")),
            high_scores: None,
            speed: Some("slow".to_string()),
        };
        let config = resolve_config(&cli);
        assert_eq!(config.levels_dir, PathBuf::from("/srv/levels"));
        assert_eq!(config.tick_ms, 300);
    }
}
