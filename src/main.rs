use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use impostor::state::{spawn_expiry_sweeper, AppState};
use impostor::types::GameConfig;
use impostor::words::WordConfig;
use impostor::{api, broadcast};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impostor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting impostor server...");

    // Initialize the word providers
    let words = WordConfig::from_env().build_service();
    match words.generator_name() {
        Some(name) => tracing::info!("Word generator: {}", name),
        None => tracing::info!("No word generator configured, using candidate words directly"),
    }

    let config = GameConfig::from_env();
    let state = Arc::new(AppState::new(config, words));

    // Background tasks: idle-room expiry and SSE heartbeat
    spawn_expiry_sweeper(state.clone());
    broadcast::spawn_heartbeat(state.clone());

    let app = Router::new()
        .route("/api/create-room", post(api::create_room))
        .route("/api/join-room", post(api::join_room))
        .route("/api/exit-room", post(api::exit_room))
        .route("/api/set-ready", post(api::set_ready))
        .route("/api/game-state", get(api::game_state))
        .route("/api/get-word", get(api::get_word))
        .route("/api/game-events", get(api::game_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
