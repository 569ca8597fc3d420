use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fleet_server::engine::{EngineConfig, Scheduler};
use fleet_server::store::InMemoryStore;
use fleet_server::web::{AppState, create_router};

/// Seed data file consulted when `FLEET_SEED` is not set.
const DEFAULT_SEED_PATH: &str = "data/seed.json";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load seed data if available; an empty store is fine for development.
    let seed_path = std::env::var("FLEET_SEED").unwrap_or_else(|_| DEFAULT_SEED_PATH.to_string());
    let store = if std::path::Path::new(&seed_path).exists() {
        match InMemoryStore::from_json_file(&seed_path) {
            Ok(store) => {
                info!(path = %seed_path, "loaded seed data");
                store
            }
            Err(e) => {
                warn!(path = %seed_path, error = %e, "failed to load seed data; starting empty");
                InMemoryStore::new()
            }
        }
    } else {
        warn!(path = %seed_path, "no seed data found; starting with an empty store");
        InMemoryStore::new()
    };

    // Build the engine and its periodic driver.
    let scheduler = Scheduler::new(Arc::new(store), EngineConfig::default());
    let state = AppState::new(scheduler);

    // Start the continuous driver unless explicitly disabled.
    if std::env::var("FLEET_NO_CONTINUOUS").is_err() {
        state.continuous.start();
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("fleet scheduling server listening on http://{addr}");
    println!("Fleet Scheduling Server listening on http://{addr}");
    println!();
    println!("API Endpoints:");
    println!("  GET    /health             - Health check");
    println!("  POST   /schedule/run       - Multi-day scheduling run");
    println!("  POST   /schedule/bus/:id   - Schedule a single bus");
    println!("  GET    /schedule/preview   - Dry-run preview");
    println!("  POST   /schedule/mass      - Single-date mass scheduling");
    println!("  POST   /schedule/stop      - Stop the active run");
    println!("  GET    /schedule/status    - Engine run state");
    println!("  DELETE /schedule/clear     - Clear scheduled trips");
    println!("  POST   /continuous/start   - Start the periodic driver");
    println!("  POST   /continuous/stop    - Stop the periodic driver");
    println!("  GET    /continuous/status  - Periodic driver status");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
