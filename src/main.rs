//! Rally Rounds binary entrypoint wiring REST, SSE, the local session and the remote document store.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use rally_rounds::{
    config::AppConfig,
    routes,
    services::game_service,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage_supervisor(&app_state)?;
    // Solo play has no lobby, so the local ticker runs from the start.
    game_service::ensure_ticker(&app_state).await;

    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    game_service::shutdown(&app_state).await;
    Ok(())
}

/// Start the CouchDB supervisor when a backend is configured.
#[cfg(feature = "couch-store")]
fn spawn_storage_supervisor(state: &SharedState) -> anyhow::Result<()> {
    use std::sync::Arc;

    use rally_rounds::{
        dao::{
            game_store::{
                GameStore,
                couchdb::{CouchConfig, CouchGameStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };
    use tracing::warn;

    let Some(config) = CouchConfig::from_env().context("reading CouchDB configuration")? else {
        warn!("COUCH_BASE_URL not set; online lobbies stay unavailable");
        return Ok(());
    };

    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let config = config.clone();
        async move {
            CouchGameStore::connect(config)
                .await
                .map(|store| Arc::new(store) as Arc<dyn GameStore>)
                .map_err(StorageError::from)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "couch-store"))]
fn spawn_storage_supervisor(_state: &SharedState) -> anyhow::Result<()> {
    tracing::warn!("built without a remote store; online lobbies stay unavailable");
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
