pub mod handlers;
pub mod types;

use crate::{
    Result,
    config::Config,
    inference::MathSolver,
    llm::{LlmClient, OpenAiClient},
    store::{ImageStore, STATIC_ROUTE, Sweeper},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

/// Builds the application router: API routes, stored image serving, open
/// CORS and the JSON body limit.
pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let temp_files = ServeDir::new(state.store.dir());

    Router::new()
        .route("/test", get(handlers::health))
        .route("/vision", post(handlers::vision))
        .route("/calculate", post(handlers::calculate))
        .route("/solve-steps", post(handlers::solve_steps))
        .nest_service(STATIC_ROUTE, temp_files)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let store = Arc::new(ImageStore::from_config(&config.storage, &config.server));
    if !store.dir().is_dir() {
        warn!(
            "Temp directory {} does not exist; saving images will fail until it is created",
            store.dir().display()
        );
    }

    if config.vision.api_key.is_empty() {
        warn!("No API key configured for the vision provider");
    }
    if config.solver.api_key.is_empty() {
        warn!("No API key configured for the solver provider");
    }

    let vision: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.vision.clone()));
    let language: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config.solver.clone()));
    let solver = MathSolver::new(vision, language, store.clone(), config.recognition.clone());

    let sweeper = Sweeper::start(
        store.clone(),
        Duration::from_secs(config.storage.sweep_interval_secs),
    );

    let app_state = AppState {
        solver: Arc::new(solver),
        store,
    };
    let app = router(app_state, config.server.body_limit_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server is running on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    first_signal(ctrl_c, terminate).await;
}

async fn first_signal(ctrl_c: impl Future<Output = ()>, terminate: impl Future<Output = ()>) {
    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received termination signal, shutting down"),
    }
}
