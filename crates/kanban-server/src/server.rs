use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use kanban_store::TaskRepo;

use crate::cors::{self, CorsConfig};
use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors: CorsConfig::default(),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskRepo,
}

impl AppState {
    pub fn new(tasks: TaskRepo) -> Self {
        Self { tasks }
    }
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{id}",
            get(handlers::show_task)
                .patch(handlers::update_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
}

/// Build the Axum router with all routes. Task routes are served both at the
/// root and under `/api/v1`.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(task_routes())
        .nest("/api/v1", task_routes())
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors::cors_layer(cors))
}

/// Bind and start serving in the background. Returns a handle to shut it down.
pub async fn start(config: ServerConfig, tasks: TaskRepo) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(AppState::new(tasks), &config.cors);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "server stopped with error");
        }
    });

    tracing::info!(addr = %local_addr, "Kanban server started");

    Ok(ServerHandle {
        addr: local_addr,
        port: local_addr.port(),
        shutdown: Some(shutdown_tx),
        server,
    })
}

/// Handle returned by `start()`, keeps the server task alive.
pub struct ServerHandle {
    pub addr: SocketAddr,
    pub port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.server).await {
            tracing::error!(error = %e, "server task failed");
        }
        tracing::info!("Kanban server stopped");
    }
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.tasks.database().ping() {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "healthy"}))),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy"})),
            )
        }
    }
}
