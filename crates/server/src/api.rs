//! HTTP surface: `GET /v1/movies/:id` and `GET /health`.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use movie_types::Movie;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::aggregator::MovieAggregator;
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{MovieError, handle_panic};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
#[derive(Clone)]
struct AppState {
    aggregator: MovieAggregator,
    timeout: Duration,
}

/// The movie aggregation HTTP server.
#[derive(Clone)]
pub struct MovieServer {
    aggregator: MovieAggregator,
    timeout: Duration,
}

impl MovieServer {
    pub fn new(aggregator: MovieAggregator) -> Self {
        Self {
            aggregator,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the overall request timeout. Expiry drops both in-flight legs
    /// and answers 504.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let state = AppState {
            aggregator: self.aggregator.clone(),
            timeout: self.timeout,
        };

        Router::new()
            .route("/v1/movies/:id", get(get_movie))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
            .with_state(state)
    }

    /// Bind `addr` and serve in the background.
    pub async fn start(&self, addr: SocketAddr) -> Result<MovieServerHandle, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;
        let app = self.router();
        let (stop_tx, mut stop_rx) = watch::channel(());

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                // Resolves on `stop()` or when the handle is dropped.
                let _ = stop_rx.changed().await;
            });

            if let Err(e) = server.await {
                error!("Movie server error: {}", e);
            }
        });

        info!("Movie server listening on {}", actual_addr);
        Ok(MovieServerHandle {
            addr: actual_addr,
            stop_tx,
            task,
        })
    }
}

/// Handle to a running [`MovieServer`]. Dropping it stops the server.
#[derive(Debug)]
pub struct MovieServerHandle {
    addr: SocketAddr,
    stop_tx: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl MovieServerHandle {
    /// The address the server is actually bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Ask the server to stop without waiting for it.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }

    /// Wait until the server has stopped.
    pub async fn stopped(self) {
        let MovieServerHandle { stop_tx, task, .. } = self;
        if let Err(e) = task.await {
            error!("Movie server task failed: {}", e);
        }
        drop(stop_tx);
    }
}

async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, MovieError> {
    let composed = timeout(state.timeout, state.aggregator.get_movie(&id)).await;
    match composed {
        Ok(result) => result.map(Json),
        Err(_) => Err(MovieError::TimedOut {
            id,
            after: state.timeout,
        }),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
