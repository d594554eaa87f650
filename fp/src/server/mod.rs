//! HTTP server: pipeline endpoints, demo pages and session routes

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

mod handlers;
mod page;

pub use handlers::{ApiError, ErrorResponse, SessionResponse};
pub use page::PageRenderer;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::viz::VizManager;

/// Shared, read-only handles given to every request
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub viz: VizManager,
    pub pages: Arc<PageRenderer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline, viz: VizManager) -> Result<Self> {
        let pages = PageRenderer::new(config.viz.script_url.clone())?;
        Ok(Self {
            pipeline,
            viz,
            pages: Arc::new(pages),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/scatter", get(handlers::demo_scatter))
        .route("/bar", get(handlers::demo_bar))
        .route(
            "/scatter/{object_id}/{plot_template_id}/{visual_template_id}",
            get(handlers::scatter),
        )
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route("/sessions/{id}/select", post(handlers::select))
        .with_state(state)
}

/// Serve on an already-bound listener until ctrl-c
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "formplot listening");
    let viz = state.viz.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;
    let _ = viz.shutdown().await;
    Ok(())
}

/// Build every component from `config` and serve on `bind`
pub async fn serve(config: Config, bind: &str) -> Result<()> {
    let pipeline = Pipeline::from_config(&config)?;
    let viz = VizManager::spawn(config.viz.max_sessions);
    let state = AppState::new(config, pipeline, viz)?;
    let listener = TcpListener::bind(bind)
        .await
        .context(format!("Failed to bind {}", bind))?;
    serve_on(listener, state).await
}
