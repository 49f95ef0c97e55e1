//! HTTP admin surface.
//!
//! # Endpoints
//! - `GET /status`: manager state and source
//! - `GET /fields.json`: scalar leaves of the live configuration
//! - `POST /save`: apply a JSON payload and persist it
//! - `GET /`: redirects to `/fields.json`
//!
//! # Design Decisions
//! - Saves run on the blocking pool; change callbacks may block
//! - Optional bearer token on every route

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::manager::{ConfigManager, Record};
use crate::lifecycle::Shutdown;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
pub struct AdminState<T> {
    pub manager: Arc<ConfigManager<T>>,
    pub api_key: Option<Arc<str>>,
}

impl<T> AdminState<T> {
    pub fn new(manager: Arc<ConfigManager<T>>) -> Self {
        Self {
            manager,
            api_key: None,
        }
    }

    /// Require `Authorization: Bearer <key>` on every request.
    pub fn with_api_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl<T> Clone for AdminState<T> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

pub fn setup_admin_router<T: Record>(state: AdminState<T>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::permanent("/fields.json") }))
        .route("/status", get(get_status::<T>))
        .route("/fields.json", get(get_fields::<T>))
        .route("/save", post(post_save::<T>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware::<T>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin router until shutdown is triggered.
pub async fn serve<T: Record>(
    listener: TcpListener,
    state: AdminState<T>,
    shutdown: Shutdown,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Starting configuration server");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown.signalled())
        .await?;

    tracing::info!("Configuration server stopped");
    Ok(())
}
