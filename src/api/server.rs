//! Router construction and server lifecycle.

use super::{AppState, custom_fields, filter, tags, views};
use crate::config::ServerConfig;
use crate::db::Database;
use crate::query::dropped_rules;
use anyhow::Context;
use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Filter rules dropped since startup.
    dropped_rules: u64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dropped_rules: dropped_rules(),
    })
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/workspaces/{workspace_id}/tasks/filter",
            post(filter::filter_tasks),
        )
        .route(
            "/workspaces/{workspace_id}/tags",
            get(tags::list_tags).post(tags::create_tag),
        )
        .route(
            "/workspaces/{workspace_id}/custom-fields",
            get(custom_fields::list_fields).post(custom_fields::create_field),
        )
        .route(
            "/lists/{list_id}/custom-fields",
            get(custom_fields::enabled_fields),
        )
        .route(
            "/lists/{list_id}/custom-fields/{field_id}/enable",
            post(custom_fields::enable_field),
        )
        .route("/tasks/{task_id}/tags", get(tags::task_tags))
        .route(
            "/tasks/{task_id}/tags/{tag_id}",
            post(tags::assign_tag).delete(tags::unassign_tag),
        )
        .route(
            "/tasks/{task_id}/custom-fields/{field_id}",
            put(custom_fields::set_value).get(custom_fields::get_value),
        )
        .route("/views", get(views::list_views).post(views::create_view))
        .route(
            "/views/{view_id}",
            get(views::get_view)
                .patch(views::update_view)
                .delete(views::delete_view),
        )
        .route("/views/{view_id}/tasks", get(views::apply_view))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            error!("Server task failed: {}", e);
        }
    }

    /// Wait for the server to stop on its own.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!("Server task failed: {}", e);
        }
    }
}

/// Bind the configured address and start serving in the background.
///
/// Port 0 binds an ephemeral port; the bound address is on the handle.
pub async fn start_server(db: Arc<Database>, config: &ServerConfig) -> anyhow::Result<ServerHandle> {
    let app = build_router(AppState::new(db));

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
