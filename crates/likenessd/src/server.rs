//! Router assembly and the serve loop.

use crate::engine::EngineHandle;
use crate::handlers;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use likeness_core::ServiceProfile;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared per-process state: the model engine and the service it serves.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub profile: &'static ServiceProfile,
}

/// Build the router for `state.profile`: its compare and embed routes plus
/// `/status`, open to any origin.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(state.profile.compare_route, post(handlers::compare_images))
        .route(state.profile.embed_route, post(handlers::get_embeddings))
        .route("/status", get(handlers::status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("likenessd shutting down");
}
