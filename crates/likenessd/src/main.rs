use anyhow::{Context, Result};
use likenessd::{build_router, serve, spawn_engine, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let profile = config.service.profile();
    tracing::info!(
        service = %config.service,
        model_dir = %config.model_dir.display(),
        bind = %config.bind,
        "likenessd starting"
    );

    // Load models synchronously so a missing file fails start-up, not requests.
    let embedder = likeness_core::load_embedder(config.service, &config.model_dir, config.intra_threads)
        .with_context(|| format!("loading {} model from {}", config.service, config.model_dir.display()))?;
    let engine = spawn_engine(embedder, config.queue_depth)?;

    let router = build_router(AppState { engine, profile }, config.max_upload_bytes());
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;

    tracing::info!(
        compare = profile.compare_route,
        embed = profile.embed_route,
        threshold = profile.threshold,
        "likenessd ready"
    );
    serve(listener, router).await?;

    Ok(())
}
