//! The model engine: one OS thread owning the embedding model.
//!
//! ONNX sessions need `&mut` to run, so every extraction goes through a
//! single thread. HTTP handlers hold a cloneable [`EngineHandle`] and wait on
//! a oneshot reply; the async runtime never blocks on inference.

use axum::body::Bytes;
use likeness_core::{Embedder, Embedding, Pipeline, PipelineError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Static facts about the loaded model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub dim: usize,
    pub model_version: String,
}

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Embed {
        image: Bytes,
        reply: oneshot::Sender<Result<Option<Embedding>, PipelineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
    info: Arc<ModelInfo>,
}

impl EngineHandle {
    /// Decode, embed and normalise one uploaded image.
    ///
    /// `Ok(None)` when the model found nothing to embed.
    pub async fn embed(&self, image: Bytes) -> Result<Option<Embedding>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Embed {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        Ok(reply_rx.await.map_err(|_| EngineError::ChannelClosed)??)
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Spawn the engine on a dedicated OS thread around an already-loaded model.
///
/// The model is built once by the caller (fail-fast at start-up) and moved
/// into the thread. The thread exits when every handle is dropped.
pub fn spawn_engine(
    embedder: Box<dyn Embedder>,
    queue_depth: usize,
) -> Result<EngineHandle, EngineError> {
    let mut pipeline = Pipeline::new(embedder);
    let info = Arc::new(ModelInfo {
        dim: pipeline.dim(),
        model_version: pipeline.model_version().to_string(),
    });

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(queue_depth.max(1));

    std::thread::Builder::new()
        .name("likeness-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Embed { image, reply } => {
                        let started = std::time::Instant::now();
                        let result = pipeline.embed(&image);
                        tracing::debug!(
                            bytes = image.len(),
                            found = matches!(result, Ok(Some(_))),
                            failed = result.is_err(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "embed"
                        );
                        // Receiver gone means the client hung up; nothing to do.
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    tracing::info!(
        dim = info.dim,
        model_version = %info.model_version,
        queue_depth,
        "engine ready"
    );

    Ok(EngineHandle { tx, info })
}
