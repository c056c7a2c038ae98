//! Endpoint handlers: multipart in, JSON out.

use crate::error::ApiError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use likeness_core::profile::{MISSING_PAIR_MESSAGE, MISSING_SINGLE_MESSAGE};
use likeness_core::{compare, Verdict};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding_dim: usize,
    pub embedding_vector: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub model_version: String,
    pub embedding_dim: usize,
    pub threshold: f64,
}

/// POST /compare_faces, /compare_images: fields `image1`, `image2`.
pub async fn compare_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Verdict>, ApiError> {
    let mut files = read_files(multipart).await?;
    let (Some(image1), Some(image2)) = (files.remove("image1"), files.remove("image2")) else {
        return Err(ApiError::MissingField(MISSING_PAIR_MESSAGE));
    };

    // Both images go through the model before the not-detected check, so a
    // broken second upload still reports as a processing failure.
    let first = state.engine.embed(image1).await?;
    let second = state.engine.embed(image2).await?;

    let (Some(a), Some(b)) = (first, second) else {
        return Err(ApiError::NotDetected(state.profile.not_detected_pair));
    };

    let verdict = compare(state.profile, &a, &b)?;
    tracing::info!(
        service = %state.profile.kind,
        similarity = verdict.similarity,
        result = %verdict.result,
        "compared images"
    );
    Ok(Json(verdict))
}

/// POST /get_embeddings: field `image`.
pub async fn get_embeddings(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let mut files = read_files(multipart).await?;
    let Some(image) = files.remove("image") else {
        return Err(ApiError::MissingField(MISSING_SINGLE_MESSAGE));
    };

    let embedding = state
        .engine
        .embed(image)
        .await?
        .ok_or(ApiError::NotDetected(state.profile.not_detected_single))?;

    tracing::info!(service = %state.profile.kind, dim = embedding.dim(), "extracted embedding");
    Ok(Json(EmbeddingResponse {
        embedding_dim: embedding.dim(),
        embedding_vector: embedding.values,
    }))
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let info = state.engine.info();
    Json(StatusResponse {
        service: state.profile.kind.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_version: info.model_version.clone(),
        embedding_dim: info.dim,
        threshold: state.profile.reported_threshold(),
    })
}

/// Collect uploaded files by field name.
///
/// Only parts carrying a filename count as files; plain form values are
/// skipped. The first part wins when a name repeats. A request that is not
/// multipart at all simply has no files.
async fn read_files(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<HashMap<String, Bytes>, ApiError> {
    let mut files = HashMap::new();
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::debug!(%rejection, "request carries no multipart body");
            return Ok(files);
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_none() || files.contains_key(&name) {
            continue;
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        files.insert(name, data);
    }

    Ok(files)
}

// Oversized bodies surface here too; axum would answer 413, the service answers 400.
fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::debug!(status = %err.status(), "multipart stream rejected");
    ApiError::Multipart(err.body_text())
}
