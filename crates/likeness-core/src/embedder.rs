//! The embedding-model seam.

use crate::decode::{DecodePolicy, DecodedImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("model file not found: {0} (place the ONNX export in the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("expected {expected}-dim embedding, got {actual}")]
    UnexpectedDim { expected: usize, actual: usize },
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// An image embedding model.
///
/// `extract` returns the raw (unnormalised) vector. `Ok(None)` means the
/// model found nothing to embed, e.g. no face in the picture; it is not an
/// error. Implementations own an ONNX session, which needs `&mut self` to
/// run, so callers serialise access.
pub trait Embedder: Send {
    /// Shape the decoder must produce for this model.
    fn decode_policy(&self) -> DecodePolicy;

    /// Length of every vector this instance returns.
    fn dim(&self) -> usize;

    fn model_version(&self) -> &str;

    fn extract(&mut self, image: &DecodedImage) -> Result<Option<Vec<f32>>, ExtractError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn decode_policy(&self) -> DecodePolicy {
        (**self).decode_policy()
    }

    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn model_version(&self) -> &str {
        (**self).model_version()
    }

    fn extract(&mut self, image: &DecodedImage) -> Result<Option<Vec<f32>>, ExtractError> {
        (**self).extract(image)
    }
}

pub(crate) fn check_dim(raw: &[f32], expected: usize) -> Result<(), ExtractError> {
    if raw.len() != expected {
        return Err(ExtractError::UnexpectedDim {
            expected,
            actual: raw.len(),
        });
    }
    Ok(())
}
