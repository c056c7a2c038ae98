//! ArcFace face recognizer via ONNX Runtime.
//!
//! Produces 512-dimensional identity embeddings from aligned 112×112 RGB
//! face crops, using the w600k_r50 ArcFace model.

use crate::alignment::{self, ALIGNED_SIZE};
use crate::decode::DecodedImage;
use crate::embedder::{check_dim, ExtractError};
use crate::types::BoundingBox;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

// Not the SCRFD constants: ArcFace uses symmetric normalisation.
const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5;
pub const ARCFACE_EMBEDDING_DIM: usize = 512;
pub const ARCFACE_MODEL_VERSION: &str = "w600k_r50";

/// ArcFace-based face recognizer.
pub struct FaceRecognizer {
    session: Session,
}

impl FaceRecognizer {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path, intra_threads: usize) -> Result<Self, ExtractError> {
        if !model_path.exists() {
            return Err(ExtractError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded ArcFace model"
        );

        Ok(Self { session })
    }

    /// Extract the raw (unnormalised) embedding of `face` in `image`.
    ///
    /// The face must carry landmarks; it is aligned to a canonical 112×112
    /// crop before inference.
    pub fn extract(
        &mut self,
        image: &DecodedImage,
        face: &BoundingBox,
    ) -> Result<Vec<f32>, ExtractError> {
        let landmarks = face.landmarks.as_ref().ok_or_else(|| {
            ExtractError::InferenceFailed("detected face has no landmarks for alignment".into())
        })?;

        let aligned = alignment::align_face(image.pixels(), image.width(), image.height(), landmarks);
        let input = preprocess(&aligned);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ExtractError::InferenceFailed(format!("embedding extraction: {e}")))?;

        let raw = raw.to_vec();
        check_dim(&raw, ARCFACE_EMBEDDING_DIM)?;
        Ok(raw)
    }
}

/// Convert a packed 112×112 RGB crop into a NCHW float tensor.
fn preprocess(aligned_face: &[u8]) -> Array4<f32> {
    let size = ALIGNED_SIZE;
    Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let pixel = aligned_face.get((y * size + x) * 3 + c).copied().unwrap_or(0) as f32;
        (pixel - ARCFACE_MEAN) / ARCFACE_STD
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_output_shape() {
        let aligned = vec![128u8; ALIGNED_SIZE * ALIGNED_SIZE * 3];
        let tensor = preprocess(&aligned);
        assert_eq!(tensor.shape(), &[1, 3, ALIGNED_SIZE, ALIGNED_SIZE]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let aligned = vec![255u8; ALIGNED_SIZE * ALIGNED_SIZE * 3];
        let tensor = preprocess(&aligned);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);

        let aligned = vec![0u8; ALIGNED_SIZE * ALIGNED_SIZE * 3];
        let tensor = preprocess(&aligned);
        assert!((tensor[[0, 2, 5, 5]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        let mut aligned = Vec::with_capacity(ALIGNED_SIZE * ALIGNED_SIZE * 3);
        for _ in 0..ALIGNED_SIZE * ALIGNED_SIZE {
            aligned.extend_from_slice(&[255, 0, 128]);
        }
        let tensor = preprocess(&aligned);
        let (r, g, b) = (tensor[[0, 0, 7, 9]], tensor[[0, 1, 7, 9]], tensor[[0, 2, 7, 9]]);
        assert!((r - 1.0).abs() < 1e-6);
        assert!((g + 1.0).abs() < 1e-6);
        assert!((b - (128.0 - ARCFACE_MEAN) / ARCFACE_STD).abs() < 1e-6);
    }
}
