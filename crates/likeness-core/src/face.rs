//! Face embedder: SCRFD detection, alignment, ArcFace recognition.

use crate::decode::{DecodePolicy, DecodedImage};
use crate::detector::FaceDetector;
use crate::embedder::{Embedder, ExtractError};
use crate::recognizer::{FaceRecognizer, ARCFACE_EMBEDDING_DIM, ARCFACE_MODEL_VERSION};
use std::path::Path;

pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

pub struct FaceEmbedder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl FaceEmbedder {
    /// Load both face models from `model_dir`.
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self, ExtractError> {
        let detector = FaceDetector::load(&model_dir.join(SCRFD_MODEL_FILE), intra_threads)?;
        let recognizer = FaceRecognizer::load(&model_dir.join(ARCFACE_MODEL_FILE), intra_threads)?;
        Ok(Self { detector, recognizer })
    }
}

impl Embedder for FaceEmbedder {
    fn decode_policy(&self) -> DecodePolicy {
        DecodePolicy::Native
    }

    fn dim(&self) -> usize {
        ARCFACE_EMBEDDING_DIM
    }

    fn model_version(&self) -> &str {
        ARCFACE_MODEL_VERSION
    }

    /// Embed the most confident face; `None` when no face is found.
    fn extract(&mut self, image: &DecodedImage) -> Result<Option<Vec<f32>>, ExtractError> {
        let faces = self.detector.detect(image)?;
        let Some(face) = faces.first() else {
            tracing::debug!("no face detected");
            return Ok(None);
        };

        tracing::debug!(
            confidence = face.confidence,
            candidates = faces.len(),
            "embedding best face"
        );
        self.recognizer.extract(image, face).map(Some)
    }
}
