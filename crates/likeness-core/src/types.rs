use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// An L2-normalised embedding vector.
///
/// 512-dimensional for ArcFace, 1280 for EfficientNet-B0.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity against `other`, in [-1, 1].
    pub fn similarity(&self, other: &Embedding) -> Result<f32, CompareError> {
        cosine_similarity(&self.values, &other.values)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Norms are recomputed, so raw (unnormalised) vectors are accepted.
/// A zero-norm side yields 0.0. The result is clamped to [-1, 1] to absorb
/// rounding on near-parallel inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, CompareError> {
    if a.len() != b.len() {
        return Err(CompareError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 {
        Ok((dot / denom).clamp(-1.0, 1.0))
    } else {
        Ok(0.0)
    }
}
