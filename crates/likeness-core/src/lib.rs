//! likeness-core: image embedding and comparison engine.
//!
//! Face embeddings come from SCRFD detection plus ArcFace recognition;
//! general image embeddings from an EfficientNet-B0 backbone. Both run on
//! ONNX Runtime and sit behind the [`Embedder`] trait, so the decode →
//! extract → normalize → compare pipeline is the same for either service.

pub mod alignment;
pub mod decode;
pub mod detector;
pub mod embedder;
pub mod face;
pub mod general;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod recognizer;
pub mod types;

pub use decode::{decode_image, DecodeError, DecodePolicy, DecodedImage};
pub use embedder::{Embedder, ExtractError};
pub use face::FaceEmbedder;
pub use general::ImageEmbedder;
pub use normalize::{l2_normalize, NormalizationError};
pub use pipeline::{compare, Pipeline, PipelineError};
pub use profile::{ServiceKind, ServiceProfile, Verdict};
pub use types::{cosine_similarity, BoundingBox, CompareError, Embedding};

use std::path::{Path, PathBuf};

/// Model directory used when none is configured.
///
/// `$LIKENESS_MODEL_DIR` if set, otherwise `/usr/share/likeness/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var_os("LIKENESS_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/usr/share/likeness/models"))
}

/// Load the ONNX-backed embedder for `kind` from `model_dir`.
pub fn load_embedder(
    kind: ServiceKind,
    model_dir: &Path,
    intra_threads: usize,
) -> Result<Box<dyn Embedder>, ExtractError> {
    Ok(match kind {
        ServiceKind::Face => Box::new(FaceEmbedder::load(model_dir, intra_threads)?),
        ServiceKind::General => Box::new(ImageEmbedder::load(model_dir, intra_threads)?),
    })
}
