//! decode → extract → normalize, shared by both services.

use crate::decode::{decode_image, DecodeError};
use crate::embedder::{check_dim, Embedder, ExtractError};
use crate::normalize::{l2_normalize, NormalizationError};
use crate::profile::{ServiceProfile, Verdict};
use crate::types::{CompareError, Embedding};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Normalize(#[from] NormalizationError),
}

/// One embedding model plus the steps around it.
pub struct Pipeline<E> {
    embedder: E,
}

impl<E: Embedder> Pipeline<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }

    pub fn model_version(&self) -> &str {
        self.embedder.model_version()
    }

    /// Turn uploaded bytes into a unit-length embedding.
    ///
    /// `Ok(None)` when the model found nothing to embed.
    pub fn embed(&mut self, bytes: &[u8]) -> Result<Option<Embedding>, PipelineError> {
        let image = decode_image(bytes, self.embedder.decode_policy())?;

        let Some(raw) = self.embedder.extract(&image)? else {
            return Ok(None);
        };
        check_dim(&raw, self.embedder.dim())?;

        let values = l2_normalize(raw)?;
        Ok(Some(Embedding {
            values,
            model_version: Some(self.embedder.model_version().to_string()),
        }))
    }
}

/// Compare two embeddings and classify under `profile`.
pub fn compare(
    profile: &ServiceProfile,
    a: &Embedding,
    b: &Embedding,
) -> Result<Verdict, CompareError> {
    let score = a.similarity(b)?;
    Ok(profile.verdict(score))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::decode::{DecodePolicy, DecodedImage};
    use crate::embedder::{Embedder, ExtractError};

    /// Deterministic stand-in model: per-channel means plus a constant, or
    /// nothing for all-black pictures.
    pub struct MeanColorEmbedder {
        pub policy: DecodePolicy,
        pub zero_output: bool,
    }

    impl Embedder for MeanColorEmbedder {
        fn decode_policy(&self) -> DecodePolicy {
            self.policy
        }

        fn dim(&self) -> usize {
            4
        }

        fn model_version(&self) -> &str {
            "mean-color"
        }

        fn extract(&mut self, image: &DecodedImage) -> Result<Option<Vec<f32>>, ExtractError> {
            if self.zero_output {
                return Ok(Some(vec![0.0; 4]));
            }
            let px = image.pixels();
            if px.iter().all(|&p| p == 0) {
                return Ok(None);
            }
            let n = (px.len() / 3) as f32;
            let mut v = vec![0.0f32; 4];
            for chunk in px.chunks_exact(3) {
                for c in 0..3 {
                    v[c] += chunk[c] as f32 / n;
                }
            }
            v[3] = 10.0;
            Ok(Some(v))
        }
    }
}
