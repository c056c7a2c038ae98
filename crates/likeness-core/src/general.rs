//! General-purpose image embedder: EfficientNet-B0 features via ONNX Runtime.
//!
//! The export is the ImageNet backbone without its classifier head and with
//! global average pooling, so the single output is a 1280-d feature vector.
//! Keras' EfficientNet preprocessing is a pass-through (rescaling lives in
//! the graph), so pixels go in as raw 0–255 floats, NHWC.

use crate::decode::{DecodePolicy, DecodedImage};
use crate::embedder::{check_dim, Embedder, ExtractError};
use crate::profile::GENERAL_INPUT_SIZE;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

pub const EFFICIENTNET_MODEL_FILE: &str = "efficientnet_b0.onnx";
pub const EFFICIENTNET_EMBEDDING_DIM: usize = 1280;
pub const EFFICIENTNET_MODEL_VERSION: &str = "efficientnet_b0_imagenet_avgpool";

pub struct ImageEmbedder {
    session: Session,
}

impl ImageEmbedder {
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self, ExtractError> {
        let model_path = model_dir.join(EFFICIENTNET_MODEL_FILE);
        if !model_path.exists() {
            return Err(ExtractError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(&model_path)?;

        tracing::info!(
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded EfficientNet model"
        );

        Ok(Self { session })
    }
}

impl Embedder for ImageEmbedder {
    fn decode_policy(&self) -> DecodePolicy {
        DecodePolicy::Square(GENERAL_INPUT_SIZE)
    }

    fn dim(&self) -> usize {
        EFFICIENTNET_EMBEDDING_DIM
    }

    fn model_version(&self) -> &str {
        EFFICIENTNET_MODEL_VERSION
    }

    fn extract(&mut self, image: &DecodedImage) -> Result<Option<Vec<f32>>, ExtractError> {
        let input = preprocess(image)?;

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ExtractError::InferenceFailed(format!("feature extraction: {e}")))?;

        let raw = raw.to_vec();
        check_dim(&raw, EFFICIENTNET_EMBEDDING_DIM)?;
        Ok(Some(raw))
    }
}

/// Pack a 224×224 RGB image into a (1, 224, 224, 3) float tensor.
fn preprocess(image: &DecodedImage) -> Result<Array4<f32>, ExtractError> {
    let size = GENERAL_INPUT_SIZE as usize;
    if image.width() as usize != size || image.height() as usize != size {
        return Err(ExtractError::InferenceFailed(format!(
            "expected {size}x{size} input, got {}x{}",
            image.width(),
            image.height()
        )));
    }

    let pixels: Vec<f32> = image.pixels().iter().map(|&p| p as f32).collect();
    Array4::from_shape_vec((1, size, size, 3), pixels)
        .map_err(|e| ExtractError::InferenceFailed(format!("input tensor: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_preprocess_nhwc_raw_pixels() {
        let mut img = RgbImage::from_pixel(224, 224, Rgb([1, 2, 3]));
        img.put_pixel(5, 7, Rgb([250, 128, 0]));
        let tensor = preprocess(&DecodedImage::from(img)).unwrap();

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert_eq!(tensor[[0, 0, 0, 2]], 3.0);
        // (x=5, y=7) lands at row 7, column 5.
        assert_eq!(tensor[[0, 7, 5, 0]], 250.0);
        assert_eq!(tensor[[0, 7, 5, 1]], 128.0);
    }

    #[test]
    fn test_preprocess_rejects_wrong_size() {
        let img = DecodedImage::from(RgbImage::new(100, 224));
        assert!(preprocess(&img).is_err());
    }
}
