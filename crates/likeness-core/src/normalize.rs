//! L2 normalisation of raw model output.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("embedding has zero L2 norm")]
    ZeroNorm,
    #[error("embedding contains non-finite values")]
    NonFinite,
}

/// Rescale `raw` to unit L2 norm.
///
/// Degenerate output (all zeros, empty, NaN/Inf) is rejected instead of
/// being divided through.
pub fn l2_normalize(mut raw: Vec<f32>) -> Result<Vec<f32>, NormalizationError> {
    if raw.iter().any(|x| !x.is_finite()) {
        return Err(NormalizationError::NonFinite);
    }

    let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return Err(NormalizationError::ZeroNorm);
    }
    if !norm.is_finite() {
        return Err(NormalizationError::NonFinite);
    }

    for x in raw.iter_mut() {
        *x /= norm;
    }
    Ok(raw)
}

/// Euclidean norm.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_simple_vector() {
        let v = l2_normalize(vec![3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_unit_length() {
        for raw in [
            vec![1.0f32, 2.0, 3.0, 4.0, 5.0],
            (0..512).map(|i| (i as f32).sin() * 40.0).collect(),
            vec![-0.001, 0.0005, 0.0],
            vec![1e-10, 1e-10, 1e-10],
        ] {
            let v = l2_normalize(raw).unwrap();
            assert!((l2_norm(&v) - 1.0).abs() < 1e-6, "norm = {}", l2_norm(&v));
        }
    }

    #[test]
    fn test_normalize_preserves_direction() {
        let v = l2_normalize(vec![-2.0, 0.0, 2.0]).unwrap();
        assert!(v[0] < 0.0 && v[1] == 0.0 && v[2] > 0.0);
        assert!((v[0] + v[2]).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        assert_eq!(l2_normalize(vec![0.0; 8]), Err(NormalizationError::ZeroNorm));
    }

    #[test]
    fn test_normalize_empty_fails() {
        assert_eq!(l2_normalize(Vec::new()), Err(NormalizationError::ZeroNorm));
    }

    #[test]
    fn test_normalize_nan_fails() {
        assert_eq!(
            l2_normalize(vec![1.0, f32::NAN]),
            Err(NormalizationError::NonFinite)
        );
        assert_eq!(
            l2_normalize(vec![f32::INFINITY, 0.0]),
            Err(NormalizationError::NonFinite)
        );
    }

    #[test]
    fn test_normalize_overflowing_norm_fails() {
        assert_eq!(
            l2_normalize(vec![f32::MAX, f32::MAX]),
            Err(NormalizationError::NonFinite)
        );
    }
}
