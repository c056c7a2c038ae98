//! Service profiles: the per-service constants that parameterise the pipeline.
//!
//! Route names, thresholds and verdict strings are part of the external
//! contract and must not drift.

use crate::decode::DecodePolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EfficientNet-B0 input resolution.
pub const GENERAL_INPUT_SIZE: u32 = 224;

pub const MISSING_PAIR_MESSAGE: &str = "Please upload both image1 and image2";
pub const MISSING_SINGLE_MESSAGE: &str = "Please upload an image with key 'image'";

/// Which embedding service a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Face,
    #[serde(alias = "image")]
    General,
}

impl ServiceKind {
    pub fn profile(self) -> &'static ServiceProfile {
        match self {
            ServiceKind::Face => &FACE_PROFILE,
            ServiceKind::General => &GENERAL_PROFILE,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceKind::Face => "face",
            ServiceKind::General => "general",
        })
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "face" => Ok(ServiceKind::Face),
            "general" | "image" => Ok(ServiceKind::General),
            other => Err(format!("unknown service '{other}' (expected 'face' or 'general')")),
        }
    }
}

#[derive(Debug)]
pub struct ServiceProfile {
    pub kind: ServiceKind,
    pub compare_route: &'static str,
    pub embed_route: &'static str,
    pub threshold: f32,
    pub positive: &'static str,
    pub negative: &'static str,
    pub decode_policy: DecodePolicy,
    /// Reported when either compare input yields no embedding.
    pub not_detected_pair: &'static str,
    /// Reported when the single embed input yields no embedding.
    pub not_detected_single: &'static str,
}

pub static FACE_PROFILE: ServiceProfile = ServiceProfile {
    kind: ServiceKind::Face,
    compare_route: "/compare_faces",
    embed_route: "/get_embeddings",
    threshold: 0.40,
    positive: "Same person",
    negative: "Different person",
    decode_policy: DecodePolicy::Native,
    not_detected_pair: "Face not detected in one or both images",
    not_detected_single: "No face detected in the image",
};

pub static GENERAL_PROFILE: ServiceProfile = ServiceProfile {
    kind: ServiceKind::General,
    compare_route: "/compare_images",
    embed_route: "/get_embeddings",
    threshold: 0.60,
    positive: "Similar",
    negative: "Different",
    decode_policy: DecodePolicy::Square(GENERAL_INPUT_SIZE),
    // The general embedder always yields a vector; these are never sent.
    not_detected_pair: "No embedding produced for one or both images",
    not_detected_single: "No embedding produced for the image",
};

/// Outcome of comparing two embeddings under a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub similarity: f64,
    pub threshold: f64,
    pub result: String,
}

impl ServiceProfile {
    /// Strictly greater than the threshold is a match; equal is not.
    pub fn is_match(&self, score: f32) -> bool {
        score > self.threshold
    }

    pub fn verdict_label(&self, score: f32) -> &'static str {
        if self.is_match(score) {
            self.positive
        } else {
            self.negative
        }
    }

    /// The threshold as it appears in responses.
    pub fn reported_threshold(&self) -> f64 {
        round2(self.threshold as f64)
    }

    /// Classify `score` and shape it for the wire (four decimal places).
    pub fn verdict(&self, score: f32) -> Verdict {
        Verdict {
            similarity: round4(score as f64),
            threshold: self.reported_threshold(),
            result: self.verdict_label(score).to_string(),
        }
    }
}

// Half-way cases go to the even neighbour: 0.03125 reports as 0.0312.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round_ties_even() / 10_000.0
}

// Thresholds are f32 constants; 0.4f32 widens to 0.4000000059604645.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_threshold_boundary_is_strict() {
        let p = ServiceKind::Face.profile();
        assert_eq!(p.verdict_label(0.40), "Different person");
        assert_eq!(p.verdict_label(0.4001), "Same person");
        assert_eq!(p.verdict_label(-0.3), "Different person");
    }

    #[test]
    fn test_general_threshold_boundary_is_strict() {
        let p = ServiceKind::General.profile();
        assert_eq!(p.verdict_label(0.60), "Different");
        assert_eq!(p.verdict_label(0.61), "Similar");
        assert_eq!(p.verdict_label(1.0), "Similar");
    }

    #[test]
    fn test_verdict_rounds_to_four_places() {
        let v = ServiceKind::Face.profile().verdict(0.123456);
        assert_eq!(v.similarity, 0.1235);
        assert_eq!(v.threshold, 0.4);
        assert_eq!(v.result, "Different person");
    }

    #[test]
    fn test_verdict_rounds_ties_to_even() {
        let p = ServiceKind::General.profile();
        assert_eq!(p.verdict(0.03125).similarity, 0.0312);
        assert_eq!(p.verdict(0.15625).similarity, 0.1562);
        assert_eq!(p.verdict(0.65625).similarity, 0.6562);
    }

    #[test]
    fn test_threshold_serializes_cleanly() {
        let v = ServiceKind::General.profile().verdict(1.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["threshold"], serde_json::json!(0.6));
        assert_eq!(json["similarity"], serde_json::json!(1.0));
        assert_eq!(json["result"], "Similar");
    }

    #[test]
    fn test_routes() {
        assert_eq!(FACE_PROFILE.compare_route, "/compare_faces");
        assert_eq!(GENERAL_PROFILE.compare_route, "/compare_images");
        assert_eq!(FACE_PROFILE.embed_route, GENERAL_PROFILE.embed_route);
    }

    #[test]
    fn test_service_kind_parse() {
        assert_eq!("face".parse::<ServiceKind>(), Ok(ServiceKind::Face));
        assert_eq!(" General ".parse::<ServiceKind>(), Ok(ServiceKind::General));
        assert!("voice".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_service_kind_image_alias() {
        assert_eq!("image".parse::<ServiceKind>(), Ok(ServiceKind::General));
        let kind: ServiceKind = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(kind, ServiceKind::General);
    }
}
