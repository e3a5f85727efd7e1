//! Feature-weighted confidence fusion.
//!
//! Heuristic, not ground truth: the weights encode how directly each
//! imagery feature evidences an entrance, and the floor value reflects
//! "plausible but unconfirmed" — absence of evidence is not evidence of
//! absence.

use parcel_map_models::FeatureObservation;

/// Confidence assigned when the validator saw no features at all.
const NO_FEATURE_CONFIDENCE: f64 = 0.3;

/// Fuses per-feature confidences into one score: the average of the
/// observations' confidences weighted by each feature's fixed weight.
/// Zero observations yield [`NO_FEATURE_CONFIDENCE`], never 0.
#[must_use]
pub fn fuse_feature_confidence(features: &[FeatureObservation]) -> f64 {
    let weight_sum: f64 = features.iter().map(|f| f.feature.weight()).sum();
    if weight_sum <= 0.0 {
        return NO_FEATURE_CONFIDENCE;
    }

    let weighted: f64 = features
        .iter()
        .map(|f| f.feature.weight() * f.confidence)
        .sum();
    weighted / weight_sum
}
