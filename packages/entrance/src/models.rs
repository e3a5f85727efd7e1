//! Labeled entrance result types.

use parcel_map_footprint::Footprint;
use parcel_map_models::{CardinalDirection, Coordinate, EntranceCandidate, EntranceValidation};
use serde::Serialize;

/// How far a candidate got through imagery validation.
///
/// Every status here is terminal and yields a usable entrance; only
/// candidates failing the projection-distance cutoff never reach one
/// (they are pruned before labeling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationStatus {
    /// Imagery validation was not requested.
    Skipped,
    /// The validator returned an observation (see `validation` for
    /// whether it confirmed the entrance).
    Validated,
    /// The validator failed for this candidate; confidence fell back to
    /// the raw detector score.
    Unavailable,
}

/// An entrance candidate snapped onto a building's perimeter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledEntrance {
    /// The raw candidate this was derived from.
    pub candidate: EntranceCandidate,
    /// Closest point on the building's perimeter.
    pub perimeter_point: Coordinate,
    /// Index of the perimeter edge the point lies on.
    pub edge_index: usize,
    /// Meters from the raw candidate to the perimeter point.
    pub projection_distance_m: f64,
    /// Outward direction of the perimeter edge.
    pub facing_direction: CardinalDirection,
    /// Imagery validation result, when one was obtained.
    pub validation: Option<EntranceValidation>,
    /// Terminal validation status for this candidate.
    pub validation_status: ValidationStatus,
}

impl LabeledEntrance {
    /// The confidence used for ranking: the fused validation confidence
    /// when imagery validation succeeded, otherwise the raw detector
    /// confidence.
    #[must_use]
    pub fn effective_confidence(&self) -> f64 {
        self.validation
            .as_ref()
            .map_or(self.candidate.confidence, |v| v.confidence)
    }

    /// Whether imagery validation confirmed this entrance.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.confirmed)
    }
}

/// A building footprint with its labeled entrances.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledFootprint {
    /// The building this labeling ran over.
    pub footprint: Footprint,
    /// Entrances in selection-precedence order.
    pub labeled_entrances: Vec<LabeledEntrance>,
    /// The most likely main access point; `None` only when no candidate
    /// survived the projection-distance cutoff — a valid terminal
    /// state, not an error.
    pub primary_entrance: Option<LabeledEntrance>,
}
