#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entrance candidate projection, validation, and labeling.
//!
//! Takes a building footprint and a set of raw entrance candidates from
//! an external detector, snaps each candidate onto the building's
//! perimeter, derives the outward facing direction, optionally checks
//! each point against street-level imagery, and selects the primary
//! entrance by precedence (preferred flag, then imagery confirmation,
//! then confidence).
//!
//! Imagery validation is best-effort per candidate: one flaky lookup
//! degrades that candidate's confidence instead of failing the batch.

pub mod fusion;
pub mod label;
pub mod models;

use async_trait::async_trait;
use parcel_map_models::{
    CardinalDirection, Coordinate, EntranceCandidate, EntranceValidation, FeatureObservation,
};

pub use fusion::fuse_feature_confidence;
pub use label::{EntranceLabeler, LabelOptions, ValidationCache, default_validation_ttl};
pub use models::{LabeledEntrance, LabeledFootprint, ValidationStatus};

/// Errors from the entrance detector collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The detector could not be reached or failed internally.
    #[error("entrance detection failed: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Errors from the imagery validation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// No imagery is available near the point.
    #[error("no imagery near {lat}, {lng}")]
    NoImagery {
        /// Latitude of the requested point.
        lat: f64,
        /// Longitude of the requested point.
        lng: f64,
    },

    /// The imagery service failed.
    #[error("imagery validation failed: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Options for an entrance detection request.
#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
    /// Search radius around the query point, in meters.
    pub radius_m: f64,
    /// Maximum number of candidates to return.
    pub max_candidates: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            radius_m: 75.0,
            max_candidates: 10,
        }
    }
}

/// Trait for the external entrance detector.
#[async_trait]
pub trait EntranceDetector: Send + Sync {
    /// Detects raw entrance candidates near a point.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] if the detector fails.
    async fn detect(
        &self,
        lat: f64,
        lng: f64,
        options: &DetectOptions,
    ) -> Result<Vec<EntranceCandidate>, DetectError>;
}

/// What the imagery validator saw at a projected entrance point.
///
/// The fused confidence is computed pipeline-side from the feature
/// observations (see [`fusion`]), so the validator only reports what it
/// observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryObservation {
    /// Whether the validator confirmed an entrance at this point.
    pub confirmed: bool,
    /// Feature observations near the point.
    pub features: Vec<FeatureObservation>,
}

impl ImageryObservation {
    /// Fuses this observation into a cached/attachable validation
    /// record.
    #[must_use]
    pub fn into_validation(self) -> EntranceValidation {
        let confidence = fuse_feature_confidence(&self.features);
        EntranceValidation {
            confirmed: self.confirmed,
            confidence,
            features: self.features,
        }
    }
}

/// Trait for the street-level imagery validator.
#[async_trait]
pub trait ImageryValidator: Send + Sync {
    /// Validates a projected entrance point against imagery, given the
    /// direction the entrance is expected to face.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if imagery is missing or the service
    /// fails.
    async fn validate(
        &self,
        point: Coordinate,
        expected_direction: CardinalDirection,
    ) -> Result<ImageryObservation, ValidationError>;
}
