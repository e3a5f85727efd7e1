//! The entrance labeling pipeline.
//!
//! One invocation takes a building footprint plus raw candidates and
//! produces a [`LabeledFootprint`]: candidates are projected onto the
//! perimeter (hard distance cutoff, not a soft penalty), given a facing
//! direction, optionally validated against imagery concurrently, then
//! ordered by selection precedence.

use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use parcel_map_cache::TtlCache;
use parcel_map_footprint::Footprint;
use parcel_map_geometry::{edge_facing_direction, project_onto_polygon};
use parcel_map_models::{Coordinate, EntranceCandidate, EntranceValidation};

use crate::models::{LabeledEntrance, LabeledFootprint, ValidationStatus};
use crate::ImageryValidator;

/// Cache type for imagery validation metadata, keyed by quantized
/// perimeter coordinate.
pub type ValidationCache = TtlCache<String, EntranceValidation>;

/// Default lifetime of cached validation metadata. Imagery observations
/// age faster than parcel geometry, so this is much shorter than the
/// footprint TTL.
#[must_use]
pub fn default_validation_ttl() -> Duration {
    Duration::minutes(15)
}

/// Options for one labeling invocation.
#[derive(Debug, Clone, Copy)]
pub struct LabelOptions {
    /// Candidates projecting farther than this from the perimeter are
    /// discarded outright.
    pub max_projection_distance_m: f64,
    /// Whether to validate retained candidates against imagery.
    pub validate_with_imagery: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            max_projection_distance_m: 50.0,
            validate_with_imagery: false,
        }
    }
}

/// Labels building entrances against an optional imagery validator.
pub struct EntranceLabeler {
    validator: Option<Arc<dyn ImageryValidator>>,
    validation_cache: Arc<ValidationCache>,
}

impl EntranceLabeler {
    /// Creates a labeler with no imagery validator; validation requests
    /// are treated as skipped.
    #[must_use]
    pub fn new(validation_cache: Arc<ValidationCache>) -> Self {
        Self {
            validator: None,
            validation_cache,
        }
    }

    /// Creates a labeler that validates entrances against `validator`,
    /// caching per-coordinate results in `validation_cache`.
    #[must_use]
    pub fn with_validator(
        validator: Arc<dyn ImageryValidator>,
        validation_cache: Arc<ValidationCache>,
    ) -> Self {
        Self {
            validator: Some(validator),
            validation_cache,
        }
    }

    /// Labels `candidates` against `footprint` and selects the primary
    /// entrance.
    ///
    /// An empty result (no entrances, no primary) is a valid terminal
    /// state when every candidate fails the distance cutoff. Imagery
    /// validation failures are absorbed per candidate, never
    /// propagated.
    pub async fn label(
        &self,
        footprint: &Footprint,
        candidates: &[EntranceCandidate],
        options: &LabelOptions,
    ) -> LabeledFootprint {
        let ring = footprint.polygon.coordinates();

        let mut entrances: Vec<LabeledEntrance> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let point = Coordinate::new(candidate.lat, candidate.lng);
            let Some(projection) = project_onto_polygon(point, ring) else {
                continue;
            };

            if projection.distance_meters > options.max_projection_distance_m {
                log::trace!(
                    "discarding candidate {:.1} m from footprint {} (cutoff {:.1} m)",
                    projection.distance_meters,
                    footprint.id,
                    options.max_projection_distance_m
                );
                continue;
            }

            entrances.push(LabeledEntrance {
                candidate: *candidate,
                perimeter_point: projection.point,
                edge_index: projection.edge_index,
                projection_distance_m: projection.distance_meters,
                facing_direction: edge_facing_direction(ring, projection.edge_index),
                validation: None,
                validation_status: ValidationStatus::Skipped,
            });
        }

        if options.validate_with_imagery {
            if let Some(validator) = &self.validator {
                // Candidates validate concurrently; each writes only to
                // its own entrance.
                let results = join_all(
                    entrances
                        .iter()
                        .map(|entrance| self.validate_one(validator.as_ref(), entrance)),
                )
                .await;

                for (entrance, (status, validation)) in entrances.iter_mut().zip(results) {
                    entrance.validation_status = status;
                    entrance.validation = validation;
                }
            } else {
                log::warn!("imagery validation requested but no validator configured");
            }
        }

        entrances.sort_by(|a, b| {
            b.candidate
                .is_preferred
                .cmp(&a.candidate.is_preferred)
                .then_with(|| b.is_confirmed().cmp(&a.is_confirmed()))
                .then_with(|| b.effective_confidence().total_cmp(&a.effective_confidence()))
        });

        let primary_entrance = entrances.first().cloned();

        LabeledFootprint {
            footprint: footprint.clone(),
            labeled_entrances: entrances,
            primary_entrance,
        }
    }

    /// Validates one projected entrance, consulting the metadata cache
    /// first. Failure degrades this candidate only.
    async fn validate_one(
        &self,
        validator: &dyn ImageryValidator,
        entrance: &LabeledEntrance,
    ) -> (ValidationStatus, Option<EntranceValidation>) {
        let cache_key = entrance.perimeter_point.quantized_key();
        if let Some(cached) = self.validation_cache.get(&cache_key) {
            log::trace!("validation cache hit for {cache_key}");
            return (ValidationStatus::Validated, Some(cached));
        }

        match validator
            .validate(entrance.perimeter_point, entrance.facing_direction)
            .await
        {
            Ok(observation) => {
                let validation = observation.into_validation();
                self.validation_cache
                    .insert(cache_key, validation.clone());
                (ValidationStatus::Validated, Some(validation))
            }
            Err(e) => {
                log::warn!(
                    "imagery validation unavailable for {cache_key}: {e}; \
                     falling back to detector confidence"
                );
                (ValidationStatus::Unavailable, None)
            }
        }
    }
}
