//! Deterministic in-process collaborators for the demo CLI.
//!
//! Stand-ins for the real parcel registry, entrance detector, imagery
//! service, and geocoder, so the pipeline can be exercised end-to-end
//! without network access. Everything is derived from the requested
//! bounds, so the same invocation always prints the same report.

use async_trait::async_trait;
use parcel_map_entrance::{
    DetectError, DetectOptions, EntranceDetector, ImageryObservation, ImageryValidator,
    ValidationError,
};
use parcel_map_footprint::{
    FootprintSource, GeocodeError, Geocoder, RawFootprint, SourceError,
};
use parcel_map_models::{
    Bounds, CardinalDirection, Coordinate, EntranceCandidate, EntranceFeature,
    FeatureObservation, FootprintKind, SourceMetadata,
};

/// Degrees of latitude per meter, for laying out fixture geometry.
const DEG_PER_M: f64 = 1.0 / 111_320.0;

fn square_ring(sw: Coordinate, side_m: f64) -> Vec<Coordinate> {
    let side = side_m * DEG_PER_M;
    vec![
        Coordinate::new(sw.lat, sw.lng),
        Coordinate::new(sw.lat, sw.lng + side),
        Coordinate::new(sw.lat + side, sw.lng + side),
        Coordinate::new(sw.lat + side, sw.lng),
    ]
}

/// Serves two plots and three buildings laid out around the bounds
/// center; one building sits outside both plots to exercise
/// placeholder-plot synthesis.
pub struct FixtureSource;

#[async_trait]
impl FootprintSource for FixtureSource {
    fn id(&self) -> &str {
        "fixture"
    }

    async fn fetch_polygons(
        &self,
        bounds: Bounds,
        kind: FootprintKind,
    ) -> Result<Vec<RawFootprint>, SourceError> {
        let center = bounds.center();
        let origin = Coordinate::new(center.lat - 60.0 * DEG_PER_M, center.lng - 80.0 * DEG_PER_M);
        let offset = |north_m: f64, east_m: f64| {
            Coordinate::new(
                origin.lat + north_m * DEG_PER_M,
                origin.lng + east_m * DEG_PER_M,
            )
        };

        Ok(match kind {
            FootprintKind::Plot => vec![
                RawFootprint {
                    coordinates: square_ring(offset(0.0, 0.0), 60.0),
                    confidence: 0.92,
                    kind,
                    address: Some("12 Orchard Ln".to_string()),
                    metadata: SourceMetadata::ParcelRegistry {
                        parcel_id: "APN-0012".to_string(),
                        owner: Some("Orchard Holdings LLC".to_string()),
                    },
                },
                RawFootprint {
                    coordinates: square_ring(offset(0.0, 80.0), 50.0),
                    confidence: 0.85,
                    kind,
                    address: Some("14 Orchard Ln".to_string()),
                    metadata: SourceMetadata::ParcelRegistry {
                        parcel_id: "APN-0014".to_string(),
                        owner: None,
                    },
                },
            ],
            FootprintKind::Building => vec![
                RawFootprint {
                    coordinates: square_ring(offset(15.0, 15.0), 25.0),
                    confidence: 0.88,
                    kind,
                    address: Some("12 Orchard Ln".to_string()),
                    metadata: SourceMetadata::SegmentationModel {
                        model: "roofnet-v3".to_string(),
                    },
                },
                RawFootprint {
                    coordinates: square_ring(offset(12.0, 92.0), 20.0),
                    confidence: 0.81,
                    kind,
                    address: Some("14 Orchard Ln".to_string()),
                    metadata: SourceMetadata::SegmentationModel {
                        model: "roofnet-v3".to_string(),
                    },
                },
                // Detached garage on an unregistered strip.
                RawFootprint {
                    coordinates: square_ring(offset(90.0, 40.0), 12.0),
                    confidence: 0.62,
                    kind,
                    address: None,
                    metadata: SourceMetadata::SegmentationModel {
                        model: "roofnet-v3".to_string(),
                    },
                },
            ],
        })
    }
}

/// Emits two candidates near the query point: a preferred one just east
/// of it and a weaker one to the north.
pub struct FixtureDetector;

#[async_trait]
impl EntranceDetector for FixtureDetector {
    async fn detect(
        &self,
        lat: f64,
        lng: f64,
        options: &DetectOptions,
    ) -> Result<Vec<EntranceCandidate>, DetectError> {
        let offset = options.radius_m.min(20.0) * DEG_PER_M;
        let candidates = vec![
            EntranceCandidate {
                lat,
                lng: lng + offset,
                confidence: 0.82,
                is_preferred: true,
            },
            EntranceCandidate {
                lat: lat + offset,
                lng,
                confidence: 0.55,
                is_preferred: false,
            },
        ];
        Ok(candidates.into_iter().take(options.max_candidates).collect())
    }
}

/// Confirms east- and south-facing entrances with a visible door;
/// reports only a path elsewhere.
pub struct FixtureValidator;

#[async_trait]
impl ImageryValidator for FixtureValidator {
    async fn validate(
        &self,
        _point: Coordinate,
        expected_direction: CardinalDirection,
    ) -> Result<ImageryObservation, ValidationError> {
        let confirmed = matches!(
            expected_direction,
            CardinalDirection::East | CardinalDirection::South
        );
        let features = if confirmed {
            vec![
                FeatureObservation {
                    feature: EntranceFeature::Door,
                    confidence: 0.9,
                },
                FeatureObservation {
                    feature: EntranceFeature::Path,
                    confidence: 0.7,
                },
            ]
        } else {
            vec![FeatureObservation {
                feature: EntranceFeature::Path,
                confidence: 0.4,
            }]
        };
        Ok(ImageryObservation {
            confirmed,
            features,
        })
    }
}

/// Resolves a handful of fixed queries; everything else is a miss.
pub struct FixtureGeocoder;

#[async_trait]
impl Geocoder for FixtureGeocoder {
    async fn resolve(&self, query: &str) -> Result<Coordinate, GeocodeError> {
        match query.to_lowercase().as_str() {
            "12 orchard ln" | "orchard" => Ok(Coordinate::new(38.8951, -77.0364)),
            "20002" => Ok(Coordinate::new(38.9054, -76.9846)),
            _ => Err(GeocodeError::NotFound {
                query: query.to_string(),
            }),
        }
    }
}
