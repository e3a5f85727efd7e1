#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical coordinate, footprint, and entrance types.
//!
//! This crate defines the shared vocabulary used across the entire
//! parcel-map pipeline. All geometry is WGS84 latitude/longitude in
//! degrees; no reprojection happens anywhere in the system. Downstream
//! crates (geometry kernel, extraction, labeling) all normalize into
//! these types.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A WGS84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude/longitude degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite (no NaN/infinity).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Cache key for this coordinate, quantized to 6 decimal degrees
    /// (~0.1 m at the equator). Used to key per-coordinate validation
    /// metadata so repeated lookups of the same physical point hit the
    /// cache despite floating point noise.
    #[must_use]
    pub fn quantized_key(self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lng)
    }
}

/// A geographic bounding region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Northern latitude limit in degrees.
    pub north: f64,
    /// Southern latitude limit in degrees.
    pub south: f64,
    /// Eastern longitude limit in degrees.
    pub east: f64,
    /// Western longitude limit in degrees.
    pub west: f64,
}

/// Approximate meters per degree of latitude, used only for seeding
/// bounds around a point. Good enough for regions under ~10 km.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

impl Bounds {
    /// Creates a bounds region centered on `center`, extending
    /// `radius_m` meters in each cardinal direction.
    ///
    /// Longitude extent is corrected by `cos(lat)` so the region is
    /// roughly square on the ground rather than in degree space.
    #[must_use]
    pub fn around(center: Coordinate, radius_m: f64) -> Self {
        let lat_delta = radius_m / METERS_PER_DEGREE_LAT;
        let lng_scale = center.lat.to_radians().cos().max(0.01);
        let lng_delta = radius_m / (METERS_PER_DEGREE_LAT * lng_scale);

        Self {
            north: center.lat + lat_delta,
            south: center.lat - lat_delta,
            east: center.lng + lng_delta,
            west: center.lng - lng_delta,
        }
    }

    /// Center point of the region.
    #[must_use]
    pub fn center(self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.north, self.south),
            f64::midpoint(self.east, self.west),
        )
    }

    /// Whether a coordinate lies inside the region (inclusive).
    #[must_use]
    pub fn contains(self, point: Coordinate) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }

    /// Cache key for this region, quantized to 4 decimal degrees
    /// (~11 m at the equator). Two searches over visually identical
    /// viewports produce the same key, so panning jitter doesn't defeat
    /// the footprint cache.
    #[must_use]
    pub fn quantized_key(self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// One of the 8 compass buckets derived from a bearing angle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CardinalDirection {
    /// North, bearing 0°.
    North,
    /// Northeast, bearing 45°.
    Northeast,
    /// East, bearing 90°.
    East,
    /// Southeast, bearing 135°.
    Southeast,
    /// South, bearing 180°.
    South,
    /// Southwest, bearing 225°.
    Southwest,
    /// West, bearing 270°.
    West,
    /// Northwest, bearing 315°.
    Northwest,
}

impl CardinalDirection {
    /// The bearing at the center of this direction's 45° bucket,
    /// degrees clockwise from north.
    #[must_use]
    pub const fn bearing(self) -> f64 {
        match self {
            Self::North => 0.0,
            Self::Northeast => 45.0,
            Self::East => 90.0,
            Self::Southeast => 135.0,
            Self::South => 180.0,
            Self::Southwest => 225.0,
            Self::West => 270.0,
            Self::Northwest => 315.0,
        }
    }
}

/// Heuristic footprint shape class.
///
/// Derived purely from the coordinate ring by the geometry kernel's
/// classifier. Heuristic, not ground truth: noisy real-world polygons
/// that don't match any rule fall back to [`Shape::Irregular`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    /// Four near-right angles, all sides within 20% of their mean.
    Square,
    /// Four near-right angles, unequal sides.
    Rectangle,
    /// Six vertices with one reflex corner.
    LShaped,
    /// Three vertices.
    Triangular,
    /// Anything the heuristics can't place.
    Irregular,
}

/// Whether a footprint outlines a land parcel or a structure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FootprintKind {
    /// A land-parcel boundary.
    Plot,
    /// A building structure.
    Building,
}

/// Source-specific metadata attached to a footprint.
///
/// Modeled as a tagged union over the producing source kind so every
/// field access is statically checked, rather than an open map of
/// optional properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum SourceMetadata {
    /// Produced by a parcel-registry lookup.
    #[serde(rename_all = "camelCase")]
    ParcelRegistry {
        /// Registry parcel identifier (e.g. an APN).
        parcel_id: String,
        /// Registered owner name, when the registry exposes it.
        owner: Option<String>,
    },
    /// Produced by a vision/segmentation model over imagery.
    #[serde(rename_all = "camelCase")]
    SegmentationModel {
        /// Model identifier and version string.
        model: String,
    },
    /// Synthesized internally (placeholder plots for orphan buildings).
    Synthesized,
}

/// A raw, un-projected entrance point produced by an external detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntranceCandidate {
    /// Latitude of the detected point.
    pub lat: f64,
    /// Longitude of the detected point.
    pub lng: f64,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
    /// Whether the detector flagged this as the preferred entrance.
    pub is_preferred: bool,
}

/// A feature tag reported by the imagery validator near an entrance.
///
/// Each tag carries a fixed fusion weight: strong direct evidence
/// (a visible door) dominates, weak circumstantial evidence (a
/// driveway) contributes little.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EntranceFeature {
    /// A visible door.
    Door,
    /// A gate in a fence or wall.
    Gate,
    /// Entry stairs.
    Stairs,
    /// An accessibility ramp.
    Ramp,
    /// An awning or canopy over the entry.
    Canopy,
    /// A footpath leading to the point.
    Path,
    /// A driveway terminating at the point.
    Driveway,
    /// Detected something, couldn't classify it.
    Unknown,
}

impl EntranceFeature {
    /// Fusion weight for this feature in [0, 1].
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Door => 1.0,
            Self::Gate => 0.9,
            Self::Stairs | Self::Ramp => 0.7,
            Self::Canopy => 0.6,
            Self::Path => 0.5,
            Self::Driveway => 0.4,
            Self::Unknown => 0.2,
        }
    }
}

/// One feature observation from the imagery validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureObservation {
    /// What was seen.
    pub feature: EntranceFeature,
    /// Validator confidence in this observation, in [0, 1].
    pub confidence: f64,
}

/// Result of validating one projected entrance against street-level
/// imagery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntranceValidation {
    /// Whether the validator confirmed an entrance at this point.
    pub confirmed: bool,
    /// Fused confidence in [0, 1] (feature-weighted average).
    pub confidence: f64,
    /// Individual feature observations behind the fused score.
    pub features: Vec<FeatureObservation>,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn bounds_around_contains_center() {
        let center = Coordinate::new(38.8951, -77.0364);
        let bounds = Bounds::around(center, 250.0);

        assert!(bounds.contains(center));
        assert!(bounds.north > bounds.south);
        assert!(bounds.east > bounds.west);
    }

    #[test]
    fn bounds_around_spans_requested_radius() {
        let center = Coordinate::new(0.0, 0.0);
        let bounds = Bounds::around(center, 500.0);

        // 500 m should be ~0.0045 degrees of latitude.
        let lat_span_m = (bounds.north - bounds.south) * METERS_PER_DEGREE_LAT;
        assert!((lat_span_m - 1000.0).abs() < 1.0);
    }

    #[test]
    fn quantized_bounds_keys_collapse_jitter() {
        let a = Bounds {
            north: 38.90001,
            south: 38.89001,
            east: -77.03001,
            west: -77.04001,
        };
        let b = Bounds {
            north: 38.900_014,
            south: 38.890_006,
            east: -77.030_013,
            west: -77.040_008,
        };
        assert_eq!(a.quantized_key(), b.quantized_key());
    }

    #[test]
    fn cardinal_bearings_are_distinct_and_ordered() {
        let bearings: Vec<f64> = CardinalDirection::iter()
            .map(CardinalDirection::bearing)
            .collect();
        for pair in bearings.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn feature_weights_are_normalized() {
        for feature in EntranceFeature::iter() {
            let w = feature.weight();
            assert!((0.0..=1.0).contains(&w), "{feature} weight out of range");
        }
        assert!(EntranceFeature::Door.weight() > EntranceFeature::Unknown.weight());
    }

    #[test]
    fn source_metadata_serializes_tagged() {
        let meta = SourceMetadata::ParcelRegistry {
            parcel_id: "123-456".to_string(),
            owner: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "parcelRegistry");
        assert_eq!(json["parcelId"], "123-456");
    }
}
