#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spherical polygon geometry kernel.
//!
//! Pure functions over WGS84 coordinate rings: geodesic area, centroid,
//! point-in-polygon, perimeter projection, facing direction, and
//! heuristic shape classification. Nothing here performs I/O, suspends,
//! or holds state.
//!
//! The kernel functions in [`kernel`] do not validate their input; they
//! are total over well-formed rings and callers are expected to go
//! through [`Polygon::new`] (or equivalent checks) first. Valid for
//! polygons up to roughly 10 km across — there is no antimeridian or
//! polar handling.

pub mod kernel;
pub mod shape;

use parcel_map_models::{Bounds, Coordinate};
use serde::Serialize;
use thiserror::Error;

pub use kernel::{
    EdgeProjection, angle_to_cardinal, centroid, edge_facing_direction, haversine_distance_m,
    point_in_polygon, project_onto_polygon, spherical_area,
};
pub use shape::{ShapeThresholds, classify_shape};

/// Errors from polygon construction.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The ring has fewer than 3 vertices.
    #[error("polygon requires at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A coordinate contains NaN or infinity.
    #[error("non-finite coordinate at index {index}")]
    NonFiniteCoordinate {
        /// Index of the offending vertex.
        index: usize,
    },
}

/// A validated coordinate ring with derived values computed once at
/// construction.
///
/// The ring is implicitly closed (last vertex connects back to the
/// first). Centroid, area, and bounds are cached at creation and the
/// value is immutable afterwards — "mutation" means building a new
/// [`Polygon`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    coordinates: Vec<Coordinate>,
    centroid: Coordinate,
    area_sq_m: f64,
    bounds: Bounds,
}

impl Polygon {
    /// Validates a coordinate ring and computes its derived values.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] for rings with fewer
    /// than 3 vertices and [`GeometryError::NonFiniteCoordinate`] if any
    /// vertex contains NaN or infinity.
    pub fn new(coordinates: Vec<Coordinate>) -> Result<Self, GeometryError> {
        if coordinates.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                count: coordinates.len(),
            });
        }
        if let Some(index) = coordinates.iter().position(|c| !c.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { index });
        }

        let centroid = kernel::centroid(&coordinates);
        let area_sq_m = kernel::spherical_area(&coordinates);
        let bounds = ring_bounds(&coordinates);

        Ok(Self {
            coordinates,
            centroid,
            area_sq_m,
            bounds,
        })
    }

    /// The vertex ring.
    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Arithmetic-mean centroid, computed at construction.
    #[must_use]
    pub const fn centroid(&self) -> Coordinate {
        self.centroid
    }

    /// Geodesic area in square meters, computed at construction.
    #[must_use]
    pub const fn area_sq_m(&self) -> f64 {
        self.area_sq_m
    }

    /// Axis-aligned bounding region, computed at construction.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether a point's centroid falls inside this ring.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        kernel::point_in_polygon(point, &self.coordinates)
    }
}

/// Axis-aligned bounding region of a vertex ring.
fn ring_bounds(ring: &[Coordinate]) -> Bounds {
    let mut north = f64::NEG_INFINITY;
    let mut south = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut west = f64::INFINITY;

    for c in ring {
        north = north.max(c.lat);
        south = south.min(c.lat);
        east = east.max(c.lng);
        west = west.min(c.lng);
    }

    Bounds {
        north,
        south,
        east,
        west,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.0),
        ]
    }

    #[test]
    fn rejects_short_rings() {
        let err = Polygon::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)])
            .expect_err("two vertices should be rejected");
        assert!(matches!(err, GeometryError::TooFewVertices { count: 2 }));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut ring = unit_square();
        ring[2] = Coordinate::new(f64::NAN, 0.001);
        let err = Polygon::new(ring).expect_err("NaN should be rejected");
        assert!(matches!(err, GeometryError::NonFiniteCoordinate { index: 2 }));
    }

    #[test]
    fn derives_centroid_area_and_bounds_at_construction() {
        let polygon = Polygon::new(unit_square()).unwrap();

        let centroid = polygon.centroid();
        assert!((centroid.lat - 0.0005).abs() < 1e-9);
        assert!((centroid.lng - 0.0005).abs() < 1e-9);

        // 111 km per degree -> 0.001 degrees is ~111 m per side.
        let expected = (111_000.0_f64 * 0.001).powi(2);
        let area = polygon.area_sq_m();
        assert!(
            (area - expected).abs() / expected < 0.05,
            "area {area} not within 5% of {expected}"
        );

        let bounds = polygon.bounds();
        assert!((bounds.north - 0.001).abs() < 1e-12);
        assert!((bounds.south).abs() < 1e-12);
    }

    #[test]
    fn contains_uses_ray_casting() {
        let polygon = Polygon::new(unit_square()).unwrap();
        assert!(polygon.contains(Coordinate::new(0.0005, 0.0005)));
        assert!(!polygon.contains(Coordinate::new(0.002, 0.0005)));
    }
}
