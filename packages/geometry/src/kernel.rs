//! Pure geometry functions over WGS84 coordinate rings.
//!
//! All functions here are total over well-formed input and perform no
//! validation — degenerate rings (fewer than 3 vertices) get the
//! documented degenerate result rather than a panic. Callers that need
//! validation construct a [`crate::Polygon`] first.

use parcel_map_models::{CardinalDirection, Coordinate};

/// Earth's mean radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geodesic polygon area in square meters via spherical excess.
///
/// Sums `(λᵢ₊₁ − λᵢ)(2 + sin φᵢ + sin φᵢ₊₁)` over consecutive vertex
/// pairs (wrapping around) and scales by `R² / 2`. The absolute value
/// strips the orientation sign, so winding order does not matter.
/// Accurate for polygons up to roughly 10 km across; rings crossing the
/// antimeridian are not handled.
///
/// Rings with fewer than 3 vertices return 0.0.
#[must_use]
pub fn spherical_area(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];

        let lng_a = a.lng.to_radians();
        let lng_b = b.lng.to_radians();
        let lat_a = a.lat.to_radians();
        let lat_b = b.lat.to_radians();

        sum += (lng_b - lng_a) * (2.0 + lat_a.sin() + lat_b.sin());
    }

    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

/// Arithmetic mean of the ring's vertices.
///
/// Not area-weighted — an acceptable approximation for the small,
/// roughly convex parcels this pipeline handles.
#[must_use]
pub fn centroid(ring: &[Coordinate]) -> Coordinate {
    if ring.is_empty() {
        return Coordinate::new(0.0, 0.0);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = ring.len() as f64;
    let lat = ring.iter().map(|c| c.lat).sum::<f64>() / n;
    let lng = ring.iter().map(|c| c.lng).sum::<f64>() / n;
    Coordinate::new(lat, lng)
}

/// Standard ray-casting point-in-polygon test.
///
/// Casts a ray east from `point` and counts edge crossings. Points
/// exactly on an edge or vertex may test either way — only totality is
/// guaranteed for boundary cases. Rings with fewer than 3 vertices
/// return false.
#[must_use]
pub fn point_in_polygon(point: Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];

        let crosses = (a.lat > point.lat) != (b.lat > point.lat)
            && point.lng < (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Great-circle distance between two coordinates in meters (haversine).
#[must_use]
pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// A point projected onto a polygon's perimeter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeProjection {
    /// The closest point on the perimeter.
    pub point: Coordinate,
    /// Index of the edge the point lies on (edge `i` runs from vertex
    /// `i` to vertex `(i + 1) % len`).
    pub edge_index: usize,
    /// Geodesic distance from the query point to `point`, in meters.
    pub distance_meters: f64,
}

/// Projects `point` onto the nearest point of the ring's perimeter.
///
/// Each edge's perpendicular projection is clamped to the segment
/// (parametric [0, 1]); the closest projection across all edges wins,
/// with ties broken by the first edge encountered in ring order.
///
/// Returns `None` only for rings with fewer than 2 vertices.
#[must_use]
pub fn project_onto_polygon(point: Coordinate, ring: &[Coordinate]) -> Option<EdgeProjection> {
    if ring.len() < 2 {
        return None;
    }

    // Local equirectangular plane centered on the query point's
    // latitude. Fine at parcel scale where edges are tens of meters.
    let lng_scale = point.lat.to_radians().cos();
    let to_plane = |c: Coordinate| (c.lng * lng_scale, c.lat);

    let (px, py) = to_plane(point);
    let mut best: Option<EdgeProjection> = None;

    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let (ax, ay) = to_plane(a);
        let (bx, by) = to_plane(b);

        let (dx, dy) = (bx - ax, by - ay);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            ((px - ax) * dx + (py - ay) * dy) / len_sq
        } else {
            0.0
        }
        .clamp(0.0, 1.0);

        let projected = Coordinate::new(a.lat + t * (b.lat - a.lat), a.lng + t * (b.lng - a.lng));
        let distance_meters = haversine_distance_m(point, projected);

        let closer = best
            .as_ref()
            .is_none_or(|current| distance_meters < current.distance_meters);
        if closer {
            best = Some(EdgeProjection {
                point: projected,
                edge_index: i,
                distance_meters,
            });
        }
    }

    best
}

/// Converts a bearing (degrees clockwise from north) to one of the 8
/// cardinal buckets. Buckets are 45° wide and centered on the named
/// direction, so north covers [-22.5°, 22.5°).
#[must_use]
pub fn angle_to_cardinal(bearing_deg: f64) -> CardinalDirection {
    const ORDER: [CardinalDirection; 8] = [
        CardinalDirection::North,
        CardinalDirection::Northeast,
        CardinalDirection::East,
        CardinalDirection::Southeast,
        CardinalDirection::South,
        CardinalDirection::Southwest,
        CardinalDirection::West,
        CardinalDirection::Northwest,
    ];

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bucket = ((bearing_deg.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize % 8;
    ORDER[bucket]
}

/// Initial great-circle bearing from `from` to `to`, degrees clockwise
/// from north in [0, 360).
#[must_use]
pub fn bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let lat_a = from.lat.to_radians();
    let lat_b = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let y = d_lng.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lng.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Outward facing direction of an edge.
///
/// The outward normal is approximated as the vector from the ring's
/// centroid to the edge midpoint — good enough for the convex-ish
/// parcels and buildings this pipeline sees.
#[must_use]
pub fn edge_facing_direction(ring: &[Coordinate], edge_index: usize) -> CardinalDirection {
    let a = ring[edge_index];
    let b = ring[(edge_index + 1) % ring.len()];
    let midpoint = Coordinate::new(f64::midpoint(a.lat, b.lat), f64::midpoint(a.lng, b.lng));

    angle_to_cardinal(bearing_deg(centroid(ring), midpoint))
}
