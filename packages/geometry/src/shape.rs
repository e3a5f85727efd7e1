//! Heuristic footprint shape classification.
//!
//! Classifies a coordinate ring into one of the [`Shape`] buckets from
//! vertex count, interior angles, and side lengths. The angle windows
//! are empirical constants tuned against noisy real-world parcels, so
//! they live in [`ShapeThresholds`] rather than being hard-coded.
//! Heuristic, not ground truth: anything ambiguous is [`Shape::Irregular`].

use parcel_map_models::{Coordinate, Shape};

use crate::kernel::haversine_distance_m;

/// Tunable thresholds for the shape classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeThresholds {
    /// Lower bound of the "right angle" window, degrees.
    pub right_angle_min_deg: f64,
    /// Upper bound of the "right angle" window, degrees.
    pub right_angle_max_deg: f64,
    /// Lower bound of the L-shaped reflex-corner window, degrees.
    pub reflex_min_deg: f64,
    /// Upper bound of the L-shaped reflex-corner window, degrees.
    pub reflex_max_deg: f64,
    /// Maximum relative deviation of any side from the mean side length
    /// for a quadrilateral to count as square (0.2 = 20%).
    pub square_side_tolerance: f64,
}

impl Default for ShapeThresholds {
    fn default() -> Self {
        Self {
            right_angle_min_deg: 80.0,
            right_angle_max_deg: 100.0,
            reflex_min_deg: 250.0,
            reflex_max_deg: 290.0,
            square_side_tolerance: 0.2,
        }
    }
}

/// Classifies a coordinate ring into a [`Shape`] bucket.
///
/// - 3 vertices: [`Shape::Triangular`].
/// - 4 vertices with at least 3 interior angles in the right-angle
///   window: [`Shape::Square`] when all side lengths sit within
///   `square_side_tolerance` of their mean, otherwise
///   [`Shape::Rectangle`].
/// - 6 vertices with at least one interior angle in the reflex window:
///   [`Shape::LShaped`].
/// - Everything else: [`Shape::Irregular`].
#[must_use]
pub fn classify_shape(ring: &[Coordinate], thresholds: &ShapeThresholds) -> Shape {
    match ring.len() {
        3 => Shape::Triangular,
        4 => classify_quadrilateral(ring, thresholds),
        6 => {
            let has_reflex = interior_angles_deg(ring).iter().any(|&angle| {
                angle >= thresholds.reflex_min_deg && angle <= thresholds.reflex_max_deg
            });
            if has_reflex {
                Shape::LShaped
            } else {
                Shape::Irregular
            }
        }
        _ => Shape::Irregular,
    }
}

fn classify_quadrilateral(ring: &[Coordinate], thresholds: &ShapeThresholds) -> Shape {
    let right_angles = interior_angles_deg(ring)
        .iter()
        .filter(|&&angle| {
            angle >= thresholds.right_angle_min_deg && angle <= thresholds.right_angle_max_deg
        })
        .count();

    if right_angles < 3 {
        return Shape::Irregular;
    }

    let sides = side_lengths_m(ring);
    #[allow(clippy::cast_precision_loss)]
    let mean = sides.iter().sum::<f64>() / sides.len() as f64;
    if mean <= 0.0 {
        return Shape::Irregular;
    }

    let within_tolerance = sides
        .iter()
        .all(|&side| ((side - mean) / mean).abs() <= thresholds.square_side_tolerance);

    if within_tolerance {
        Shape::Square
    } else {
        Shape::Rectangle
    }
}

/// Interior angle at each vertex, in degrees (reflex corners > 180).
///
/// Works in a local equirectangular plane; the winding order is
/// detected from the signed shoelace area so reflex corners come out
/// above 180° regardless of ring direction.
#[allow(clippy::cast_precision_loss)]
fn interior_angles_deg(ring: &[Coordinate]) -> Vec<f64> {
    let lat_ref = ring.iter().map(|c| c.lat).sum::<f64>() / ring.len().max(1) as f64;
    let lng_scale = lat_ref.to_radians().cos();
    let to_plane = |c: Coordinate| (c.lng * lng_scale, c.lat);

    // Positive shoelace sum means counter-clockwise in the plane.
    let mut shoelace = 0.0;
    for i in 0..ring.len() {
        let (ax, ay) = to_plane(ring[i]);
        let (bx, by) = to_plane(ring[(i + 1) % ring.len()]);
        shoelace += ax * by - bx * ay;
    }
    let orientation = if shoelace >= 0.0 { 1.0 } else { -1.0 };

    (0..ring.len())
        .map(|i| {
            let prev = to_plane(ring[(i + ring.len() - 1) % ring.len()]);
            let cur = to_plane(ring[i]);
            let next = to_plane(ring[(i + 1) % ring.len()]);

            let incoming = (cur.0 - prev.0, cur.1 - prev.1);
            let outgoing = (next.0 - cur.0, next.1 - cur.1);

            let cross = incoming.0 * outgoing.1 - incoming.1 * outgoing.0;
            let dot = incoming.0 * outgoing.0 + incoming.1 * outgoing.1;
            let turn_deg = cross.atan2(dot).to_degrees();

            180.0 - orientation * turn_deg
        })
        .collect()
}

/// Length of each edge in meters, in ring order.
fn side_lengths_m(ring: &[Coordinate]) -> Vec<f64> {
    (0..ring.len())
        .map(|i| haversine_distance_m(ring[i], ring[(i + 1) % ring.len()]))
        .collect()
}
