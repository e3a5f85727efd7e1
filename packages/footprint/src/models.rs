//! Footprint result types produced by the extraction orchestrator.

use parcel_map_geometry::Polygon;
use parcel_map_models::{FootprintKind, Shape, SourceMetadata};
use serde::Serialize;

/// A labeled polygon: either a land plot or a building structure.
///
/// `shape` is derived purely from the coordinate ring; `confidence`
/// originates from the source and is never recomputed internally,
/// except for synthesized placeholder plots where it is discounted from
/// the contained building's confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    /// Identifier, unique within one extraction batch.
    pub id: String,
    /// Plot or building.
    pub kind: FootprintKind,
    /// The validated ring with derived centroid/area/bounds.
    pub polygon: Polygon,
    /// Heuristic shape class.
    pub shape: Shape,
    /// Extraction confidence in [0, 1].
    pub confidence: f64,
    /// Street address, when known.
    pub address: Option<String>,
    /// Source-specific identifiers.
    pub metadata: SourceMetadata,
}

/// A plot together with every building whose centroid lies inside it.
///
/// After association, every extracted building appears in exactly one
/// of these — under a detected plot, or under a placeholder plot
/// synthesized for it. No building is dropped silently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotWithBuildings {
    /// The plot footprint (possibly synthesized).
    pub plot: Footprint,
    /// Buildings contained in the plot, in area-descending order.
    pub buildings: Vec<Footprint>,
}

/// Result of one extraction over a bounding region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintSearchResult {
    /// Plots (real and synthesized) with their associated buildings.
    pub plots: Vec<PlotWithBuildings>,
    /// Total number of footprints (plots + buildings, synthesized
    /// placeholders excluded).
    pub total_count: usize,
    /// Number of real (non-synthesized) plots.
    pub plot_count: usize,
    /// Number of buildings.
    pub building_count: usize,
    /// Wall-clock processing time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the result came from the footprint cache.
    pub from_cache: bool,
}
