#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Footprint source trait and extraction orchestrator.
//!
//! A [`FootprintSource`] knows how to produce raw plot and building
//! polygons for a bounding region — backed by a parcel registry, a
//! segmentation model over imagery, or anything else that can hand back
//! confidence-scored coordinate rings. The [`FootprintExtractor`] turns
//! those raw polygons into a [`FootprintSearchResult`]: confidence
//! filtering, area sorting, shape classification, plot/building
//! association, and TTL caching keyed by quantized bounds.

pub mod extract;
pub mod models;

use async_trait::async_trait;
use parcel_map_geometry::GeometryError;
use parcel_map_models::{Bounds, Coordinate, FootprintKind, SourceMetadata};

pub use extract::{
    ExtractOptions, FootprintCache, FootprintExtractor, associate, default_footprint_ttl,
};
pub use models::{Footprint, FootprintSearchResult, PlotWithBuildings};

/// Errors from a footprint source collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The provider could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The provider answered but could not produce polygons.
    #[error("provider error: {message}")]
    Provider {
        /// Description of the provider-side failure.
        message: String,
    },
}

/// Errors from the extraction orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source collaborator failed; propagated as-is, never retried
    /// here and never papered over with stale cache data.
    #[error("footprint extraction failed: {0}")]
    ExtractionFailed(#[from] SourceError),

    /// The source returned a malformed coordinate ring. The source
    /// contract requires it to omit such items, so this is a provider
    /// bug surfaced loudly rather than tolerated.
    #[error("invalid footprint geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
}

/// A raw polygon as returned by a [`FootprintSource`], before the
/// orchestrator derives geometry, shape, and identity for it.
#[derive(Debug, Clone)]
pub struct RawFootprint {
    /// Coordinate ring (at least 3 vertices per the source contract).
    pub coordinates: Vec<Coordinate>,
    /// Source confidence in [0, 1].
    pub confidence: f64,
    /// Whether this outlines a plot or a building.
    pub kind: FootprintKind,
    /// Street address, when the source knows it.
    pub address: Option<String>,
    /// Source-specific identifiers.
    pub metadata: SourceMetadata,
}

/// Trait all footprint providers implement.
///
/// Implementations must return confidence in [0, 1] and valid rings of
/// at least 3 vertices, omitting items that don't meet the contract.
#[async_trait]
pub trait FootprintSource: Send + Sync {
    /// Unique identifier for this source (e.g. `"county_registry"`).
    fn id(&self) -> &str;

    /// Fetches raw polygons of the given kind inside `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the provider fails.
    async fn fetch_polygons(
        &self,
        bounds: Bounds,
        kind: FootprintKind,
    ) -> Result<Vec<RawFootprint>, SourceError>;
}

/// Errors from a geocoding collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The geocoder could not be reached.
    #[error("geocoder unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The query matched nothing.
    #[error("no match for {query:?}")]
    NotFound {
        /// The query that failed to resolve.
        query: String,
    },
}

/// Trait for the geocoding collaborator.
///
/// Used only to seed a bounding region before extraction (an address or
/// ZIP becomes a center point for [`Bounds::around`]); never consulted
/// inside the geometry pipeline itself.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves an address or ZIP to a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if resolution fails or nothing matches.
    async fn resolve(&self, query: &str) -> Result<Coordinate, GeocodeError>;
}
