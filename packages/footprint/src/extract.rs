//! Footprint extraction orchestrator.
//!
//! Drives one search over a bounding region: cache check, source
//! fetch, confidence filtering, area sorting, truncation, shape
//! classification, plot/building association, and the cache write.
//! The source is never consulted on a cache hit, and a source failure
//! propagates — no retry, no stale-cache fallback.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use parcel_map_cache::TtlCache;
use parcel_map_geometry::{Polygon, ShapeThresholds, classify_shape};
use parcel_map_models::{Bounds, FootprintKind, SourceMetadata};

use crate::{ExtractError, Footprint, FootprintSearchResult, FootprintSource, PlotWithBuildings};

/// Cache type for extracted footprints, keyed by quantized bounds.
pub type FootprintCache = TtlCache<String, Vec<Footprint>>;

/// Default lifetime of a cached footprint list.
#[must_use]
pub fn default_footprint_ttl() -> Duration {
    Duration::hours(1)
}

/// Confidence multiplier applied when synthesizing a placeholder plot
/// from its contained building.
const PLACEHOLDER_CONFIDENCE_DISCOUNT: f64 = 0.8;

/// Options for one extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Whether to fetch plot polygons.
    pub include_plots: bool,
    /// Whether to fetch building polygons.
    pub include_buildings: bool,
    /// Footprints below this confidence are dropped.
    pub min_confidence: f64,
    /// Maximum plots kept; buildings keep twice this (buildings
    /// commonly outnumber plots per area).
    pub max_results: usize,
    /// Thresholds for the heuristic shape classifier.
    pub shape_thresholds: ShapeThresholds,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_plots: true,
            include_buildings: true,
            min_confidence: 0.4,
            max_results: 25,
            shape_thresholds: ShapeThresholds::default(),
        }
    }
}

/// Orchestrates footprint extraction against a pluggable source.
pub struct FootprintExtractor {
    source: Arc<dyn FootprintSource>,
    cache: Arc<FootprintCache>,
}

impl FootprintExtractor {
    /// Creates an extractor over `source`, caching results in `cache`.
    #[must_use]
    pub fn new(source: Arc<dyn FootprintSource>, cache: Arc<FootprintCache>) -> Self {
        Self { source, cache }
    }

    /// Extracts plot and building footprints for `bounds`.
    ///
    /// A live cache entry for the quantized bounds bypasses the source
    /// entirely; the cached list is re-partitioned and re-associated.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ExtractionFailed`] if the source fails
    /// and [`ExtractError::InvalidGeometry`] if the source hands back a
    /// ring that violates its contract.
    pub async fn extract(
        &self,
        bounds: Bounds,
        options: &ExtractOptions,
    ) -> Result<FootprintSearchResult, ExtractError> {
        let started = Instant::now();
        let cache_key = bounds.quantized_key();

        if let Some(cached) = self.cache.get(&cache_key) {
            log::debug!("footprint cache hit for {cache_key}");
            return Ok(build_result(cached, started, true));
        }

        let mut plots = if options.include_plots {
            self.fetch_kind(bounds, FootprintKind::Plot, options)
                .await?
        } else {
            Vec::new()
        };
        let mut buildings = if options.include_buildings {
            self.fetch_kind(bounds, FootprintKind::Building, options)
                .await?
        } else {
            Vec::new()
        };

        truncate_and_name(&mut plots, options.max_results, "plot");
        truncate_and_name(&mut buildings, options.max_results * 2, "building");

        log::debug!(
            "extracted {} plots and {} buildings from source {} for {cache_key}",
            plots.len(),
            buildings.len(),
            self.source.id()
        );

        let combined: Vec<Footprint> = plots.into_iter().chain(buildings).collect();
        self.cache.insert(cache_key, combined.clone());

        Ok(build_result(combined, started, false))
    }

    /// Fetches one footprint kind, filters by confidence, derives
    /// geometry and shape, and sorts by area descending.
    async fn fetch_kind(
        &self,
        bounds: Bounds,
        kind: FootprintKind,
        options: &ExtractOptions,
    ) -> Result<Vec<Footprint>, ExtractError> {
        let raw = self.source.fetch_polygons(bounds, kind).await?;

        let mut footprints = Vec::with_capacity(raw.len());
        for item in raw {
            if item.confidence < options.min_confidence {
                log::trace!(
                    "dropping {kind} footprint below confidence floor ({} < {})",
                    item.confidence,
                    options.min_confidence
                );
                continue;
            }

            let polygon = Polygon::new(item.coordinates)?;
            let shape = classify_shape(polygon.coordinates(), &options.shape_thresholds);

            footprints.push(Footprint {
                // Named once the batch is sorted and truncated.
                id: String::new(),
                kind,
                polygon,
                shape,
                confidence: item.confidence,
                address: item.address,
                metadata: item.metadata,
            });
        }

        // Larger footprints are more likely legitimate parcels or
        // structures than extraction artifacts.
        footprints.sort_by(|a, b| b.polygon.area_sq_m().total_cmp(&a.polygon.area_sq_m()));

        Ok(footprints)
    }
}

/// Truncates a sorted batch and assigns batch-unique ids.
fn truncate_and_name(footprints: &mut Vec<Footprint>, limit: usize, prefix: &str) {
    footprints.truncate(limit);
    for (index, footprint) in footprints.iter_mut().enumerate() {
        footprint.id = format!("{prefix}-{}", index + 1);
    }
}

/// Partitions a combined footprint list, associates buildings to
/// plots, and assembles the timed search result.
fn build_result(
    combined: Vec<Footprint>,
    started: Instant,
    from_cache: bool,
) -> FootprintSearchResult {
    let (plots, buildings): (Vec<Footprint>, Vec<Footprint>) = combined
        .into_iter()
        .partition(|f| f.kind == FootprintKind::Plot);

    let plot_count = plots.len();
    let building_count = buildings.len();
    let associated = associate(plots, buildings);

    #[allow(clippy::cast_possible_truncation)]
    let elapsed_ms = started.elapsed().as_millis() as u64;

    FootprintSearchResult {
        plots: associated,
        total_count: plot_count + building_count,
        plot_count,
        building_count,
        elapsed_ms,
        from_cache,
    }
}

/// Associates each building with the first plot containing its
/// centroid. Buildings matching no plot get a synthesized placeholder
/// plot so none is orphaned; every building lands in exactly one entry.
#[must_use]
pub fn associate(plots: Vec<Footprint>, buildings: Vec<Footprint>) -> Vec<PlotWithBuildings> {
    let mut entries: Vec<PlotWithBuildings> = plots
        .into_iter()
        .map(|plot| PlotWithBuildings {
            plot,
            buildings: Vec::new(),
        })
        .collect();

    let mut orphans = Vec::new();
    for building in buildings {
        let centroid = building.polygon.centroid();
        match entries.iter_mut().find(|e| e.plot.polygon.contains(centroid)) {
            Some(entry) => entry.buildings.push(building),
            None => orphans.push(building),
        }
    }

    for building in orphans {
        let plot = synthesize_placeholder_plot(&building);
        entries.push(PlotWithBuildings {
            plot,
            buildings: vec![building],
        });
    }

    entries
}

/// Builds a placeholder plot wrapping an orphan building: the
/// building's own ring, plot kind, discounted confidence, and a
/// deterministic id derived from the building's.
fn synthesize_placeholder_plot(building: &Footprint) -> Footprint {
    Footprint {
        id: format!("plot-for-{}", building.id),
        kind: FootprintKind::Plot,
        polygon: building.polygon.clone(),
        shape: building.shape,
        confidence: building.confidence * PLACEHOLDER_CONFIDENCE_DISCOUNT,
        address: building.address.clone(),
        metadata: SourceMetadata::Synthesized,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use parcel_map_cache::ManualClock;
    use parcel_map_models::{Coordinate, Shape};

    use super::*;
    use crate::{RawFootprint, SourceError};

    /// Square ring of `size_deg` degrees per side with its southwest
    /// corner at (`lat`, `lng`).
    fn square_ring(lat: f64, lng: f64, size_deg: f64) -> Vec<Coordinate> {
        vec![
            Coordinate::new(lat, lng),
            Coordinate::new(lat, lng + size_deg),
            Coordinate::new(lat + size_deg, lng + size_deg),
            Coordinate::new(lat + size_deg, lng),
        ]
    }

    fn raw(kind: FootprintKind, ring: Vec<Coordinate>, confidence: f64) -> RawFootprint {
        RawFootprint {
            coordinates: ring,
            confidence,
            kind,
            address: None,
            metadata: SourceMetadata::SegmentationModel {
                model: "test-model".to_string(),
            },
        }
    }

    /// Source serving fixed raw footprints and counting fetches.
    struct FakeSource {
        plots: Vec<RawFootprint>,
        buildings: Vec<RawFootprint>,
        calls: Mutex<usize>,
        fail: bool,
    }

    impl FakeSource {
        fn new(plots: Vec<RawFootprint>, buildings: Vec<RawFootprint>) -> Self {
            Self {
                plots,
                buildings,
                calls: Mutex::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                plots: Vec::new(),
                buildings: Vec::new(),
                calls: Mutex::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl FootprintSource for FakeSource {
        fn id(&self) -> &str {
            "fake"
        }

        async fn fetch_polygons(
            &self,
            _bounds: Bounds,
            kind: FootprintKind,
        ) -> Result<Vec<RawFootprint>, SourceError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(SourceError::Provider {
                    message: "segmentation model offline".to_string(),
                });
            }
            Ok(match kind {
                FootprintKind::Plot => self.plots.clone(),
                FootprintKind::Building => self.buildings.clone(),
            })
        }
    }

    fn extractor_over(source: Arc<FakeSource>) -> (FootprintExtractor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(FootprintCache::new(default_footprint_ttl(), clock.clone()));
        (FootprintExtractor::new(source, cache), clock)
    }

    fn test_bounds() -> Bounds {
        Bounds::around(Coordinate::new(0.0015, 0.0015), 500.0)
    }

    #[tokio::test]
    async fn filters_low_confidence_and_sorts_by_area() {
        let source = Arc::new(FakeSource::new(
            vec![
                raw(FootprintKind::Plot, square_ring(0.0, 0.0, 0.001), 0.9),
                raw(FootprintKind::Plot, square_ring(0.0, 0.002, 0.002), 0.8),
                raw(FootprintKind::Plot, square_ring(0.0, 0.005, 0.001), 0.3),
            ],
            Vec::new(),
        ));
        let (extractor, _clock) = extractor_over(source);

        let result = extractor
            .extract(test_bounds(), &ExtractOptions::default())
            .await
            .unwrap();

        // The 0.3-confidence plot fell below the 0.4 floor.
        assert_eq!(result.plot_count, 2);
        // Largest first: the 0.002-degree square outranks the 0.001.
        let first = &result.plots[0].plot;
        let second = &result.plots[1].plot;
        assert!(first.polygon.area_sq_m() > second.polygon.area_sq_m());
        assert_eq!(first.id, "plot-1");
        assert_eq!(second.id, "plot-2");
    }

    #[tokio::test]
    async fn classifies_shapes_during_extraction() {
        let source = Arc::new(FakeSource::new(
            vec![raw(FootprintKind::Plot, square_ring(0.0, 0.0, 0.001), 0.9)],
            Vec::new(),
        ));
        let (extractor, _clock) = extractor_over(source);

        let result = extractor
            .extract(test_bounds(), &ExtractOptions::default())
            .await
            .unwrap();
        assert_eq!(result.plots[0].plot.shape, Shape::Square);
    }

    #[tokio::test]
    async fn truncates_buildings_at_twice_max_results() {
        let buildings = (0..10)
            .map(|i| {
                raw(
                    FootprintKind::Building,
                    square_ring(0.0, f64::from(i) * 0.002, 0.001),
                    0.9,
                )
            })
            .collect();
        let source = Arc::new(FakeSource::new(Vec::new(), buildings));
        let (extractor, _clock) = extractor_over(source);

        let options = ExtractOptions {
            max_results: 3,
            include_plots: false,
            ..ExtractOptions::default()
        };
        let result = extractor.extract(test_bounds(), &options).await.unwrap();

        assert_eq!(result.building_count, 6);
    }

    #[tokio::test]
    async fn association_wraps_orphan_buildings() {
        // Two plots, three buildings, one building's centroid outside
        // both plots.
        let plots = vec![
            raw(FootprintKind::Plot, square_ring(0.0, 0.0, 0.001), 0.9),
            raw(FootprintKind::Plot, square_ring(0.0, 0.002, 0.001), 0.9),
        ];
        let buildings = vec![
            raw(
                FootprintKind::Building,
                square_ring(0.0002, 0.0002, 0.0004),
                0.9,
            ),
            raw(
                FootprintKind::Building,
                square_ring(0.0002, 0.0022, 0.0004),
                0.9,
            ),
            raw(
                FootprintKind::Building,
                square_ring(0.0002, 0.0052, 0.0004),
                0.75,
            ),
        ];
        let source = Arc::new(FakeSource::new(plots, buildings));
        let (extractor, _clock) = extractor_over(source);

        let result = extractor
            .extract(test_bounds(), &ExtractOptions::default())
            .await
            .unwrap();

        assert_eq!(result.plots.len(), 3);
        assert_eq!(result.plot_count, 2);
        assert_eq!(result.building_count, 3);

        // Every building appears exactly once across all entries.
        let mut ids: Vec<&str> = result
            .plots
            .iter()
            .flat_map(|p| p.buildings.iter().map(|b| b.id.as_str()))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids.len(), 3);
        ids.dedup();
        assert_eq!(ids.len(), 3);

        let synthesized = result
            .plots
            .iter()
            .find(|p| p.plot.metadata == SourceMetadata::Synthesized)
            .expect("orphan building should get a placeholder plot");
        assert_eq!(synthesized.buildings.len(), 1);
        let building = &synthesized.buildings[0];
        assert_eq!(synthesized.plot.id, format!("plot-for-{}", building.id));
        assert!((synthesized.plot.confidence - 0.75 * 0.8).abs() < 1e-12);
        assert_eq!(
            synthesized.plot.polygon.coordinates(),
            building.polygon.coordinates()
        );
    }

    #[tokio::test]
    async fn cache_hit_bypasses_the_source() {
        let source = Arc::new(FakeSource::new(
            vec![raw(FootprintKind::Plot, square_ring(0.0, 0.0, 0.001), 0.9)],
            vec![raw(
                FootprintKind::Building,
                square_ring(0.0002, 0.0002, 0.0004),
                0.9,
            )],
        ));
        let (extractor, _clock) = extractor_over(source.clone());
        let options = ExtractOptions::default();

        let fresh = extractor.extract(test_bounds(), &options).await.unwrap();
        assert!(!fresh.from_cache);
        assert_eq!(source.call_count(), 2); // one per kind

        let cached = extractor.extract(test_bounds(), &options).await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(source.call_count(), 2);

        // Re-association of the cached list reproduces the result.
        assert_eq!(cached.plots, fresh.plots);
        assert_eq!(cached.total_count, fresh.total_count);
    }

    #[tokio::test]
    async fn expired_cache_entry_refetches() {
        let source = Arc::new(FakeSource::new(
            vec![raw(FootprintKind::Plot, square_ring(0.0, 0.0, 0.001), 0.9)],
            Vec::new(),
        ));
        let (extractor, clock) = extractor_over(source.clone());
        let options = ExtractOptions::default();

        extractor.extract(test_bounds(), &options).await.unwrap();
        clock.advance(Duration::hours(2));
        let result = extractor.extract(test_bounds(), &options).await.unwrap();

        assert!(!result.from_cache);
        assert_eq!(source.call_count(), 4);
    }

    #[tokio::test]
    async fn source_failure_propagates_and_caches_nothing() {
        let source = Arc::new(FakeSource::failing());
        let (extractor, _clock) = extractor_over(source.clone());

        let err = extractor
            .extract(test_bounds(), &ExtractOptions::default())
            .await
            .expect_err("source failure should propagate");
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));

        // The failure is not retried internally and nothing was cached,
        // so the next call hits the source again.
        let calls_after_first = source.call_count();
        let _ = extractor
            .extract(test_bounds(), &ExtractOptions::default())
            .await;
        assert!(source.call_count() > calls_after_first);
    }
}
