#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demo CLI for the parcel-map footprint pipeline.
//!
//! Runs the full extract -> label flow through the request coordinator
//! against deterministic in-process fixtures and prints the result as
//! JSON. Useful for eyeballing pipeline output and as an executable
//! example of how the crates compose.

mod fixtures;

use std::sync::Arc;

use clap::Parser;
use parcel_map_cache::SystemClock;
use parcel_map_coordinator::{Outcome, ProgressSink, RequestCoordinator};
use parcel_map_entrance::{
    DetectOptions, EntranceDetector, EntranceLabeler, LabelOptions, LabeledFootprint,
    ValidationCache, default_validation_ttl,
};
use parcel_map_footprint::{
    ExtractOptions, FootprintCache, FootprintExtractor, FootprintSearchResult, Geocoder,
    default_footprint_ttl,
};
use parcel_map_models::{Bounds, Coordinate};
use serde::Serialize;

use crate::fixtures::{FixtureDetector, FixtureGeocoder, FixtureSource, FixtureValidator};

/// Extract property footprints and label building entrances.
#[derive(Parser)]
#[command(name = "parcel-map")]
struct Args {
    /// Address or ZIP to center the search on (overrides --lat/--lng).
    #[arg(long)]
    address: Option<String>,

    /// Search center latitude.
    #[arg(long, default_value_t = 38.8951)]
    lat: f64,

    /// Search center longitude.
    #[arg(long, default_value_t = -77.0364)]
    lng: f64,

    /// Search radius in meters.
    #[arg(long, default_value_t = 250.0)]
    radius_m: f64,

    /// Minimum footprint confidence to keep.
    #[arg(long, default_value_t = 0.4)]
    min_confidence: f64,

    /// Maximum number of plots (buildings keep twice this).
    #[arg(long, default_value_t = 25)]
    max_results: usize,

    /// Validate projected entrances against the imagery fixture.
    #[arg(long)]
    validate_imagery: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

/// Forwards active-request progress to the logger.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&self, phase: &str, percent: u8) {
        log::info!("{phase}: {percent}%");
    }
}

/// Everything one pipeline run produced.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    bounds: Bounds,
    search: FootprintSearchResult,
    labeled_buildings: Vec<LabeledFootprint>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let center = match &args.address {
        Some(address) => FixtureGeocoder.resolve(address).await?,
        None => Coordinate::new(args.lat, args.lng),
    };
    let bounds = Bounds::around(center, args.radius_m);

    let clock = Arc::new(SystemClock);
    let extractor = FootprintExtractor::new(
        Arc::new(FixtureSource),
        Arc::new(FootprintCache::new(default_footprint_ttl(), clock.clone())),
    );
    let labeler = EntranceLabeler::with_validator(
        Arc::new(FixtureValidator),
        Arc::new(ValidationCache::new(default_validation_ttl(), clock)),
    );

    let extract_options = ExtractOptions {
        min_confidence: args.min_confidence,
        max_results: args.max_results,
        ..ExtractOptions::default()
    };
    let label_options = LabelOptions {
        validate_with_imagery: args.validate_imagery,
        ..LabelOptions::default()
    };

    let coordinator = RequestCoordinator::with_progress(Arc::new(LogProgress));
    let extractor = &extractor;
    let labeler = &labeler;
    let extract_options = &extract_options;
    let label_options = &label_options;
    let outcome = coordinator
        .run(|progress| async move {
            progress.report("extract", 0);
            let search = extractor.extract(bounds, extract_options).await?;
            progress.report("extract", 100);

            let mut labeled_buildings = Vec::new();
            let buildings: Vec<_> = search
                .plots
                .iter()
                .flat_map(|p| p.buildings.iter().cloned())
                .collect();
            for (index, building) in buildings.iter().enumerate() {
                let centroid = building.polygon.centroid();
                let candidates = FixtureDetector
                    .detect(centroid.lat, centroid.lng, &DetectOptions::default())
                    .await?;
                labeled_buildings.push(labeler.label(building, &candidates, label_options).await);

                #[allow(clippy::cast_possible_truncation)]
                let percent = ((index + 1) * 100 / buildings.len().max(1)) as u8;
                progress.report("label", percent);
            }

            Ok::<Report, Box<dyn std::error::Error>>(Report {
                bounds,
                search,
                labeled_buildings,
            })
        })
        .await;

    match outcome {
        Outcome::Completed(report) => {
            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    // A failed extraction is presented as a drawing
                    // prompt, not a raw error.
                    eprintln!("Could not determine property boundaries; draw them manually.");
                    return Err(e);
                }
            };
            let json = if args.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
        }
        Outcome::Discarded => {
            log::info!("request superseded; nothing to print");
        }
    }

    Ok(())
}
