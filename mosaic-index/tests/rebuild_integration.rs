//! Integration tests for mosaic index rebuilds.
//!
//! These tests drive the full rebuild pipeline against scratch directories:
//! - footprint dataset and descriptor contents
//! - empty mosaics and mosaics without a CRS
//! - time-indexed mosaics
//! - repeated rebuilds
//! - directory discovery feeding a rebuild
//!
//! Run with: `cargo test --test rebuild_integration`

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use mosaic_index::config::IndexConfig;
use mosaic_index::geo::{Crs, Envelope};
use mosaic_index::granule::{Granule, PixelSize};
use mosaic_index::index::{
    IndexError, MosaicDescriptor, MosaicIndex, RebuildOutcome, RebuildStep,
};
use mosaic_index::mosaic::{DirectoryMosaic, DiscoveryOptions, InMemoryMosaic, TimeMode};
use mosaic_index::shapefile::read_dataset;

// ============================================================================
// Helper Functions
// ============================================================================

/// A 100x100 pixel EPSG:4326 granule covering `env`.
fn tile(dir: &Path, name: &str, env: (f64, f64, f64, f64)) -> Granule {
    Granule::new(dir.join(name))
        .with_envelope(Envelope::new(env.0, env.1, env.2, env.3))
        .with_crs(Crs::epsg(4326))
        .with_pixel_size(PixelSize::new(100, 100))
}

/// The three-tile L-shaped mosaic used by several tests.
fn three_tiles(dir: &Path) -> Vec<Granule> {
    vec![
        tile(dir, "a.tif", (0.0, 0.0, 1.0, 1.0)),
        tile(dir, "b.tif", (1.0, 0.0, 2.0, 1.0)),
        tile(dir, "c.tif", (0.0, 1.0, 1.0, 2.0)),
    ]
}

fn rebuild(mosaic: &InMemoryMosaic) -> RebuildOutcome {
    MosaicIndex::new(mosaic, IndexConfig::default())
        .rebuild()
        .expect("rebuild should succeed")
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Three adjacent tiles produce an aggregate envelope covering all of them.
#[test]
fn test_three_tiles_written() {
    let temp = TempDir::new().unwrap();
    let mosaic = InMemoryMosaic::new("ortho", temp.path()).with_granules(three_tiles(temp.path()));

    let RebuildOutcome::Written(summary) = rebuild(&mosaic) else {
        panic!("expected a written index");
    };
    assert_eq!(summary.record_count, 3);
    assert_eq!(summary.envelope, Envelope::new(0.0, 0.0, 2.0, 2.0));

    let dataset = read_dataset(temp.path(), "ortho").unwrap();
    assert_eq!(dataset.shape_type, 5);
    assert_eq!(dataset.bbox, Envelope::new(0.0, 0.0, 2.0, 2.0));
    assert!(!dataset.has_attribute("time"));
    let locations: Vec<_> = dataset.records.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["a.tif", "b.tif", "c.tif"]);
    assert_eq!(
        dataset.records[1].geometry,
        Some(Envelope::new(1.0, 0.0, 2.0, 1.0))
    );
    assert!(dataset
        .projection
        .as_deref()
        .is_some_and(|wkt| wkt.contains("WGS")));

    let descriptor = fs::read_to_string(temp.path().join("ortho.properties")).unwrap();
    assert!(descriptor.contains("Name=ortho"));
    assert!(descriptor.contains("Levels=0.010000,0.010000"));
    assert!(descriptor.contains("LevelsNum=1"));
    assert!(descriptor.contains("LocationAttribute=location"));
    assert!(!descriptor.contains("TimeAttribute"));
}

/// An empty mosaic succeeds, writes nothing and leaves no stale artifacts.
#[test]
fn test_empty_mosaic_is_skipped() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("ortho.shp"), b"stale").unwrap();
    fs::write(temp.path().join("ortho.properties"), b"stale").unwrap();
    fs::write(temp.path().join("readme.txt"), b"keep").unwrap();

    let mosaic = InMemoryMosaic::new("ortho", temp.path());
    assert_eq!(rebuild(&mosaic), RebuildOutcome::Skipped);
    assert_eq!(file_names(temp.path()), vec!["readme.txt"]);
}

/// Without any CRS the rebuild fails in the build step and writes nothing.
#[test]
fn test_missing_crs_fails() {
    let temp = TempDir::new().unwrap();
    let mosaic = InMemoryMosaic::new("ortho", temp.path()).with_granules(vec![
        Granule::new(temp.path().join("a.tif"))
            .with_envelope(Envelope::new(0.0, 0.0, 1.0, 1.0))
            .with_pixel_size(PixelSize::new(10, 10)),
        Granule::new(temp.path().join("b.tif")).with_crs(Crs::epsg(4326)),
    ]);

    let err = MosaicIndex::new(&mosaic, IndexConfig::default())
        .rebuild()
        .unwrap_err();
    assert_eq!(err.mosaic, "ortho");
    assert_eq!(err.step, RebuildStep::Build);
    assert!(matches!(err.cause, IndexError::MissingCrs { granules: 2 }));
    assert!(file_names(temp.path()).is_empty());
}

/// A timestamp mosaic keeps granules without a timestamp as null times.
#[test]
fn test_timestamp_mode_with_missing_time() {
    let temp = TempDir::new().unwrap();
    let mosaic = InMemoryMosaic::new("scenes", temp.path())
        .with_time_mode(TimeMode::Timestamp)
        .with_granules(vec![
            tile(temp.path(), "a.tif", (0.0, 0.0, 1.0, 1.0))
                .with_timestamp(Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()),
            tile(temp.path(), "b.tif", (1.0, 0.0, 2.0, 1.0)),
        ]);

    let RebuildOutcome::Written(summary) = rebuild(&mosaic) else {
        panic!("expected a written index");
    };
    assert!(summary.time_enabled);

    let dataset = read_dataset(temp.path(), "scenes").unwrap();
    assert!(dataset.has_attribute("time"));
    assert_eq!(dataset.records[0].time, NaiveDate::from_ymd_opt(2023, 6, 1));
    assert_eq!(dataset.records[1].time, None);

    let descriptor = MosaicDescriptor::load(&summary.descriptor_path).unwrap();
    assert_eq!(descriptor.time_attribute.as_deref(), Some("time"));
}

/// Null envelopes become null shapes unless configured to be skipped.
#[test]
fn test_null_envelope_records() {
    let temp = TempDir::new().unwrap();
    let granules = vec![
        tile(temp.path(), "a.tif", (0.0, 0.0, 1.0, 1.0)),
        Granule::new(temp.path().join("b.tif")).with_crs(Crs::epsg(4326)),
    ];

    let kept = InMemoryMosaic::new("kept", temp.path()).with_granules(granules.clone());
    rebuild(&kept);
    let dataset = read_dataset(temp.path(), "kept").unwrap();
    assert_eq!(dataset.records.len(), 2);
    assert_eq!(dataset.records[1].geometry, None);
    assert_eq!(dataset.records[1].location, "b.tif");

    let skipped = InMemoryMosaic::new("skipped", temp.path()).with_granules(granules);
    MosaicIndex::new(
        &skipped,
        IndexConfig::default().with_skip_null_envelopes(true),
    )
    .rebuild()
    .unwrap();
    let dataset = read_dataset(temp.path(), "skipped").unwrap();
    assert_eq!(dataset.records.len(), 1);
}

/// Rebuilding an unchanged mosaic reproduces the same artifacts.
#[test]
fn test_rebuild_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let mosaic = InMemoryMosaic::new("ortho", temp.path()).with_granules(three_tiles(temp.path()));

    rebuild(&mosaic);
    let descriptor = fs::read(temp.path().join("ortho.properties")).unwrap();
    let shp = fs::read(temp.path().join("ortho.shp")).unwrap();
    let records = read_dataset(temp.path(), "ortho").unwrap().records;

    fs::write(temp.path().join("sample_image"), b"reader cache").unwrap();
    let RebuildOutcome::Written(summary) = rebuild(&mosaic) else {
        panic!("expected a written index");
    };
    assert!(!summary.removed.is_empty());
    assert_eq!(
        fs::read(temp.path().join("ortho.properties")).unwrap(),
        descriptor
    );
    assert_eq!(fs::read(temp.path().join("ortho.shp")).unwrap(), shp);
    assert_eq!(read_dataset(temp.path(), "ortho").unwrap().records, records);
    assert!(!temp.path().join("sample_image").exists());
}

/// Resolution depends only on the reference granule.
#[test]
fn test_resolution_from_reference_only() {
    let temp = TempDir::new().unwrap();
    let reference = tile(temp.path(), "ref.tif", (0.0, 0.0, 2.0, 1.0));

    let small = InMemoryMosaic::new("small", temp.path()).with_granule(reference.clone());
    let large = InMemoryMosaic::new("large", temp.path()).with_granules(vec![
        reference,
        Granule::new(temp.path().join("big.tif"))
            .with_envelope(Envelope::new(-50.0, -50.0, 50.0, 50.0))
            .with_crs(Crs::epsg(4326))
            .with_pixel_size(PixelSize::new(10, 10)),
    ]);
    rebuild(&small);
    rebuild(&large);

    let small = MosaicDescriptor::load(&temp.path().join("small.properties")).unwrap();
    let large = MosaicDescriptor::load(&temp.path().join("large.properties")).unwrap();
    assert_eq!(small.levels_value(), "0.020000,0.010000");
    assert_eq!(large.levels_value(), small.levels_value());
}

/// Granules discovered from a directory flow through to the written index.
#[test]
fn test_directory_mosaic_end_to_end() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("coast");
    fs::create_dir(&dir).unwrap();

    for (name, x) in [("tile_20240101.png", 0.0), ("tile_20240102.png", 1.0)] {
        image::RgbImage::new(4, 4).save(dir.join(name)).unwrap();
        let world = format!("0.25\n0\n0\n-0.25\n{}\n0.875\n", x + 0.125);
        fs::write(dir.join(name.replace(".png", ".pgw")), world).unwrap();
    }

    let options = DiscoveryOptions::default()
        .with_time_mode(TimeMode::Timestamp)
        .with_default_crs(Crs::epsg(4326))
        .with_timestamp_parser(Default::default());
    let mosaic = DirectoryMosaic::open(&dir, &options).unwrap();

    let RebuildOutcome::Written(summary) = MosaicIndex::new(&mosaic, IndexConfig::default())
        .rebuild()
        .unwrap()
    else {
        panic!("expected a written index");
    };
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.envelope, Envelope::new(0.0, 0.0, 2.0, 1.0));
    assert_eq!(summary.resolution, (0.25, 0.25));
    assert!(dir.join("coast.shp").is_file());

    let dataset = read_dataset(&dir, "coast").unwrap();
    assert_eq!(dataset.records[0].location, "tile_20240101.png");
    assert_eq!(dataset.records[1].time, NaiveDate::from_ymd_opt(2024, 1, 2));

    // The written artifacts are never mistaken for granules
    let reopened = DirectoryMosaic::open(&dir, &options).unwrap();
    assert_eq!(reopened.len(), 2);
}
