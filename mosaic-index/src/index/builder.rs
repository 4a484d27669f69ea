//! Footprint index construction.
//!
//! The builder turns a mosaic's granules into the in-memory form of the
//! footprint dataset: schema, one record per granule and the aggregate
//! envelope. Nothing is written to disk here.
//!
//! # Reference granule
//!
//! The first granule (in enumeration order) with both an envelope and a CRS
//! anchors the whole index: its CRS becomes the schema CRS, its envelope
//! seeds the aggregate envelope, and its pixel geometry later determines the
//! descriptor resolution. Other granules are assumed to share that CRS. They
//! are never reprojected, so a mixed-CRS mosaic yields a meaningless
//! aggregate envelope; mismatches are logged, not corrected.

use tracing::{debug, warn};

use super::error::BuildError;
use super::schema::{FootprintRecord, FootprintSchema};
use crate::config::IndexConfig;
use crate::geo::{Crs, Envelope};
use crate::granule::{Granule, PixelSize};
use crate::mosaic::Mosaic;

/// The granule that fixes CRS and resolution for a mosaic.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGranule {
    pub location: String,
    pub envelope: Envelope,
    pub crs: Crs,
    pub pixel_size: Option<PixelSize>,
}

impl ReferenceGranule {
    fn from_granule(granule: &Granule) -> Option<Self> {
        let (envelope, crs) = granule.reference_extent()?;
        Some(Self {
            location: granule.location(),
            envelope: *envelope,
            crs: crs.clone(),
            pixel_size: granule.pixel_size(),
        })
    }
}

/// In-memory footprint index of one mosaic.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintIndex {
    pub schema: FootprintSchema,
    /// Footprints in granule enumeration order.
    pub records: Vec<FootprintRecord>,
    /// Union of every non-null granule envelope.
    pub envelope: Envelope,
    pub reference: ReferenceGranule,
    /// Granules without an envelope (written as null shapes or skipped).
    pub null_envelopes: usize,
}

/// Builds [`FootprintIndex`]es.
#[derive(Debug, Clone, Default)]
pub struct FootprintIndexBuilder {
    config: IndexConfig,
}

impl FootprintIndexBuilder {
    /// Create a builder.
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Build the footprint index of `mosaic`.
    ///
    /// # Errors
    ///
    /// - [`BuildError::NoGranules`] when the mosaic is empty; callers treat
    ///   this as "nothing to do"
    /// - [`BuildError::MissingCrs`] when no granule has both an envelope and
    ///   a CRS
    pub fn build(&self, mosaic: &dyn Mosaic) -> Result<FootprintIndex, BuildError> {
        let granules: Vec<Granule> = mosaic.granules().collect();
        if granules.is_empty() {
            return Err(BuildError::NoGranules);
        }

        let reference = granules
            .iter()
            .find_map(ReferenceGranule::from_granule)
            .ok_or(BuildError::MissingCrs {
                granules: granules.len(),
            })?;
        debug!(
            mosaic = mosaic.name(),
            reference = %reference.location,
            crs = %reference.crs,
            "Selected reference granule"
        );

        let schema = FootprintSchema::new(mosaic.name(), reference.crs.clone(), mosaic.time_mode());
        let with_time = schema.has_time();

        let mut envelope = reference.envelope;
        let mut records = Vec::with_capacity(granules.len());
        let mut null_envelopes = 0;

        for granule in &granules {
            let geometry = match granule.envelope() {
                Some(granule_envelope) => {
                    if let Some(crs) = granule.crs() {
                        if crs != &reference.crs {
                            warn!(
                                granule = %granule.file_ref().display(),
                                crs = %crs,
                                reference_crs = %reference.crs,
                                "Granule CRS differs from reference CRS, footprint is not reprojected"
                            );
                        }
                    }
                    envelope.include(granule_envelope);
                    Some(*granule_envelope)
                }
                None => {
                    null_envelopes += 1;
                    if self.config.skip_null_envelopes {
                        warn!(granule = %granule.file_ref().display(), "Skipping granule, no envelope");
                        continue;
                    }
                    warn!(
                        granule = %granule.file_ref().display(),
                        "Granule has no envelope, writing footprint without geometry"
                    );
                    None
                }
            };

            records.push(FootprintRecord {
                geometry,
                location: granule.location(),
                time: if with_time { granule.timestamp() } else { None },
            });
        }

        Ok(FootprintIndex {
            schema,
            records,
            envelope,
            reference,
            null_envelopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mosaic::{InMemoryMosaic, TimeMode};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn granule(name: &str, env: (f64, f64, f64, f64)) -> Granule {
        Granule::new(format!("/m/{}", name))
            .with_envelope(Envelope::new(env.0, env.1, env.2, env.3))
            .with_crs(Crs::epsg(4326))
            .with_pixel_size(PixelSize::new(100, 100))
    }

    #[test]
    fn test_empty_mosaic_is_no_granules() {
        let mosaic = InMemoryMosaic::new("m", "/m");
        let err = FootprintIndexBuilder::default().build(&mosaic).unwrap_err();
        assert_eq!(err, BuildError::NoGranules);
    }

    #[test]
    fn test_no_crs_anywhere_is_missing_crs() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            Granule::new("a.tif").with_envelope(Envelope::new(0.0, 0.0, 1.0, 1.0)),
            Granule::new("b.tif").with_crs(Crs::epsg(4326)),
        ]);
        let err = FootprintIndexBuilder::default().build(&mosaic).unwrap_err();
        assert_eq!(err, BuildError::MissingCrs { granules: 2 });
    }

    #[test]
    fn test_three_tiles_aggregate() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            granule("a.tif", (0.0, 0.0, 1.0, 1.0)),
            granule("b.tif", (1.0, 0.0, 2.0, 1.0)),
            granule("c.tif", (0.0, 1.0, 1.0, 2.0)),
        ]);
        let index = FootprintIndexBuilder::default().build(&mosaic).unwrap();

        assert_eq!(index.envelope, Envelope::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(index.records.len(), 3);
        assert!(!index.schema.has_time());
        let locations: Vec<_> = index.records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["a.tif", "b.tif", "c.tif"]);
        assert_eq!(index.reference.location, "a.tif");
    }

    #[test]
    fn test_reference_is_first_with_envelope_and_crs() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            Granule::new("/m/no_env.tif").with_crs(Crs::epsg(3857)),
            Granule::new("/m/no_crs.tif").with_envelope(Envelope::new(5.0, 5.0, 6.0, 6.0)),
            granule("ref.tif", (0.0, 0.0, 1.0, 1.0)),
        ]);
        let index = FootprintIndexBuilder::default().build(&mosaic).unwrap();

        assert_eq!(index.reference.location, "ref.tif");
        assert_eq!(index.schema.crs(), &Crs::epsg(4326));
        // The CRS-less granule's envelope still joins the aggregate
        assert_eq!(index.envelope, Envelope::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_null_envelope_keeps_record() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            granule("a.tif", (0.0, 0.0, 1.0, 1.0)),
            Granule::new("/m/b.tif"),
        ]);
        let index = FootprintIndexBuilder::default().build(&mosaic).unwrap();

        assert_eq!(index.records.len(), 2);
        assert_eq!(index.records[1].geometry, None);
        assert_eq!(index.records[1].location, "b.tif");
        assert_eq!(index.null_envelopes, 1);
        assert_eq!(index.envelope, Envelope::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_skip_null_envelopes() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            Granule::new("/m/a.tif"),
            granule("b.tif", (0.0, 0.0, 1.0, 1.0)),
        ]);
        let builder = FootprintIndexBuilder::new(IndexConfig::default().with_skip_null_envelopes(true));
        let index = builder.build(&mosaic).unwrap();

        assert_eq!(index.records.len(), 1);
        assert_eq!(index.records[0].location, "b.tif");
        assert_eq!(index.null_envelopes, 1);
    }

    #[test]
    fn test_time_only_when_enabled() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let granules = vec![
            granule("a.tif", (0.0, 0.0, 1.0, 1.0)).with_timestamp(ts),
            granule("b.tif", (1.0, 0.0, 2.0, 1.0)),
        ];

        let plain = InMemoryMosaic::new("m", "/m").with_granules(granules.clone());
        let index = FootprintIndexBuilder::default().build(&plain).unwrap();
        assert!(index.records.iter().all(|r| r.time.is_none()));

        let timed = InMemoryMosaic::new("m", "/m")
            .with_time_mode(TimeMode::Timestamp)
            .with_granules(granules);
        let index = FootprintIndexBuilder::default().build(&timed).unwrap();
        assert!(index.schema.has_time());
        assert_eq!(index.records[0].time, Some(ts));
        assert_eq!(index.records[1].time, None);
    }

    #[test]
    fn test_mixed_crs_is_not_reprojected() {
        let mosaic = InMemoryMosaic::new("m", "/m").with_granules(vec![
            granule("a.tif", (0.0, 0.0, 1.0, 1.0)),
            Granule::new("/m/b.tif")
                .with_envelope(Envelope::new(500000.0, 0.0, 500100.0, 100.0))
                .with_crs(Crs::epsg(32633)),
        ]);
        let index = FootprintIndexBuilder::default().build(&mosaic).unwrap();
        assert_eq!(index.envelope.max_x, 500100.0);
        assert_eq!(index.schema.crs(), &Crs::epsg(4326));
    }

    fn maybe_envelope() -> impl Strategy<Value = Option<(f64, f64, f64, f64)>> {
        prop::option::weighted(
            0.8,
            (-100.0f64..100.0, -100.0f64..100.0, 0.1f64..10.0, 0.1f64..10.0)
                .prop_map(|(x, y, w, h)| (x, y, x + w, y + h)),
        )
    }

    proptest! {
        #[test]
        fn prop_one_record_per_granule_and_union(
            first in (-100.0f64..100.0, -100.0f64..100.0),
            rest in prop::collection::vec(maybe_envelope(), 0..20),
        ) {
            let mut granules = vec![granule("g0.tif", (first.0, first.1, first.0 + 1.0, first.1 + 1.0))];
            for (i, env) in rest.iter().enumerate() {
                let name = format!("/m/g{}.tif", i + 1);
                granules.push(match env {
                    Some(e) => Granule::new(name).with_envelope(Envelope::new(e.0, e.1, e.2, e.3)),
                    None => Granule::new(name),
                });
            }

            let mut expected = Envelope::new(first.0, first.1, first.0 + 1.0, first.1 + 1.0);
            for e in rest.iter().flatten() {
                expected.include(&Envelope::new(e.0, e.1, e.2, e.3));
            }

            let mosaic = InMemoryMosaic::new("m", "/m").with_granules(granules.clone());
            let index = FootprintIndexBuilder::default().build(&mosaic).unwrap();

            prop_assert_eq!(index.records.len(), granules.len());
            for (record, granule) in index.records.iter().zip(&granules) {
                prop_assert_eq!(&record.location, &granule.location());
                prop_assert_eq!(record.geometry.as_ref(), granule.envelope());
            }
            prop_assert_eq!(index.envelope, expected);
        }
    }
}
