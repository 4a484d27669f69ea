//! Streaming writer for footprint shapefile sets.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use super::dbf::{self, Field, Value};
use super::shp::{self, ShapeType};
use super::{ShapefileError, CODE_PAGE};
use crate::geo::Envelope;
use crate::index::{AttributeKind, FootprintRecord, FootprintSchema};

/// Largest `.shp` length expressible in the header's 32-bit word count.
const MAX_FILE_LEN: usize = i32::MAX as usize * 2;

/// Outcome of a completed write.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Path of the `.shp` component.
    pub shp_path: PathBuf,
    /// Every component file written.
    pub components: Vec<PathBuf>,
    /// Number of records written.
    pub record_count: u32,
    /// Bounding box stored in the headers.
    pub bbox: Envelope,
}

/// Writes one footprint dataset.
///
/// The `.shp`, `.shx` and `.dbf` handles are opened by [`create`] and owned
/// by the writer, so they are released however the writer goes out of scope.
/// Headers carry lengths and counts that are only known at the end;
/// [`finish`] rewrites them. A writer dropped before `finish` leaves an
/// incomplete dataset behind and logs a warning.
///
/// [`create`]: FootprintWriter::create
/// [`finish`]: FootprintWriter::finish
pub struct FootprintWriter {
    dir: PathBuf,
    name: String,
    shp: BufWriter<File>,
    shx: BufWriter<File>,
    dbf: BufWriter<File>,
    fields: Vec<Field>,
    components: Vec<PathBuf>,
    shp_len: usize,
    record_count: u32,
    finished: bool,
}

impl FootprintWriter {
    /// Create the component files for `schema` in `dir`.
    ///
    /// Existing files with the same names are truncated. The `.prj` is
    /// written immediately; the `.cpg` only when `write_code_page` is set.
    pub fn create(
        dir: &Path,
        schema: &FootprintSchema,
        write_code_page: bool,
    ) -> Result<Self, ShapefileError> {
        let name = schema.name().to_string();
        let path_for = |ext: &str| dir.join(format!("{}.{}", name, ext));

        let fields: Vec<Field> = schema
            .attributes()
            .iter()
            .filter_map(|attr| match attr.kind {
                AttributeKind::Polygon => None,
                AttributeKind::Text => Some(Field::text(attr.name)),
                AttributeKind::Date => Some(Field::date(attr.name)),
            })
            .collect();

        let mut components = Vec::new();

        let prj_path = path_for("prj");
        match schema.crs().to_wkt() {
            Some(wkt) => {
                fs::write(&prj_path, wkt).map_err(ShapefileError::io(&prj_path))?;
                components.push(prj_path);
            }
            None => warn!(
                crs = %schema.crs(),
                "No WKT definition for CRS, footprint dataset written without .prj"
            ),
        }

        if write_code_page {
            let cpg_path = path_for("cpg");
            fs::write(&cpg_path, CODE_PAGE).map_err(ShapefileError::io(&cpg_path))?;
            components.push(cpg_path);
        }

        let shp_path = path_for("shp");
        let shx_path = path_for("shx");
        let dbf_path = path_for("dbf");
        let mut shp = open(&shp_path)?;
        let mut shx = open(&shx_path)?;
        let mut dbf = open(&dbf_path)?;

        // Placeholders; finish() rewrites them once sizes are known
        let placeholder = [0u8; shp::HEADER_LEN];
        shp.write_all(&placeholder)
            .map_err(ShapefileError::io(&shp_path))?;
        shx.write_all(&placeholder)
            .map_err(ShapefileError::io(&shx_path))?;
        dbf.write_all(&dbf::encode_header(&fields, 0, Utc::now().date_naive()))
            .map_err(ShapefileError::io(&dbf_path))?;

        components.extend([shp_path, shx_path, dbf_path]);

        debug!(
            dataset = %name,
            dir = %dir.display(),
            fields = fields.len(),
            "Opened footprint dataset"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            shp,
            shx,
            dbf,
            fields,
            components,
            shp_len: shp::HEADER_LEN,
            record_count: 0,
            finished: false,
        })
    }

    /// Path of one component file.
    pub fn component_path(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, ext))
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Append one footprint.
    pub fn write_record(&mut self, record: &FootprintRecord) -> Result<(), ShapefileError> {
        let content = match &record.geometry {
            Some(envelope) => shp::encode_polygon(envelope),
            None => shp::encode_null(),
        };

        let offset = self.shp_len;
        let record_len = shp::RECORD_HEADER_LEN + content.len();
        if offset + record_len > MAX_FILE_LEN {
            return Err(ShapefileError::LimitExceeded(format!(
                "{} exceeds the maximum shapefile size",
                self.component_path("shp").display()
            )));
        }
        let number = self.record_count + 1;

        let shp_header = shp::encode_record_header(number as i32, content.len());
        self.shp
            .write_all(&shp_header)
            .and_then(|_| self.shp.write_all(&content))
            .map_err(ShapefileError::io(self.component_path("shp")))?;

        self.shx
            .write_all(&shp::encode_index_entry(offset, content.len()))
            .map_err(ShapefileError::io(self.component_path("shx")))?;

        let time = record.time.map(|t| t.date_naive());
        let values: Vec<Value<'_>> = self
            .fields
            .iter()
            .map(|field| match field.kind {
                dbf::FieldKind::Character => Value::Text(&record.location),
                dbf::FieldKind::Date => Value::Date(time),
            })
            .collect();
        self.dbf
            .write_all(&dbf::encode_record(&self.fields, &values))
            .map_err(ShapefileError::io(self.component_path("dbf")))?;

        self.shp_len += record_len;
        self.record_count = number;
        Ok(())
    }

    /// Rewrite headers with final sizes and flush every component.
    pub fn finish(mut self, bbox: &Envelope) -> Result<DatasetSummary, ShapefileError> {
        let shape_type = ShapeType::Polygon;
        let shx_len = shp::HEADER_LEN + self.record_count as usize * shp::INDEX_ENTRY_LEN;

        let shp_path = self.component_path("shp");
        rewrite_header(
            &mut self.shp,
            &shp::encode_header(shape_type, self.shp_len, bbox),
        )
        .map_err(ShapefileError::io(&shp_path))?;

        let shx_path = self.component_path("shx");
        rewrite_header(&mut self.shx, &shp::encode_header(shape_type, shx_len, bbox))
            .map_err(ShapefileError::io(&shx_path))?;

        let dbf_path = self.component_path("dbf");
        let dbf_header =
            dbf::encode_header(&self.fields, self.record_count, Utc::now().date_naive());
        self.dbf
            .seek(SeekFrom::End(0))
            .and_then(|_| self.dbf.write_all(&[dbf::END_OF_FILE]))
            .and_then(|_| rewrite_header(&mut self.dbf, &dbf_header))
            .map_err(ShapefileError::io(&dbf_path))?;

        self.finished = true;
        debug!(
            dataset = %self.name,
            records = self.record_count,
            "Finished footprint dataset"
        );

        Ok(DatasetSummary {
            shp_path,
            components: self.components.clone(),
            record_count: self.record_count,
            bbox: *bbox,
        })
    }
}

impl Drop for FootprintWriter {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                dataset = %self.name,
                records = self.record_count,
                "Footprint writer released before finishing, dataset is incomplete"
            );
        }
    }
}

fn open(path: &Path) -> Result<BufWriter<File>, ShapefileError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(ShapefileError::io(path))
}

fn rewrite_header(file: &mut BufWriter<File>, header: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(header)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Crs;
    use crate::mosaic::TimeMode;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(location: &str, geometry: Option<Envelope>) -> FootprintRecord {
        FootprintRecord {
            geometry,
            location: location.to_string(),
            time: None,
        }
    }

    #[test]
    fn test_writes_all_components() {
        let temp = TempDir::new().unwrap();
        let schema = FootprintSchema::new("m", Crs::epsg(4326), TimeMode::None);

        let mut writer = FootprintWriter::create(temp.path(), &schema, true).unwrap();
        writer
            .write_record(&record("a.tif", Some(Envelope::new(0.0, 0.0, 1.0, 1.0))))
            .unwrap();
        writer.write_record(&record("b.tif", None)).unwrap();
        assert_eq!(writer.record_count(), 2);
        let summary = writer.finish(&Envelope::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        assert_eq!(summary.record_count, 2);
        for ext in ["shp", "shx", "dbf", "prj", "cpg"] {
            assert!(temp.path().join(format!("m.{}", ext)).is_file(), "missing .{}", ext);
        }

        // 100 header + (8 + 128) polygon + (8 + 4) null
        let shp_bytes = fs::read(temp.path().join("m.shp")).unwrap();
        assert_eq!(shp_bytes.len(), 248);
        let header = shp::decode_header(&shp_bytes).unwrap();
        assert_eq!(header.file_len, 248);

        let shx_bytes = fs::read(temp.path().join("m.shx")).unwrap();
        assert_eq!(shx_bytes.len(), 116);

        let dbf_bytes = fs::read(temp.path().join("m.dbf")).unwrap();
        assert_eq!(*dbf_bytes.last().unwrap(), dbf::END_OF_FILE);
        assert_eq!(
            u32::from_le_bytes([dbf_bytes[4], dbf_bytes[5], dbf_bytes[6], dbf_bytes[7]]),
            2
        );

        assert_eq!(
            fs::read_to_string(temp.path().join("m.cpg")).unwrap(),
            CODE_PAGE
        );
    }

    #[test]
    fn test_code_page_is_optional() {
        let temp = TempDir::new().unwrap();
        let schema = FootprintSchema::new("m", Crs::epsg(4326), TimeMode::None);
        let writer = FootprintWriter::create(temp.path(), &schema, false).unwrap();
        writer.finish(&Envelope::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(!temp.path().join("m.cpg").exists());
    }

    #[test]
    fn test_no_prj_for_unknown_crs() {
        let temp = TempDir::new().unwrap();
        let schema = FootprintSchema::new("m", Crs::new("LOCAL:1"), TimeMode::None);
        let writer = FootprintWriter::create(temp.path(), &schema, true).unwrap();
        let summary = writer.finish(&Envelope::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(!temp.path().join("m.prj").exists());
        assert!(!summary.components.iter().any(|p| p.ends_with("m.prj")));
    }

    #[test]
    fn test_time_column_written() {
        let temp = TempDir::new().unwrap();
        let schema = FootprintSchema::new("m", Crs::epsg(4326), TimeMode::Timestamp);
        let mut writer = FootprintWriter::create(temp.path(), &schema, true).unwrap();
        let mut rec = record("a.tif", Some(Envelope::new(0.0, 0.0, 1.0, 1.0)));
        rec.time = Some(Utc.with_ymd_and_hms(2021, 7, 4, 15, 30, 0).unwrap());
        writer.write_record(&rec).unwrap();
        writer.finish(&Envelope::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        let table = dbf::decode(&fs::read(temp.path().join("m.dbf")).unwrap()).unwrap();
        assert_eq!(table.fields.len(), 2);
        assert_eq!(table.rows[0], vec!["a.tif".to_string(), "20210704".to_string()]);
    }

    #[test]
    fn test_dropped_writer_releases_files() {
        let temp = TempDir::new().unwrap();
        let schema = FootprintSchema::new("m", Crs::epsg(4326), TimeMode::None);
        {
            let mut writer = FootprintWriter::create(temp.path(), &schema, true).unwrap();
            writer.write_record(&record("a.tif", None)).unwrap();
        }
        // Handles are closed: the files can be removed and recreated
        fs::remove_file(temp.path().join("m.shp")).unwrap();
        assert!(FootprintWriter::create(temp.path(), &schema, true).is_ok());
    }
}
