//! Reading footprint datasets back from disk.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use super::dbf::{self, FieldKind};
use super::shp::{self, RECORD_HEADER_LEN};
use super::ShapefileError;
use crate::geo::Envelope;

/// One record as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Bounding box of the stored polygon; `None` for null shapes.
    pub geometry: Option<Envelope>,
    /// Value of the first text attribute.
    pub location: String,
    /// Value of the first date attribute, when the table has one.
    pub time: Option<NaiveDate>,
}

/// A footprint dataset as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDataset {
    /// Bounding box from the `.shp` header.
    pub bbox: Envelope,
    /// Shape type code from the `.shp` header.
    pub shape_type: i32,
    /// Attribute column names in table order.
    pub attribute_names: Vec<String>,
    /// Contents of the `.prj` component, if present.
    pub projection: Option<String>,
    /// Records in file order.
    pub records: Vec<StoredRecord>,
}

impl StoredDataset {
    /// Whether the attribute table has a column with this name.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Read the dataset named `name` from `dir`.
///
/// Geometry and attribute records are paired by position; a count mismatch
/// between `.shp` and `.dbf` is an error.
pub fn read_dataset(dir: &Path, name: &str) -> Result<StoredDataset, ShapefileError> {
    let path_for = |ext: &str| dir.join(format!("{}.{}", name, ext));

    let shp_path = path_for("shp");
    let shp_bytes = read(&shp_path)?;
    let header =
        shp::decode_header(&shp_bytes).map_err(|reason| ShapefileError::invalid(&shp_path, reason))?;
    let geometries = read_geometries(&shp_path, &shp_bytes)?;

    let dbf_path = path_for("dbf");
    let table =
        dbf::decode(&read(&dbf_path)?).map_err(|reason| ShapefileError::invalid(&dbf_path, reason))?;

    if table.rows.len() != geometries.len() {
        return Err(ShapefileError::invalid(
            &dbf_path,
            format!(
                "{} attribute rows for {} shapes",
                table.rows.len(),
                geometries.len()
            ),
        ));
    }

    let text_column = table.fields.iter().position(|f| f.kind == FieldKind::Character);
    let date_column = table.fields.iter().position(|f| f.kind == FieldKind::Date);

    let records = geometries
        .into_iter()
        .zip(&table.rows)
        .map(|(geometry, row)| StoredRecord {
            geometry,
            location: text_column.map(|i| row[i].clone()).unwrap_or_default(),
            time: date_column.and_then(|i| dbf::parse_date(&row[i])),
        })
        .collect();

    let prj_path = path_for("prj");
    let projection = if prj_path.is_file() {
        Some(String::from_utf8_lossy(&read(&prj_path)?).into_owned())
    } else {
        None
    };

    Ok(StoredDataset {
        bbox: header.bbox,
        shape_type: header.shape_type,
        attribute_names: table.fields.into_iter().map(|f| f.name).collect(),
        projection,
        records,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, ShapefileError> {
    fs::read(path).map_err(ShapefileError::io(path))
}

fn read_geometries(path: &Path, bytes: &[u8]) -> Result<Vec<Option<Envelope>>, ShapefileError> {
    let mut geometries = Vec::new();
    let mut at = shp::HEADER_LEN;

    while at + RECORD_HEADER_LEN <= bytes.len() {
        let content_len = shp::read_i32_be(bytes, at + 4).max(0) as usize * 2;
        let start = at + RECORD_HEADER_LEN;
        let end = start + content_len;
        if end > bytes.len() {
            return Err(ShapefileError::invalid(
                path,
                format!("record {} is truncated", geometries.len() + 1),
            ));
        }

        let geometry = shp::decode_record(&bytes[start..end])
            .map_err(|reason| ShapefileError::invalid(path, reason))?;
        geometries.push(geometry);
        at = end;
    }

    Ok(geometries)
}
