//! dBase III attribute tables (`.dbf`).
//!
//! Layout:
//!
//! ```text
//! 32-byte header | 32 bytes per field descriptor | 0x0D | records | 0x1A
//! ```
//!
//! Each record starts with a deletion flag (`' '` = live) followed by the
//! fixed-width field values. Character fields are space-padded on the right;
//! date fields are `YYYYMMDD` or blank.

use chrono::{Datelike, NaiveDate};

/// dBase III without memo.
pub const VERSION: u8 = 0x03;

/// Size of the table header in bytes.
pub const HEADER_LEN: usize = 32;

/// Size of one field descriptor in bytes.
pub const FIELD_DESCRIPTOR_LEN: usize = 32;

/// Terminates the field descriptor array.
pub const HEADER_TERMINATOR: u8 = 0x0D;

/// Marks the end of the file.
pub const END_OF_FILE: u8 = 0x1A;

/// Deletion flag of a live record.
pub const LIVE_RECORD: u8 = b' ';

/// Maximum field name length.
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Width of date fields.
pub const DATE_WIDTH: u8 = 8;

/// Width used for text fields.
pub const TEXT_WIDTH: u8 = 254;

/// dBase field types used by footprint tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `C`: fixed-width text.
    Character,
    /// `D`: `YYYYMMDD`.
    Date,
}

impl FieldKind {
    fn code(self) -> u8 {
        match self {
            FieldKind::Character => b'C',
            FieldKind::Date => b'D',
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            b'C' => Some(FieldKind::Character),
            b'D' => Some(FieldKind::Date),
            _ => None,
        }
    }
}

/// One column of the attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub width: u8,
}

impl Field {
    /// A text column of [`TEXT_WIDTH`] bytes.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Character,
            width: TEXT_WIDTH,
        }
    }

    /// A date column.
    pub fn date(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Date,
            width: DATE_WIDTH,
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Text(&'a str),
    Date(Option<NaiveDate>),
}

/// Length of one record in bytes, deletion flag included.
pub fn record_len(fields: &[Field]) -> usize {
    1 + fields.iter().map(|f| usize::from(f.width)).sum::<usize>()
}

/// Length of the header in bytes, terminator included.
pub fn header_len(fields: &[Field]) -> usize {
    HEADER_LEN + fields.len() * FIELD_DESCRIPTOR_LEN + 1
}

/// Encode the table header and field descriptors.
pub fn encode_header(fields: &[Field], record_count: u32, updated: NaiveDate) -> Vec<u8> {
    let mut out = Vec::with_capacity(header_len(fields));

    out.push(VERSION);
    out.push((updated.year() - 1900).clamp(0, 255) as u8);
    out.push(updated.month() as u8);
    out.push(updated.day() as u8);
    out.extend_from_slice(&record_count.to_le_bytes());
    out.extend_from_slice(&(header_len(fields) as u16).to_le_bytes());
    out.extend_from_slice(&(record_len(fields) as u16).to_le_bytes());
    out.resize(HEADER_LEN, 0);

    for field in fields {
        let mut descriptor = [0u8; FIELD_DESCRIPTOR_LEN];
        let name = field.name.as_bytes();
        let name_len = name.len().min(MAX_FIELD_NAME_LEN);
        descriptor[..name_len].copy_from_slice(&name[..name_len]);
        descriptor[11] = field.kind.code();
        descriptor[16] = field.width;
        out.extend_from_slice(&descriptor);
    }

    out.push(HEADER_TERMINATOR);
    out
}

/// Encode one record. `values` must line up with `fields`.
pub fn encode_record(fields: &[Field], values: &[Value<'_>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(record_len(fields));
    out.push(LIVE_RECORD);

    for (field, value) in fields.iter().zip(values) {
        let width = usize::from(field.width);
        let start = out.len();
        match value {
            Value::Text(text) => {
                out.extend_from_slice(truncate_utf8(text, width).as_bytes());
            }
            Value::Date(Some(date)) => {
                out.extend_from_slice(date.format("%Y%m%d").to_string().as_bytes());
            }
            Value::Date(None) => {}
        }
        out.resize(start + width, b' ');
    }

    // Missing trailing values are blank
    out.resize(record_len(fields), b' ');
    out
}

/// Decoded table: fields plus one text row per live record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub fields: Vec<Field>,
    pub rows: Vec<Vec<String>>,
}

/// Decode a whole `.dbf` file.
///
/// Cell values are returned trimmed; callers interpret them per field kind.
pub fn decode(bytes: &[u8]) -> Result<Table, String> {
    if bytes.len() < HEADER_LEN {
        return Err("file shorter than the table header".to_string());
    }
    let record_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_len = usize::from(u16::from_le_bytes([bytes[8], bytes[9]]));
    let record_len = usize::from(u16::from_le_bytes([bytes[10], bytes[11]]));

    if bytes.len() < header_len || header_len < HEADER_LEN + 1 {
        return Err(format!("invalid header length {}", header_len));
    }

    let mut fields = Vec::new();
    let mut at = HEADER_LEN;
    while at + FIELD_DESCRIPTOR_LEN <= header_len && bytes[at] != HEADER_TERMINATOR {
        let descriptor = &bytes[at..at + FIELD_DESCRIPTOR_LEN];
        let name_end = descriptor[..11].iter().position(|b| *b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&descriptor[..name_end]).into_owned();
        let kind = FieldKind::from_code(descriptor[11])
            .ok_or_else(|| format!("unsupported field type '{}'", descriptor[11] as char))?;
        fields.push(Field {
            name,
            kind,
            width: descriptor[16],
        });
        at += FIELD_DESCRIPTOR_LEN;
    }

    let expected_len = self::record_len(&fields);
    if record_len != expected_len {
        return Err(format!(
            "record length {} does not match fields ({})",
            record_len, expected_len
        ));
    }

    let mut rows = Vec::with_capacity(record_count);
    for index in 0..record_count {
        let start = header_len + index * record_len;
        let end = start + record_len;
        if end > bytes.len() {
            return Err(format!("record {} is truncated", index + 1));
        }
        let record = &bytes[start..end];
        if record[0] != LIVE_RECORD {
            continue;
        }

        let mut offset = 1;
        let mut row = Vec::with_capacity(fields.len());
        for field in &fields {
            let width = usize::from(field.width);
            let cell = &record[offset..offset + width];
            row.push(String::from_utf8_lossy(cell).trim_end().to_string());
            offset += width;
        }
        rows.push(row);
    }

    Ok(Table { fields, rows })
}

/// Parse a date cell; blank cells are `None`.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(cell, "%Y%m%d").ok()
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a
/// character.
fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
