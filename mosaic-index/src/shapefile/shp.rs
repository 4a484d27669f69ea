//! Binary layout of `.shp` and `.shx` files.
//!
//! Both files start with the same 100-byte header. Integers in the header
//! preamble and in record headers are big-endian; everything else is
//! little-endian. Lengths are counted in 16-bit words.

use crate::geo::Envelope;

/// Magic number at offset 0.
pub const FILE_CODE: i32 = 9994;

/// Format version at offset 28.
pub const VERSION: i32 = 1000;

/// Size of the file header in bytes.
pub const HEADER_LEN: usize = 100;

/// Size of a record header (record number + content length) in bytes.
pub const RECORD_HEADER_LEN: usize = 8;

/// Size of one `.shx` index entry in bytes.
pub const INDEX_ENTRY_LEN: usize = 8;

/// Shape types used by footprint datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Polygon,
}

impl ShapeType {
    /// Numeric code stored in headers and records.
    pub fn code(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Polygon => 5,
        }
    }

    /// Decode a shape type code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ShapeType::Null),
            5 => Some(ShapeType::Polygon),
            _ => None,
        }
    }
}

/// Encode the 100-byte file header.
///
/// `file_len` is the total file length in bytes, header included.
pub fn encode_header(shape_type: ShapeType, file_len: usize, bbox: &Envelope) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&FILE_CODE.to_be_bytes());
    // Bytes 4..24 are unused
    header[24..28].copy_from_slice(&words(file_len).to_be_bytes());
    header[28..32].copy_from_slice(&VERSION.to_le_bytes());
    header[32..36].copy_from_slice(&shape_type.code().to_le_bytes());
    header[36..44].copy_from_slice(&bbox.min_x.to_le_bytes());
    header[44..52].copy_from_slice(&bbox.min_y.to_le_bytes());
    header[52..60].copy_from_slice(&bbox.max_x.to_le_bytes());
    header[60..68].copy_from_slice(&bbox.max_y.to_le_bytes());
    // Z and M ranges (68..100) stay zero for 2D shapes
    header
}

/// Decoded fields of a file header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub file_len: usize,
    pub shape_type: i32,
    pub bbox: Envelope,
}

/// Decode a file header, validating the magic number and version.
pub fn decode_header(bytes: &[u8]) -> Result<Header, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("header is {} bytes, expected {}", bytes.len(), HEADER_LEN));
    }
    let code = read_i32_be(bytes, 0);
    if code != FILE_CODE {
        return Err(format!("bad file code {}", code));
    }
    let version = read_i32_le(bytes, 28);
    if version != VERSION {
        return Err(format!("unsupported version {}", version));
    }

    Ok(Header {
        file_len: read_i32_be(bytes, 24).max(0) as usize * 2,
        shape_type: read_i32_le(bytes, 32),
        bbox: Envelope::new(
            read_f64_le(bytes, 36),
            read_f64_le(bytes, 44),
            read_f64_le(bytes, 52),
            read_f64_le(bytes, 60),
        ),
    })
}

/// Encode a record header. `number` is 1-based.
pub fn encode_record_header(number: i32, content_len: usize) -> [u8; RECORD_HEADER_LEN] {
    let mut header = [0u8; RECORD_HEADER_LEN];
    header[0..4].copy_from_slice(&number.to_be_bytes());
    header[4..8].copy_from_slice(&words(content_len).to_be_bytes());
    header
}

/// Encode a `.shx` entry pointing at a record header.
pub fn encode_index_entry(offset: usize, content_len: usize) -> [u8; INDEX_ENTRY_LEN] {
    let mut entry = [0u8; INDEX_ENTRY_LEN];
    entry[0..4].copy_from_slice(&words(offset).to_be_bytes());
    entry[4..8].copy_from_slice(&words(content_len).to_be_bytes());
    entry
}

/// Record content for a rectangular polygon footprint.
///
/// Layout: shape type, bbox, part count, point count, part offsets, points.
pub fn encode_polygon(envelope: &Envelope) -> Vec<u8> {
    let ring = envelope.ring();
    let mut content = Vec::with_capacity(4 + 32 + 4 + 4 + 4 + ring.len() * 16);

    content.extend_from_slice(&ShapeType::Polygon.code().to_le_bytes());
    content.extend_from_slice(&envelope.min_x.to_le_bytes());
    content.extend_from_slice(&envelope.min_y.to_le_bytes());
    content.extend_from_slice(&envelope.max_x.to_le_bytes());
    content.extend_from_slice(&envelope.max_y.to_le_bytes());
    content.extend_from_slice(&1i32.to_le_bytes());
    content.extend_from_slice(&(ring.len() as i32).to_le_bytes());
    content.extend_from_slice(&0i32.to_le_bytes());
    for (x, y) in ring {
        content.extend_from_slice(&x.to_le_bytes());
        content.extend_from_slice(&y.to_le_bytes());
    }
    content
}

/// Record content for a null shape.
pub fn encode_null() -> Vec<u8> {
    ShapeType::Null.code().to_le_bytes().to_vec()
}

/// Decode record content into its bounding box.
///
/// Null shapes decode to `None`; polygons to their bbox.
pub fn decode_record(content: &[u8]) -> Result<Option<Envelope>, String> {
    if content.len() < 4 {
        return Err("record content shorter than its shape type".to_string());
    }
    match ShapeType::from_code(read_i32_le(content, 0)) {
        Some(ShapeType::Null) => Ok(None),
        Some(ShapeType::Polygon) => {
            if content.len() < 36 {
                return Err("polygon record shorter than its bounding box".to_string());
            }
            Ok(Some(Envelope::new(
                read_f64_le(content, 4),
                read_f64_le(content, 12),
                read_f64_le(content, 20),
                read_f64_le(content, 28),
            )))
        }
        None => Err(format!("unsupported shape type {}", read_i32_le(content, 0))),
    }
}

fn words(bytes: usize) -> i32 {
    (bytes / 2) as i32
}

pub(crate) fn read_i32_be(bytes: &[u8], at: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    i32::from_be_bytes(buf)
}

pub(crate) fn read_i32_le(bytes: &[u8], at: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(buf)
}

fn read_f64_le(bytes: &[u8], at: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    f64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bbox = Envelope::new(0.0, 0.0, 2.0, 2.0);
        let header = encode_header(ShapeType::Polygon, 356, &bbox);

        assert_eq!(&header[0..4], &[0x00, 0x00, 0x27, 0x0A]);
        assert_eq!(read_i32_be(&header, 24), 178);
        assert_eq!(read_i32_le(&header, 28), 1000);
        assert_eq!(read_i32_le(&header, 32), 5);
        assert!(header[68..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_header_decodes() {
        let bbox = Envelope::new(-1.5, 2.0, 3.0, 4.25);
        let header = decode_header(&encode_header(ShapeType::Polygon, 228, &bbox)).unwrap();
        assert_eq!(header.file_len, 228);
        assert_eq!(header.shape_type, 5);
        assert_eq!(header.bbox, bbox);
    }

    #[test]
    fn test_decode_header_rejects_bad_magic() {
        let mut bytes = encode_header(ShapeType::Polygon, 100, &Envelope::new(0.0, 0.0, 1.0, 1.0));
        bytes[3] = 0;
        assert!(decode_header(&bytes).unwrap_err().contains("file code"));
        assert!(decode_header(&bytes[..50]).is_err());
    }

    #[test]
    fn test_polygon_content_is_128_bytes() {
        let content = encode_polygon(&Envelope::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(content.len(), 128);
        assert_eq!(read_i32_le(&content, 36), 1); // parts
        assert_eq!(read_i32_le(&content, 40), 5); // points
        assert_eq!(read_i32_le(&content, 44), 0); // first part offset
    }

    #[test]
    fn test_null_content() {
        let content = encode_null();
        assert_eq!(content, vec![0, 0, 0, 0]);
        assert_eq!(decode_record(&content).unwrap(), None);
    }

    #[test]
    fn test_polygon_decodes_to_bbox() {
        let env = Envelope::new(10.0, 20.0, 11.0, 21.0);
        assert_eq!(decode_record(&encode_polygon(&env)).unwrap(), Some(env));
    }

    #[test]
    fn test_decode_record_rejects_unknown_type() {
        let content = 3i32.to_le_bytes();
        assert!(decode_record(&content).unwrap_err().contains("unsupported"));
    }

    #[test]
    fn test_record_header_and_index_entry() {
        let header = encode_record_header(1, 128);
        assert_eq!(read_i32_be(&header, 0), 1);
        assert_eq!(read_i32_be(&header, 4), 64);

        let entry = encode_index_entry(100, 128);
        assert_eq!(read_i32_be(&entry, 0), 50);
        assert_eq!(read_i32_be(&entry, 4), 64);
    }
}
