/*
This code is part of the shape2svg vector rendering tool.
Created: 17/05/2024
Last Modified: 11/02/2025
License: MIT

Notes: The logic behind reading the ESRI Shapefile polygon format. The
format uses mixed endianness, so every chunk is described field-by-field
with an explicit byte order (see utils::ChunkFormat).
*/
pub mod geometry;

pub use self::geometry::{PolygonGeometry, PolygonHeader, POLYGON_HEADER_LEN};
use crate::utils::{ChunkFormat, Endianness, FieldKind, FieldSpec};
use std::fmt;
use std::io::{Error, ErrorKind, Read};

/// The file code at byte 0 of every shapefile.
pub const SHAPEFILE_MAGIC: u32 = 0x0000270a;
/// The only version the format has ever had.
pub const SHAPEFILE_VERSION: u32 = 1000;
/// Shape type code for the closed-polygon geometry kind, the only kind
/// this tool handles.
pub const POLYGON_SHAPE_TYPE: u32 = 5;

pub const FILE_HEADER_LEN: usize = 100;
pub const RECORD_HEADER_LEN: usize = 12;

fn u32_be(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::U32, Endianness::BigEndian)
}

fn u32_le(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::U32, Endianness::LittleEndian)
}

fn f64_le(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::F64, Endianness::LittleEndian)
}

/// Layout of the 100-byte file header.
pub fn file_header_format() -> ChunkFormat {
    ChunkFormat::new(
        FILE_HEADER_LEN,
        vec![
            u32_be("file_code"),
            u32_be("unused1"),
            u32_be("unused2"),
            u32_be("unused3"),
            u32_be("unused4"),
            u32_be("unused5"),
            u32_be("file_length"),
            u32_le("version"),
            u32_le("shape_type"),
            f64_le("x_min"),
            f64_le("y_min"),
            f64_le("x_max"),
            f64_le("y_max"),
            f64_le("z_min"),
            f64_le("z_max"),
            f64_le("m_min"),
            f64_le("m_max"),
        ],
    )
}

/// Layout of the 12-byte header that precedes every record.
pub fn record_header_format() -> ChunkFormat {
    ChunkFormat::new(
        RECORD_HEADER_LEN,
        vec![
            u32_be("record_num"),
            u32_be("length_words"),
            u32_le("shape_type"),
        ],
    )
}

// 100 bytes in size
#[derive(Debug, Default, Clone)]
pub struct ShapefileHeader {
    pub file_code: u32,   // BigEndian; value is 9994
    pub file_length: u32, // BigEndian; in 16-bit words
    pub version: u32,     // LittleEndian
    pub shape_type: u32,  // LittleEndian
    pub x_min: f64,       // LittleEndian
    pub y_min: f64,       // LittleEndian
    pub x_max: f64,       // LittleEndian
    pub y_max: f64,       // LittleEndian
    pub z_min: f64,       // LittleEndian; 0f64 unless shape type is z or measured
    pub z_max: f64,       // LittleEndian
    pub m_min: f64,       // LittleEndian
    pub m_max: f64,       // LittleEndian
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = format!(
            "file_code: {}
file_length: {}
version: {}
shape_type: {}
x_min: {}
x_max: {}
y_min: {}
y_max: {}",
            self.file_code,
            self.file_length,
            self.version,
            self.shape_type,
            self.x_min,
            self.x_max,
            self.y_min,
            self.y_max
        );
        write!(f, "{}", s)
    }
}

/// Reads and validates the 100-byte header at the front of the stream.
/// Every violation is fatal and stops the run before any record is read.
/// The global bounding box in the returned header is for diagnostics
/// only; visibility decisions use the configured viewport instead.
pub fn read_header<R: Read>(reader: &mut R) -> Result<ShapefileHeader, Error> {
    let mut buf = [0u8; FILE_HEADER_LEN];
    let n = read_fully(reader, &mut buf)?;
    if n < FILE_HEADER_LEN {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!(
                "File too short to hold a {}-byte shapefile header ({} bytes found)",
                FILE_HEADER_LEN, n
            ),
        ));
    }
    let values = file_header_format().decode(&buf)?;
    let header = ShapefileHeader {
        file_code: values[0].as_u32(),
        file_length: values[6].as_u32(),
        version: values[7].as_u32(),
        shape_type: values[8].as_u32(),
        x_min: values[9].as_f64(),
        y_min: values[10].as_f64(),
        x_max: values[11].as_f64(),
        y_max: values[12].as_f64(),
        z_min: values[13].as_f64(),
        z_max: values[14].as_f64(),
        m_min: values[15].as_f64(),
        m_max: values[16].as_f64(),
    };

    if header.file_code != SHAPEFILE_MAGIC {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "Bad magic number 0x{:08x} at byte 0; a shapefile starts with 0x{:08x}",
                header.file_code, SHAPEFILE_MAGIC
            ),
        ));
    }
    for i in 1..=5 {
        let v = values[i].as_u32();
        if v != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Reserved header field {} at byte {} is {}; it must be 0",
                    i,
                    i * 4,
                    v
                ),
            ));
        }
    }
    if header.version != SHAPEFILE_VERSION {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "Unsupported shapefile version {}; only version {} exists",
                header.version, SHAPEFILE_VERSION
            ),
        ));
    }
    if header.shape_type != POLYGON_SHAPE_TYPE {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "File declares shape type {}; only polygons ({}) are handled",
                header.shape_type, POLYGON_SHAPE_TYPE
            ),
        ));
    }
    if header.z_min != 0.0 || header.z_max != 0.0 || header.m_min != 0.0 || header.m_max != 0.0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "The z/m ranges must be zero for plain polygon files",
        ));
    }

    Ok(header)
}

// 12 bytes in size
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    pub record_num: u32,   // BigEndian; 1-based, strictly sequential
    pub length_words: u32, // BigEndian; record content length in 16-bit words
    pub shape_type: u32,   // LittleEndian
}

impl RecordHeader {
    /// Body length in bytes. The declared word count covers the record
    /// content including its leading shape-type field; the walker reads
    /// that field as part of the header, so one word pair (4 bytes) is
    /// subtracted here.
    pub fn body_len_bytes(&self) -> usize {
        self.length_words as usize * 2 - 4
    }
}

/// A forward-only cursor over the record stream. Record boundaries are
/// computed from each record's declared length rather than delimited in
/// the stream, so records must be consumed strictly in order; there is
/// no seeking and no re-reading, and any violation leaves the cursor
/// unusable.
pub struct RecordWalker<R: Read> {
    reader: R,
    format: ChunkFormat,
    last_record_num: u32,
    pos: usize,
}

impl<R: Read> RecordWalker<R> {
    /// Creates a walker over `reader`, which must be positioned at the
    /// first record, i.e. immediately after the 100-byte file header.
    pub fn new(reader: R) -> RecordWalker<R> {
        RecordWalker {
            reader: reader,
            format: record_header_format(),
            last_record_num: 0,
            pos: FILE_HEADER_LEN,
        }
    }

    /// The byte offset of the cursor from the start of the file.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the next (header, body) pair, or `None` at a clean end of
    /// stream. The stream may only end exactly at a record boundary;
    /// every other short read is treated as truncation.
    pub fn next_record(&mut self) -> Result<Option<(RecordHeader, Vec<u8>)>, Error> {
        let mut header_bytes = [0u8; RECORD_HEADER_LEN];
        let n = read_fully(&mut self.reader, &mut header_bytes)?;
        if n == 0 {
            return Ok(None);
        }
        if n < RECORD_HEADER_LEN {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "Truncated record header at byte {}: {} of {} bytes found",
                    self.pos, n, RECORD_HEADER_LEN
                ),
            ));
        }
        let values = self.format.decode(&header_bytes)?;
        let header = RecordHeader {
            record_num: values[0].as_u32(),
            length_words: values[1].as_u32(),
            shape_type: values[2].as_u32(),
        };

        if header.record_num != self.last_record_num + 1 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Record numbers must increase sequentially from 1; expected #{}, found #{} at byte {}",
                    self.last_record_num + 1,
                    header.record_num,
                    self.pos
                ),
            ));
        }
        self.last_record_num = header.record_num;
        self.pos += RECORD_HEADER_LEN;

        if header.length_words < 2 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Record #{} declares {} words of content; at least 2 are needed for the shape type",
                    header.record_num, header.length_words
                ),
            ));
        }

        let body_len = header.body_len_bytes();
        let mut body = vec![0u8; body_len];
        let n = read_fully(&mut self.reader, &mut body)?;
        if n < body_len {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "Truncated body for record #{} at byte {}: {} of {} bytes found",
                    header.record_num, self.pos, n, body_len
                ),
            ));
        }
        self.pos += body_len;

        if header.shape_type != POLYGON_SHAPE_TYPE {
            return Err(Error::new(
                ErrorKind::Unsupported,
                format!(
                    "Record #{} has shape type {}; only polygons ({}) are handled",
                    header.record_num, header.shape_type, POLYGON_SHAPE_TYPE
                ),
            ));
        }

        Ok(Some((header, body)))
    }
}

// Reads until `buf` is full or the stream ends; the count returned is
// only short at end of stream.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, Error> {
    let mut total = 0usize;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}


#[cfg(test)]
mod test {
    use super::testdata::*;
    use super::*;
    use crate::structures::BoundingBox;
    use std::io::Cursor;

    fn unit_bbox() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 1.0, 1.0)
    }

    fn triangle() -> [(f64, f64); 3] {
        [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
    }

    #[test]
    fn test_read_header_accepts_valid_file() {
        let buf = one_square_file();
        let mut cursor = Cursor::new(buf);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.file_code, SHAPEFILE_MAGIC);
        assert_eq!(header.version, SHAPEFILE_VERSION);
        assert_eq!(header.shape_type, POLYGON_SHAPE_TYPE);
        assert_eq!(header.x_min, 2.0);
        assert_eq!(header.y_max, 8.0);
        // the header is exactly consumed; the record stream starts here
        assert_eq!(cursor.position() as usize, FILE_HEADER_LEN);
    }

    #[test]
    fn test_read_header_rejects_bad_magic() {
        let mut buf = encode_file_header(POLYGON_SHAPE_TYPE, 50, unit_bbox());
        buf[3] = 0x0b;
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_read_header_rejects_nonzero_reserved_field() {
        let mut buf = encode_file_header(POLYGON_SHAPE_TYPE, 50, unit_bbox());
        buf[11] = 1; // last byte of the second reserved word
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("Reserved"));
    }

    #[test]
    fn test_read_header_rejects_polyline_file() {
        // shape type 3 is polyline; the header validator must fail before
        // any record is read
        let buf = encode_file_header(3, 50, unit_bbox());
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("shape type 3"));
    }

    #[test]
    fn test_read_header_rejects_nonzero_z_range() {
        let mut buf = encode_file_header(POLYGON_SHAPE_TYPE, 50, unit_bbox());
        buf[68..76].copy_from_slice(&1.0f64.to_le_bytes()); // z_min
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_header_rejects_short_file() {
        let buf = vec![0u8; 40];
        let err = read_header(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_walker_yields_records_in_order() {
        let mut buf = encode_record(1, POLYGON_SHAPE_TYPE, unit_bbox(), &[0], &triangle());
        buf.extend(encode_record(
            2,
            POLYGON_SHAPE_TYPE,
            unit_bbox(),
            &[0],
            &triangle(),
        ));
        let mut walker = RecordWalker::new(Cursor::new(buf));

        let (header, body) = walker.next_record().unwrap().unwrap();
        assert_eq!(header.record_num, 1);
        assert_eq!(header.shape_type, POLYGON_SHAPE_TYPE);
        assert_eq!(body.len(), header.body_len_bytes());
        assert_eq!(body.len(), POLYGON_HEADER_LEN + 4 + 16 * 3);

        let (header, _body) = walker.next_record().unwrap().unwrap();
        assert_eq!(header.record_num, 2);

        // clean end of stream at the record boundary
        assert!(walker.next_record().unwrap().is_none());
        assert!(walker.next_record().unwrap().is_none());
    }

    #[test]
    fn test_walker_tracks_byte_position() {
        let record = encode_record(1, POLYGON_SHAPE_TYPE, unit_bbox(), &[0], &triangle());
        let record_len = record.len();
        let mut walker = RecordWalker::new(Cursor::new(record));
        assert_eq!(walker.pos(), FILE_HEADER_LEN);
        walker.next_record().unwrap();
        assert_eq!(walker.pos(), FILE_HEADER_LEN + record_len);
    }

    #[test]
    fn test_walker_rejects_skipped_record_number() {
        // records numbered 1, 2, 4: the walk must fail before record 4's
        // body is handed out
        let mut buf = encode_record(1, POLYGON_SHAPE_TYPE, unit_bbox(), &[0], &triangle());
        buf.extend(encode_record(
            2,
            POLYGON_SHAPE_TYPE,
            unit_bbox(),
            &[0],
            &triangle(),
        ));
        buf.extend(encode_record(
            4,
            POLYGON_SHAPE_TYPE,
            unit_bbox(),
            &[0],
            &triangle(),
        ));
        let mut walker = RecordWalker::new(Cursor::new(buf));
        walker.next_record().unwrap();
        walker.next_record().unwrap();
        let err = walker.next_record().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("expected #3, found #4"));
    }

    #[test]
    fn test_walker_rejects_non_polygon_record() {
        // a single multipoint (8) record
        let buf = encode_record(1, 8, unit_bbox(), &[0], &triangle());
        let mut walker = RecordWalker::new(Cursor::new(buf));
        let err = walker.next_record().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_walker_rejects_truncated_header() {
        let record = encode_record(1, POLYGON_SHAPE_TYPE, unit_bbox(), &[0], &triangle());
        let buf = record[..7].to_vec();
        let mut walker = RecordWalker::new(Cursor::new(buf));
        let err = walker.next_record().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_walker_rejects_truncated_body() {
        let record = encode_record(1, POLYGON_SHAPE_TYPE, unit_bbox(), &[0], &triangle());
        let buf = record[..record.len() - 5].to_vec();
        let mut walker = RecordWalker::new(Cursor::new(buf));
        let err = walker.next_record().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("record #1"));
    }

    #[test]
    fn test_walker_rejects_undersized_word_count() {
        // length_words = 1 would make the body length computation go
        // negative
        let mut buf = record_header_format()
            .encode(&[
                crate::utils::FieldValue::U32(1),
                crate::utils::FieldValue::U32(1),
                crate::utils::FieldValue::U32(POLYGON_SHAPE_TYPE),
            ])
            .unwrap();
        buf.extend_from_slice(&[0u8; 8]);
        let mut walker = RecordWalker::new(Cursor::new(buf));
        let err = walker.next_record().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
