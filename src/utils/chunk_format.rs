/*
This code is part of the shape2svg vector rendering tool.
Created: 14/05/2024
Last Modified: 09/02/2025
License: MIT
*/
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Error, ErrorKind};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

/// The primitive numeric types that occur in the shapefile format.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FieldKind {
    U32,
    F64,
}

impl FieldKind {
    pub fn len_bytes(&self) -> usize {
        match self {
            FieldKind::U32 => 4,
            FieldKind::F64 => 8,
        }
    }
}

/// One named field within a fixed-length chunk, with its own byte order.
#[derive(Debug, Copy, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub byte_order: Endianness,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind, byte_order: Endianness) -> FieldSpec {
        FieldSpec {
            name: name,
            kind: kind,
            byte_order: byte_order,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FieldValue {
    U32(u32),
    F64(f64),
}

impl FieldValue {
    pub fn as_u32(&self) -> u32 {
        match self {
            FieldValue::U32(v) => *v,
            FieldValue::F64(_) => panic!("Field holds an f64, not a u32"),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::F64(v) => *v,
            FieldValue::U32(_) => panic!("Field holds a u32, not an f64"),
        }
    }
}

/// The declared layout of a fixed-length byte chunk: an ordered list of
/// named fields, each carrying its own byte order. The shapefile format
/// mixes big- and little-endian fields within single structures, so the
/// byte order has to be declared per field rather than per chunk.
#[derive(Debug, Clone)]
pub struct ChunkFormat {
    fields: Vec<FieldSpec>,
    len_bytes: usize,
}

impl ChunkFormat {
    /// Creates a new ChunkFormat. The declared chunk length must equal the
    /// summed widths of the fields; a mismatch is a mistake in the layout
    /// definition itself and fails here, before any input data is seen.
    pub fn new(len_bytes: usize, fields: Vec<FieldSpec>) -> ChunkFormat {
        let width: usize = fields.iter().map(|f| f.kind.len_bytes()).sum();
        assert!(
            width == len_bytes,
            "Chunk format declares {} bytes but its fields sum to {}",
            len_bytes,
            width
        );
        ChunkFormat {
            fields: fields,
            len_bytes: len_bytes,
        }
    }

    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Decodes a byte span into one value per declared field. The span
    /// length must match the layout exactly; partial chunks are not
    /// decoded.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<FieldValue>, Error> {
        if buf.len() != self.len_bytes {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Expected a {}-byte chunk, found {} bytes",
                    self.len_bytes,
                    buf.len()
                ),
            ));
        }
        let mut values = Vec::with_capacity(self.fields.len());
        let mut pos = 0usize;
        for field in &self.fields {
            let end = pos + field.kind.len_bytes();
            let value = match (field.kind, field.byte_order) {
                (FieldKind::U32, Endianness::BigEndian) => {
                    FieldValue::U32(BigEndian::read_u32(&buf[pos..end]))
                }
                (FieldKind::U32, Endianness::LittleEndian) => {
                    FieldValue::U32(LittleEndian::read_u32(&buf[pos..end]))
                }
                (FieldKind::F64, Endianness::BigEndian) => {
                    FieldValue::F64(BigEndian::read_f64(&buf[pos..end]))
                }
                (FieldKind::F64, Endianness::LittleEndian) => {
                    FieldValue::F64(LittleEndian::read_f64(&buf[pos..end]))
                }
            };
            values.push(value);
            pos = end;
        }
        Ok(values)
    }

    /// The mirror of `decode`: serializes one value per field back into
    /// bytes. Each value must match its field's declared kind.
    pub fn encode(&self, values: &[FieldValue]) -> Result<Vec<u8>, Error> {
        if values.len() != self.fields.len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Expected {} values for this chunk format, found {}",
                    self.fields.len(),
                    values.len()
                ),
            ));
        }
        let mut buf: Vec<u8> = Vec::with_capacity(self.len_bytes);
        for (field, value) in self.fields.iter().zip(values) {
            match (field.kind, value) {
                (FieldKind::U32, FieldValue::U32(v)) => {
                    if field.byte_order == Endianness::LittleEndian {
                        buf.write_u32::<LittleEndian>(*v)?;
                    } else {
                        buf.write_u32::<BigEndian>(*v)?;
                    }
                }
                (FieldKind::F64, FieldValue::F64(v)) => {
                    if field.byte_order == Endianness::LittleEndian {
                        buf.write_f64::<LittleEndian>(*v)?;
                    } else {
                        buf.write_f64::<BigEndian>(*v)?;
                    }
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        format!("Value for field '{}' has the wrong type", field.name),
                    ));
                }
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::{ChunkFormat, Endianness, FieldKind, FieldSpec, FieldValue};

    fn mixed_format() -> ChunkFormat {
        ChunkFormat::new(
            16,
            vec![
                FieldSpec::new("count", FieldKind::U32, Endianness::BigEndian),
                FieldSpec::new("flags", FieldKind::U32, Endianness::LittleEndian),
                FieldSpec::new("value", FieldKind::F64, Endianness::LittleEndian),
            ],
        )
    }

    #[test]
    fn test_decode_mixed_endianness() {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(&258u32.to_be_bytes());
        buf[4..8].copy_from_slice(&7u32.to_le_bytes());
        buf[8..16].copy_from_slice(&(-1.5f64).to_le_bytes());
        let values = mixed_format().decode(&buf).unwrap();
        assert_eq!(values[0].as_u32(), 258);
        assert_eq!(values[1].as_u32(), 7);
        assert_eq!(values[2].as_f64(), -1.5);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let format = mixed_format();
        let values = vec![
            FieldValue::U32(0x0000270a),
            FieldValue::U32(1000),
            FieldValue::F64(20037508.34),
        ];
        let buf = format.encode(&values).unwrap();
        assert_eq!(buf.len(), format.len_bytes());
        assert_eq!(format.decode(&buf).unwrap(), values);
    }

    #[test]
    fn test_decode_rejects_wrong_lengths() {
        let format = mixed_format();
        for len in [0usize, 8, 15, 17, 32] {
            let buf = vec![0u8; len];
            let err = format.decode(&buf).unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        }
    }

    #[test]
    fn test_encode_rejects_type_confusion() {
        let format = mixed_format();
        let values = vec![
            FieldValue::U32(1),
            FieldValue::F64(2.0),
            FieldValue::F64(3.0),
        ];
        assert!(format.encode(&values).is_err());
    }

    #[test]
    #[should_panic(expected = "fields sum to")]
    fn test_malformed_layout_fails_at_construction() {
        ChunkFormat::new(
            10,
            vec![FieldSpec::new("x", FieldKind::F64, Endianness::LittleEndian)],
        );
    }
}
