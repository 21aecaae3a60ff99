/*
This code is part of the shape2svg vector rendering tool.
Created: 17/05/2024
Last Modified: 11/02/2025
License: MIT
*/
use crate::structures::{BoundingBox, Point2D};
use crate::utils::{ChunkFormat, Endianness, FieldKind, FieldSpec};
use byteorder::{ByteOrder, LittleEndian};
use std::io::{Error, ErrorKind};

pub const POLYGON_HEADER_LEN: usize = 40;

/// Layout of the 40-byte sub-header at the front of a polygon record
/// body. All little-endian.
pub fn polygon_header_format() -> ChunkFormat {
    ChunkFormat::new(
        POLYGON_HEADER_LEN,
        vec![
            FieldSpec::new("x_min", FieldKind::F64, Endianness::LittleEndian),
            FieldSpec::new("y_min", FieldKind::F64, Endianness::LittleEndian),
            FieldSpec::new("x_max", FieldKind::F64, Endianness::LittleEndian),
            FieldSpec::new("y_max", FieldKind::F64, Endianness::LittleEndian),
            FieldSpec::new("num_parts", FieldKind::U32, Endianness::LittleEndian),
            FieldSpec::new("num_points", FieldKind::U32, Endianness::LittleEndian),
        ],
    )
}

/// The cheap-to-decode front of a polygon record: its bounding box and
/// the part/point counts. Decoding stops here for records that fail the
/// viewport visibility test, so the (possibly very large) point array is
/// never touched for them.
#[derive(Debug, Clone, Copy)]
pub struct PolygonHeader {
    pub bbox: BoundingBox,
    pub num_parts: usize,
    pub num_points: usize,
}

impl PolygonHeader {
    pub fn decode(body: &[u8]) -> Result<PolygonHeader, Error> {
        if body.len() < POLYGON_HEADER_LEN {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Record body holds {} bytes; the polygon header needs {}",
                    body.len(),
                    POLYGON_HEADER_LEN
                ),
            ));
        }
        let values = polygon_header_format().decode(&body[..POLYGON_HEADER_LEN])?;
        Ok(PolygonHeader {
            bbox: BoundingBox::new(
                values[0].as_f64(),
                values[1].as_f64(),
                values[2].as_f64(),
                values[3].as_f64(),
            ),
            num_parts: values[4].as_u32() as usize,
            num_points: values[5].as_u32() as usize,
        })
    }
}

/// A decoded polygon record: a flat point array partitioned into rings
/// by part offsets. A sentinel offset equal to the point count is
/// appended, so ring i spans `parts[i]..parts[i + 1]`.
#[derive(Debug, Clone)]
pub struct PolygonGeometry {
    pub bbox: BoundingBox,
    parts: Vec<usize>,
    points: Vec<Point2D>,
}

impl PolygonGeometry {
    /// Decodes the parts and points arrays that follow the polygon
    /// header, and validates that the ring offsets partition the point
    /// array exactly. Pure transformation, but heavy for records with
    /// large point counts; only call it for records that survived the
    /// visibility test.
    pub fn decode(header: &PolygonHeader, body: &[u8]) -> Result<PolygonGeometry, Error> {
        let expected = POLYGON_HEADER_LEN + 4 * header.num_parts + 16 * header.num_points;
        if body.len() != expected {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "A polygon with {} parts and {} points needs a {}-byte body; found {} bytes",
                    header.num_parts,
                    header.num_points,
                    expected,
                    body.len()
                ),
            ));
        }

        let mut parts: Vec<usize> = Vec::with_capacity(header.num_parts + 1);
        let mut pos = POLYGON_HEADER_LEN;
        for _ in 0..header.num_parts {
            parts.push(LittleEndian::read_u32(&body[pos..pos + 4]) as usize);
            pos += 4;
        }
        parts.push(header.num_points); // sentinel

        let mut points: Vec<Point2D> = Vec::with_capacity(header.num_points);
        for _ in 0..header.num_points {
            let x = LittleEndian::read_f64(&body[pos..pos + 8]);
            let y = LittleEndian::read_f64(&body[pos + 8..pos + 16]);
            points.push(Point2D::new(x, y));
            pos += 16;
        }

        // the rings must partition the point array with no gaps or
        // overlaps: offsets strictly increasing from 0 to num_points
        if parts[0] != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("The first ring must start at point 0, not {}", parts[0]),
            ));
        }
        for i in 0..parts.len() - 1 {
            if parts[i] >= parts[i + 1] {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Ring {} spans points {}..{}; ring offsets must be strictly increasing",
                        i,
                        parts[i],
                        parts[i + 1]
                    ),
                ));
            }
        }

        Ok(PolygonGeometry {
            bbox: header.bbox,
            parts: parts,
            points: points,
        })
    }

    pub fn num_rings(&self) -> usize {
        self.parts.len() - 1
    }

    /// Returns the points of the ring at `index`, in file order.
    pub fn ring(&self, index: usize) -> &[Point2D] {
        if index >= self.num_rings() {
            panic!("Ring index out of bounds");
        }
        &self.points[self.parts[index]..self.parts[index + 1]]
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }
}
