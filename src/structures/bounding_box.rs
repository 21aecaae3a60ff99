/*
This code is part of the shape2svg vector rendering tool.
Created: 14/05/2024
Last Modified: 02/06/2024
License: MIT
*/

/// An axis-aligned rectangle in the source projected coordinate system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        let (x1, x2) = if min_x < max_x {
            (min_x, max_x)
        } else {
            (max_x, min_x)
        };
        let (y1, y2) = if min_y < max_y {
            (min_y, max_y)
        } else {
            (max_y, min_y)
        };
        BoundingBox {
            min_x: x1,
            min_y: y1,
            max_x: x2,
            max_y: y2,
        }
    }

    pub fn get_width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn get_height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Interval-overlap test on both axes, inclusive of touching edges.
    /// This is the record visibility check: overlap of bounding boxes is
    /// a conservative superset of true geometric intersection, so it may
    /// pass records whose geometry misses the viewport, but it never
    /// culls one that intersects it.
    pub fn overlaps(&self, other: BoundingBox) -> bool {
        if self.max_y < other.min_y
            || self.max_x < other.min_x
            || self.min_y > other.max_y
            || self.min_x > other.max_x
        {
            return false;
        }
        true
    }
}
