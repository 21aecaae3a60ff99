/*
This code is part of the shape2svg vector rendering tool.
Created: 14/05/2024
Last Modified: 14/05/2024
License: MIT
*/
use std::fmt;

/// A 2-D point, with x and y fields.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Creates a new Point2D.
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x: x, y: y }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = format!("(x: {}, y: {})", self.x, self.y);
        write!(f, "{}", s)
    }
}
