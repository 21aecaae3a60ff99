/*
This code is part of the shape2svg vector rendering tool.
Created: 20/05/2024
Last Modified: 11/02/2025
License: MIT
*/
use crate::structures::{BoundingBox, Point2D};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{Error, Write};

/// Maps projected coordinates into output pixel space. One uniform scale
/// is applied to both axes, sized so that the viewport's longer dimension
/// spans exactly the configured number of pixels. The y axis is flipped:
/// projected y grows northward while pixel y grows downward.
#[derive(Debug, Clone, Copy)]
pub struct PixelTransform {
    offset_x: f64,
    offset_y: f64,
    px_per_unit: f64,
    width: f64,
    height: f64,
}

impl PixelTransform {
    pub fn new(viewport: BoundingBox, max_dim: f64) -> PixelTransform {
        let largest_dimension = viewport.get_width().max(viewport.get_height());
        let px_per_unit = max_dim / largest_dimension;
        PixelTransform {
            offset_x: viewport.min_x,
            offset_y: viewport.max_y,
            px_per_unit: px_per_unit,
            width: viewport.get_width() * px_per_unit,
            height: viewport.get_height() * px_per_unit,
        }
    }

    /// Output canvas width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Output canvas height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn px_per_unit(&self) -> f64 {
        self.px_per_unit
    }

    pub fn to_pixels(&self, p: Point2D) -> (f64, f64) {
        (
            (p.x - self.offset_x) * self.px_per_unit,
            (self.offset_y - p.y) * self.px_per_unit,
        )
    }
}

/// Chooses the fill color for each emitted shape.
pub trait FillPolicy {
    fn next_fill(&mut self) -> String;
}

/// The default policy: a uniformly random color per shape. The color
/// carries no meaning; it only makes adjacent polygons distinguishable.
pub struct RandomFill {
    rng: SmallRng,
}

impl RandomFill {
    pub fn new() -> RandomFill {
        RandomFill {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl FillPolicy for RandomFill {
    fn next_fill(&mut self) -> String {
        format!(
            "rgb({},{},{})",
            self.rng.gen::<u8>(),
            self.rng.gen::<u8>(),
            self.rng.gen::<u8>()
        )
    }
}

/// A fixed fill color for every shape; used where deterministic output
/// bytes are needed.
pub struct UniformFill {
    color: String,
}

impl UniformFill {
    pub fn new(color: &str) -> UniformFill {
        UniformFill {
            color: color.to_string(),
        }
    }
}

impl FillPolicy for UniformFill {
    fn next_fill(&mut self) -> String {
        self.color.clone()
    }
}

/// A scoped SVG document wrapped around an output sink. The root element
/// is written on creation; the closing tag is written and the sink
/// flushed exactly once, either by `finish` (the success path, with I/O
/// errors reported) or by the drop backstop, so the document is framed on
/// every exit path and never double-closed.
pub struct SvgDocument<W: Write> {
    writer: W,
    closed: bool,
}

impl<W: Write> SvgDocument<W> {
    pub fn new(mut writer: W, width: f64, height: f64) -> Result<SvgDocument<W>, Error> {
        writeln!(writer, "<svg width=\"{}\" height=\"{}\">", width, height)?;
        Ok(SvgDocument {
            writer: writer,
            closed: false,
        })
    }

    /// Writes one filled shape whose vertex list is the given pixel
    /// points, in order.
    pub fn emit_ring(&mut self, pixels: &[(f64, f64)], fill: &str) -> Result<(), Error> {
        write!(self.writer, "<polygon points=\"")?;
        for (x, y) in pixels {
            write!(self.writer, " {},{}", x, y)?;
        }
        writeln!(self.writer, "\" style=\"fill:{}\" />", fill)?;
        Ok(())
    }

    /// Closes the document and flushes the sink.
    pub fn finish(mut self) -> Result<(), Error> {
        self.close()
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        writeln!(self.writer, "</svg>")?;
        self.writer.flush()
    }
}

impl<W: Write> Drop for SvgDocument<W> {
    fn drop(&mut self) {
        // last-chance framing for early exits; errors can't surface here
        let _ = self.close();
    }
}
