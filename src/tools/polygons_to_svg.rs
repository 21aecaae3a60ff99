/*
This code is part of the shape2svg vector rendering tool.
Created: 03/06/2024
Last Modified: 11/02/2025
License: MIT
*/
use crate::rendering::{FillPolicy, PixelTransform, RandomFill, SvgDocument};
use crate::structures::BoundingBox;
use crate::utils::get_formatted_elapsed_time;
use crate::vector::shapefile::{read_header, PolygonGeometry, PolygonHeader, RecordWalker};
use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind, Read, Write};
use std::path;
use std::time::Instant;

/// Web-Mercator metres per degree of longitude, used by the optional
/// --mercator_degrees viewport convenience.
const MERC_PER_DEGREE: f64 = 20_037_508.34 / 180.0;

const DEFAULT_MAX_DIM: f64 = 2000.0;

/// This tool reads the polygon records of an ESRI Shapefile (.shp),
/// culls the records whose bounding box falls outside a configured
/// viewport, and renders every ring of the surviving polygons as a
/// filled shape in an SVG document. The records are decoded in a single
/// sequential pass; a malformed record aborts the run, since record
/// boundaries are computed from declared lengths and cannot be
/// resynchronized after an error.
pub struct PolygonsToSvg {
    name: String,
    description: String,
    example_usage: String,
}

impl PolygonsToSvg {
    pub fn new() -> PolygonsToSvg {
        // public constructor
        let name = "PolygonsToSvg".to_string();
        let description =
            "Renders the Shapefile polygons within a viewport as an SVG document.".to_string();

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let usage = format!(
            ">>.*shape2svg -v --wd=\"*path*to*data*\" -i=land.shp -o=land.svg --bbox=0.0,5100000.0,2670000.0,7570000.0 --max_dim=2000"
        )
        .replace("*", &sep);

        PolygonsToSvg {
            name: name,
            description: description,
            example_usage: usage,
        }
    }

    pub fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    pub fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    pub fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut input_file: String = "".to_string();
        let mut output_file: String = "".to_string();
        let mut bbox_arg: String = "".to_string();
        let mut max_dim = DEFAULT_MAX_DIM;
        let mut mercator_degrees = false;

        // read the arguments
        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for i in 0..args.len() {
            let mut arg = args[i].replace("\"", "");
            arg = arg.replace("\'", "");
            let cmd = arg.split("="); // in case an equals sign was used
            let vec = cmd.collect::<Vec<&str>>();
            let mut keyval = false;
            if vec.len() > 1 {
                keyval = true;
            }
            let flag_val = vec[0].to_lowercase().replace("--", "-");
            if flag_val == "-i" || flag_val == "-input" {
                input_file = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-o" || flag_val == "-output" {
                output_file = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-bbox" {
                bbox_arg = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
            } else if flag_val == "-max_dim" {
                let v = if keyval {
                    vec[1].to_string()
                } else {
                    args[i + 1].to_string()
                };
                max_dim = v.parse::<f64>().map_err(|_| {
                    Error::new(
                        ErrorKind::InvalidInput,
                        format!("Error parsing --max_dim value '{}'", v),
                    )
                })?;
            } else if flag_val == "-mercator_degrees" {
                mercator_degrees = true;
            }
        }

        if input_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "No input file specified (-i, --input).",
            ));
        }
        if output_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "No output file specified (-o, --output).",
            ));
        }
        if max_dim <= 0.0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "--max_dim must be a positive number of pixels.",
            ));
        }
        let mut viewport = parse_bbox(&bbox_arg)?;
        if mercator_degrees {
            viewport = BoundingBox::new(
                viewport.min_x * MERC_PER_DEGREE,
                viewport.min_y * MERC_PER_DEGREE,
                viewport.max_x * MERC_PER_DEGREE,
                viewport.max_y * MERC_PER_DEGREE,
            );
        }

        let sep: String = path::MAIN_SEPARATOR.to_string();
        if !input_file.contains(&sep) && !input_file.contains("/") {
            input_file = format!("{}{}", working_directory, input_file);
        }
        if !output_file.contains(&sep) && !output_file.contains("/") {
            output_file = format!("{}{}", working_directory, output_file);
        }

        if verbose {
            let tool_name = self.get_tool_name();
            let welcome_len = format!("* Welcome to {} *", tool_name).len().max(24);
            // 24 = length of the 'Powered by' statement.
            println!("{}", "*".repeat(welcome_len));
            println!(
                "* Welcome to {} {}*",
                tool_name,
                " ".repeat(welcome_len - 15 - tool_name.len())
            );
            println!("* Powered by shape2svg {}*", " ".repeat(welcome_len - 24));
            println!("{}", "*".repeat(welcome_len));
        }

        let start = Instant::now();

        let reader = BufReader::new(File::open(&input_file)?);
        let writer = BufWriter::new(File::create(&output_file)?);
        let mut fill = RandomFill::new();
        let (num_visible, num_records) =
            render(reader, writer, viewport, max_dim, &mut fill, verbose)?;

        if verbose {
            println!(
                "{} of {} records intersect the viewport",
                num_visible, num_records
            );
            println!(
                "{}",
                &format!("Elapsed Time: {}", get_formatted_elapsed_time(start))
            );
        }

        Ok(())
    }
}

/// The rendering pipeline: validate the file header, then walk the
/// record stream once, decoding the cheap polygon header of every record
/// and the full geometry of only the visible ones, emitting one filled
/// SVG shape per ring. Returns (visible records, total records).
pub fn render<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    viewport: BoundingBox,
    max_dim: f64,
    fill: &mut dyn FillPolicy,
    verbose: bool,
) -> Result<(usize, usize), Error> {
    let header = read_header(&mut reader)?;
    if verbose {
        println!(
            "Shape has {} bytes, version {}, bbox [{},{}] to [{},{}].",
            2 * header.file_length as u64,
            header.version,
            header.x_min,
            header.y_min,
            header.x_max,
            header.y_max
        );
    }

    let transform = PixelTransform::new(viewport, max_dim);
    if verbose {
        println!(
            "Canvas is {} x {} px ({} px per map unit).",
            transform.width(),
            transform.height(),
            transform.px_per_unit()
        );
    }

    let mut svg = SvgDocument::new(writer, transform.width(), transform.height())?;
    let mut walker = RecordWalker::new(reader);
    let mut num_records = 0usize;
    let mut num_visible = 0usize;
    let mut pixels: Vec<(f64, f64)> = vec![];

    while let Some((record_header, body)) = walker.next_record()? {
        num_records += 1;
        if verbose {
            println!(
                "#{:08}: type {}, {:7} bytes for record body, pos {}",
                record_header.record_num,
                record_header.shape_type,
                body.len(),
                walker.pos()
            );
        }

        // the visibility decision only needs the 40-byte polygon header;
        // culled records never pay for parts/points decoding
        let polygon_header = PolygonHeader::decode(&body)?;
        if !polygon_header.bbox.overlaps(viewport) {
            continue;
        }
        num_visible += 1;

        let geometry = PolygonGeometry::decode(&polygon_header, &body)?;
        for i in 0..geometry.num_rings() {
            pixels.clear();
            for p in geometry.ring(i) {
                pixels.push(transform.to_pixels(*p));
            }
            svg.emit_ring(&pixels, &fill.next_fill())?;
        }
    }

    svg.finish()?;
    Ok((num_visible, num_records))
}

fn parse_bbox(arg: &str) -> Result<BoundingBox, Error> {
    if arg.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "No viewport specified (--bbox=min_x,min_y,max_x,max_y).",
        ));
    }
    let mut vals: Vec<f64> = Vec::with_capacity(4);
    for s in arg.split(",") {
        vals.push(s.trim().parse::<f64>().map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Error parsing --bbox component '{}'", s),
            )
        })?);
    }
    if vals.len() != 4 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "--bbox needs four comma-separated values: min_x,min_y,max_x,max_y.",
        ));
    }
    if vals[0] >= vals[2] || vals[1] >= vals[3] {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "The viewport minimums must be less than its maximums.",
        ));
    }
    Ok(BoundingBox::new(vals[0], vals[1], vals[2], vals[3]))
}

#[cfg(test)]
mod test {
    use super::{parse_bbox, render};
    use crate::rendering::UniformFill;
    use crate::structures::BoundingBox;
    use crate::vector::shapefile::testdata::{encode_file_header, encode_record, one_square_file};
    use crate::vector::shapefile::POLYGON_SHAPE_TYPE;
    use std::io::{Cursor, ErrorKind};

    #[test]
    fn test_parse_bbox() {
        let bb = parse_bbox("0.0, 46.0, 24.0, 68.0").unwrap();
        assert_eq!(bb, BoundingBox::new(0.0, 46.0, 24.0, 68.0));
        assert!(parse_bbox("").is_err());
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,3,x").is_err());
        // inverted extents
        assert!(parse_bbox("5,0,1,10").is_err());
    }

    #[test]
    fn test_end_to_end_square() {
        // one square with bbox [2,2,8,8], viewport [0,0,10,10],
        // max_dim 1000: scale is 100 and each point maps to
        // (x*100, (10-y)*100)
        let file = one_square_file();
        let mut out: Vec<u8> = vec![];
        let mut fill = UniformFill::new("rgb(10,20,30)");
        let (visible, total) = render(
            Cursor::new(file),
            &mut out,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            1000.0,
            &mut fill,
            false,
        )
        .unwrap();
        assert_eq!((visible, total), (1, 1));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "<svg width=\"1000\" height=\"1000\">\n\
             <polygon points=\" 200,800 800,800 800,200 200,200\" style=\"fill:rgb(10,20,30)\" />\n\
             </svg>\n"
        );
    }

    #[test]
    fn test_culled_record_emits_nothing() {
        let file = one_square_file();
        let mut out: Vec<u8> = vec![];
        let mut fill = UniformFill::new("rgb(0,0,0)");
        // viewport entirely east of the square
        let (visible, total) = render(
            Cursor::new(file),
            &mut out,
            BoundingBox::new(20.0, 0.0, 30.0, 10.0),
            1000.0,
            &mut fill,
            false,
        )
        .unwrap();
        assert_eq!((visible, total), (0, 1));
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("<polygon"));
        assert!(text.ends_with("</svg>\n"));
    }

    #[test]
    fn test_run_aborts_on_skipped_record_number() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let mut file = encode_file_header(POLYGON_SHAPE_TYPE, 50, bbox);
        file.extend(encode_record(1, POLYGON_SHAPE_TYPE, bbox, &[0], &points));
        file.extend(encode_record(3, POLYGON_SHAPE_TYPE, bbox, &[0], &points));

        let mut out: Vec<u8> = vec![];
        let mut fill = UniformFill::new("rgb(0,0,0)");
        let err = render(
            Cursor::new(file),
            &mut out,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            100.0,
            &mut fill,
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        // the drop backstop still framed the document
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("</svg>\n"));
    }

    #[test]
    fn test_run_aborts_on_polyline_header() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let file = encode_file_header(3, 50, bbox);
        let mut out: Vec<u8> = vec![];
        let mut fill = UniformFill::new("rgb(0,0,0)");
        let err = render(
            Cursor::new(file),
            &mut out,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            100.0,
            &mut fill,
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        // header validation fails before the output document is opened
        assert!(out.is_empty());
    }
}
