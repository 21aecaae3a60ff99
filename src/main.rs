/*
This code is part of the shape2svg vector rendering tool.
Created: 03/06/2024
Last Modified: 11/02/2025
License: MIT
*/

/*!
shape2svg is a command-line tool that renders the polygon records of an
ESRI Shapefile (.shp) as filled shapes in an SVG document. Records whose
bounding box falls outside a configured viewport are culled before their
geometry is decoded, so continent-scale files can be cropped to a region
of interest cheaply.

The following commands are recognized:

| Command        | Description                                                          |
| -------------- | -------------------------------------------------------------------- |
| --wd           | Changes the working directory used to resolve relative paths.        |
| -h, --help     | Prints help information.                                             |
| -v             | Verbose mode; prints the header summary and per-record progress.     |
| --version      | Prints the version information.                                      |

All remaining arguments are passed through to the rendering tool; see
`PolygonsToSvg` for the tool's own flags (-i, -o, --bbox, --max_dim,
--mercator_degrees).
*/

pub mod configs;
pub mod rendering;
pub mod structures;
pub mod tools;
pub mod utils;
pub mod vector;

use crate::tools::PolygonsToSvg;
use std::env;
use std::io::Error;
use std::path;

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => panic!("{}", err),
    }
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        version();
        help();
        return Ok(());
    }

    let mut configs = configs::get_configs()?;
    let mut configs_modified = false;
    let mut tool_args_vec: Vec<String> = vec![];

    for arg in &args[1..] {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val == "-version" {
            version();
            return Ok(());
        } else if flag_val.starts_with("-wd") || flag_val.starts_with("-working_directory") {
            let mut v = arg
                .replace("--wd", "")
                .replace("-wd", "")
                .replace("--working_directory", "")
                .replace("-working_directory", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            let sep = path::MAIN_SEPARATOR;
            if !v.ends_with(sep) {
                v.push(sep);
            }
            if configs.working_directory != v {
                configs.working_directory = v;
                configs_modified = true;
            }
        } else if flag_val == "-v" || flag_val.starts_with("-verbose") {
            if !configs.verbose_mode {
                configs.verbose_mode = true;
                configs_modified = true;
            }
        } else {
            // it's an arg to be fed to the tool
            tool_args_vec.push(arg.trim().to_string());
        }
    }

    if configs_modified {
        configs::save_configs(&configs)?;
    }

    let tool = PolygonsToSvg::new();
    tool.run(
        tool_args_vec,
        &configs.working_directory,
        configs.verbose_mode,
    )
}

fn help() {
    let mut ext = "";
    if cfg!(target_os = "windows") {
        ext = ".exe";
    }

    let exe_name = &format!("shape2svg{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = "shape2svg Help

The following commands are recognized:
--wd                Changes the working directory used to resolve relative paths.
-h, --help          Prints help information.
-i, --input         Input Shapefile (.shp) path.
-o, --output        Output SVG path.
--bbox              Viewport min_x,min_y,max_x,max_y in the source projection.
--mercator_degrees  Interpret --bbox values as degrees and convert them to Web-Mercator metres.
--max_dim           Longest output dimension in pixels (default 2000).
-v                  Verbose mode; prints the header summary and per-record progress.
--version           Prints the version information.

Example Usage:
>> .*EXE_NAME -v --wd=\"*path*to*data*\" -i=land.shp -o=land.svg --bbox=0,46,24,68 --mercator_degrees
"
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "shape2svg v{}

A tool for rendering ESRI Shapefile polygons as SVG documents.",
        VERSION.unwrap_or("unknown")
    );
}
