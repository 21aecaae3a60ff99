// private sub-module defined in other files
mod polygons_to_svg;

// exports identifiers from private sub-modules in the current module namespace
pub use self::polygons_to_svg::render;
pub use self::polygons_to_svg::PolygonsToSvg;
