// private sub-module defined in other files
mod svg;

// exports identifiers from private sub-modules in the current module namespace
pub use self::svg::FillPolicy;
pub use self::svg::PixelTransform;
pub use self::svg::RandomFill;
pub use self::svg::SvgDocument;
pub use self::svg::UniformFill;
