// private sub-module defined in other files
mod chunk_format;

// exports identifiers from private sub-modules in the current module namespace
pub use self::chunk_format::ChunkFormat;
pub use self::chunk_format::Endianness;
pub use self::chunk_format::FieldKind;
pub use self::chunk_format::FieldSpec;
pub use self::chunk_format::FieldValue;

use std::time::Instant;

/// Returns a formatted string of elapsed time, e.g.
/// `1min 34.852s`
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{}s", sub_sec, sub_milli)
}
