//! Binary image inspection. Pixel data is never decoded.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Capture date/time** | custom parser (JPEG APP1 + TIFF IFD) |
//! | **WebP capability** | `image` header read, cached once per process |

pub mod exif_parser;
mod probe;

pub use exif_parser::{ExifError, read_exif_datetime};
pub use probe::alternate_format_supported;
