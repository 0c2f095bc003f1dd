//! Alternate-format capability probe.
//!
//! Decides once per process whether WebP images can be handled, by reading
//! the header of a known 2×2 WebP image. The answer is cached in a
//! [`OnceLock`]; every caller goes through [`alternate_format_supported`].

use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::OnceLock;

/// A 2×2 lossy WebP image.
const PROBE_WEBP: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x3A, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38, 0x20,
    0x2E, 0x00, 0x00, 0x00, 0xB2, 0x02, 0x00, 0x9D, 0x01, 0x2A, 0x02, 0x00, 0x02, 0x00, 0x2E, 0x69,
    0x34, 0x9A, 0x4D, 0x22, 0x22, 0x22, 0x22, 0x22, 0x00, 0x68, 0x4B, 0x28, 0x00, 0x05, 0xCE, 0x96,
    0x5A, 0x00, 0x00, 0xFE, 0xF7, 0x9F, 0x7F, 0xFD, 0x0F, 0x3F, 0xC6, 0xC0, 0xFF, 0xF2, 0xF0, 0x60,
    0x00, 0x00,
];

static WEBP_SUPPORT: OnceLock<bool> = OnceLock::new();

/// Whether the alternate (WebP) format is supported. Computed on first call.
pub fn alternate_format_supported() -> bool {
    *WEBP_SUPPORT.get_or_init(probe_webp)
}

fn probe_webp() -> bool {
    let supported = ImageReader::with_format(Cursor::new(PROBE_WEBP), ImageFormat::WebP)
        .into_dimensions()
        .is_ok_and(|(_, height)| height == 2);
    tracing::debug!(supported, "probed alternate format support");
    supported
}
