//! Original ↔ alternate filename mapping.
//!
//! The external conversion job writes one WebP sibling per convertible
//! original, keeping the stem:
//!
//! - `sunset.jpg`  → `webp/sunset.webp`
//! - `Pier.JPEG`   → `webp/Pier.webp`
//! - `logo.svg`    → (not converted)
//!
//! [`resolve_preferred`] answers "which file should be served for this
//! original?" for a single image.

use crate::config::ManifestConfig;
use crate::imaging;
use std::path::{Path, PathBuf};

/// Extensions the conversion job turns into WebP siblings.
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

const ALTERNATE_EXTENSION: &str = "webp";

/// Name of the alternate sibling for `filename`, if it has one.
pub fn alternate_name(filename: &str) -> Option<String> {
    let path = Path::new(filename);
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !CONVERTIBLE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    Some(format!("{stem}.{ALTERNATE_EXTENSION}"))
}

/// Path to serve for `filename`: its alternate sibling when alternates are
/// preferred, the format is supported and the sibling exists; the original
/// otherwise. Applies the same gate as the manifest's directory choice.
pub fn resolve_preferred(config: &ManifestConfig, filename: &str) -> PathBuf {
    let original = config.original_dir().join(filename);
    if !config.formats.prefer_alternate || !imaging::alternate_format_supported() {
        return original;
    }
    match alternate_name(filename) {
        Some(name) => {
            let alternate = config.alternate_dir().join(name);
            if alternate.is_file() {
                alternate
            } else {
                tracing::debug!(
                    original = %original.display(),
                    "no alternate sibling, serving original"
                );
                original
            }
        }
        None => original,
    }
}
