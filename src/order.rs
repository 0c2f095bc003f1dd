//! Manifest ordering.
//!
//! Most recent first, with metadata confidence taking precedence over time:
//!
//! 1. Trusted timestamps (embedded EXIF) before untrusted ones (mtime),
//!    whatever their values. A photo with an mtime of 2024 still sorts after
//!    one whose camera recorded 2019.
//! 2. Within equal trust, newer instants first.
//! 3. Remaining ties by filename, ascending.
//!
//! Trusted and untrusted timestamps are never interleaved by value.
//!
//! The comparator is a total order over `(trusted, instant, filename)`, so
//! the result does not depend on input order.

use crate::metadata::CaptureTimestamp;
use serde::Serialize;
use std::cmp::Ordering;

/// A filename paired with its resolved capture timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timestamped {
    pub filename: String,
    pub captured: CaptureTimestamp,
}

/// Compare two entries under the manifest ordering.
pub fn compare(a: &Timestamped, b: &Timestamped) -> Ordering {
    b.captured
        .trusted
        .cmp(&a.captured.trusted)
        .then_with(|| b.captured.instant.cmp(&a.captured.instant))
        .then_with(|| a.filename.cmp(&b.filename))
}

/// Sort entries into manifest order.
pub fn order(mut entries: Vec<Timestamped>) -> Vec<Timestamped> {
    entries.sort_by(compare);
    entries
}
