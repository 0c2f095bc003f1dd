//! Capture timestamp resolution.
//!
//! Every image gets exactly one [`CaptureTimestamp`]. There are two sources,
//! tried in order:
//!
//! - **Embedded EXIF date/time**: the moment the camera recorded the shot.
//!   Read by [`crate::imaging::read_exif_datetime`]. Marked `trusted`.
//! - **Filesystem modification time**: when the file was last written.
//!   Copying, converting, or editing a photo changes it, so it is only a
//!   stand-in. Marked untrusted.
//!
//! ## Failure handling
//!
//! Nothing in here fails visibly. Unreadable files, malformed segments,
//! unparseable date strings and slow reads all end up as an untrusted
//! timestamp; the reason is logged at `debug` level.
//!
//! ## Reading
//!
//! Only the head of each file is read at first (`max_header_bytes`), since
//! the EXIF segment sits before the image data. If the parser runs off the
//! end of that head, and the head was cut short by the limit rather than by
//! the end of the file, the whole file is read and parsed once more.

use crate::config::ExtractionConfig;
use crate::imaging::{self, ExifError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("file is not readable: {0}")]
    FileUnreadable(#[from] std::io::Error),
    #[error("malformed metadata segment: {0}")]
    Malformed(#[from] ExifError),
    #[error("unparseable timestamp {0:?}")]
    TimestampParse(String),
    #[error("extraction exceeded {0} ms")]
    Timeout(u128),
}

/// When an image was captured, and whether that came from embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureTimestamp {
    pub instant: DateTime<Utc>,
    /// True only for timestamps read from embedded metadata.
    pub trusted: bool,
}

impl CaptureTimestamp {
    pub fn trusted(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            trusted: true,
        }
    }

    pub fn untrusted(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            trusted: false,
        }
    }
}

/// Resolve the capture timestamp of one file.
///
/// Embedded EXIF date/time when it can be read and parsed within the
/// configured deadline; the file's modification time otherwise.
pub fn extract_capture_instant(path: &Path, config: &ExtractionConfig) -> CaptureTimestamp {
    match read_embedded_instant(path, config) {
        Ok(instant) => CaptureTimestamp::trusted(instant),
        Err(e) => {
            tracing::debug!(path = %path.display(), reason = %e, "falling back to modification time");
            CaptureTimestamp::untrusted(modified_instant(path))
        }
    }
}

/// Read and parse the embedded capture date/time.
///
/// The deadline is checked after each read, before any parsing, so a file
/// that took too long to read is never trusted.
pub fn read_embedded_instant(
    path: &Path,
    config: &ExtractionConfig,
) -> Result<DateTime<Utc>, ExtractError> {
    let started = Instant::now();
    let timeout = config.timeout();

    let head = read_head(path, config.max_header_bytes)?;
    check_deadline(started.elapsed(), timeout)?;

    let raw = match imaging::read_exif_datetime(&head) {
        Err(ExifError::Truncated { .. }) if head.len() >= config.max_header_bytes => {
            let whole = std::fs::read(path)?;
            check_deadline(started.elapsed(), timeout)?;
            imaging::read_exif_datetime(&whole)
        }
        other => other,
    }?;

    parse_exif_datetime(&raw).ok_or(ExtractError::TimestampParse(raw))
}

/// A zero timeout is already exceeded.
fn check_deadline(elapsed: Duration, timeout: Duration) -> Result<(), ExtractError> {
    if elapsed >= timeout {
        return Err(ExtractError::Timeout(elapsed.as_millis()));
    }
    Ok(())
}

fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit.min(64 * 1024));
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` string.
///
/// The first two colons (the date separators) become dashes before parsing.
/// EXIF carries no zone, so the wall-clock value is taken as UTC.
pub fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    // Fixed-width pattern: reject anything else before touching separators
    if trimmed.len() != 19 || !trimmed.is_ascii() {
        return None;
    }
    let normalized = trimmed.replacen(':', "-", 2);
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Modification time of a file, or the Unix epoch when unavailable.
pub fn modified_instant(path: &Path) -> DateTime<Utc> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);
    DateTime::<Utc>::from(modified)
}
