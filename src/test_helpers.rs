//! Shared test utilities for the gallery-manifest test suite.
//!
//! Builds tiny but structurally valid JPEG files carrying an EXIF block with
//! chosen date tags, and writes them into temp directories with a chosen
//! modification time.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let jpeg = jpeg_with_exif(true, &ExifDates { original: Some("2022:01:01 00:00:00"), ..Default::default() });
//! write_image(tmp.path(), "a.jpg", &jpeg, utc(2023, 6, 1));
//! ```

use chrono::{TimeZone, Utc};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// =========================================================================
// EXIF / JPEG builders
// =========================================================================

/// Date tags to embed. `None` leaves the tag out entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifDates<'a> {
    /// IFD0 DateTime (0x0132)
    pub date_time: Option<&'a str>,
    /// Exif sub-IFD DateTimeOriginal (0x9003)
    pub original: Option<&'a str>,
    /// Exif sub-IFD DateTimeDigitized (0x9004)
    pub digitized: Option<&'a str>,
}

struct Writer {
    little_endian: bool,
    out: Vec<u8>,
}

impl Writer {
    fn u16(&mut self, v: u16) {
        let b = if self.little_endian {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        self.out.extend_from_slice(&b);
    }

    fn u32(&mut self, v: u32) {
        let b = if self.little_endian {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        };
        self.out.extend_from_slice(&b);
    }

    /// Write one ASCII entry; long values go to `data` at `*next_offset`.
    fn ascii_entry(&mut self, tag: u16, value: &str, data: &mut Vec<u8>, next_offset: &mut usize) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.u16(tag);
        self.u16(2);
        self.u32(bytes.len() as u32);
        if bytes.len() <= 4 {
            bytes.resize(4, 0);
            self.out.extend_from_slice(&bytes);
        } else {
            self.u32(*next_offset as u32);
            *next_offset += bytes.len();
            data.extend_from_slice(&bytes);
        }
    }
}

/// Build a TIFF block (the part after `Exif\0\0`) holding the given dates.
pub fn exif_tiff(little_endian: bool, dates: &ExifDates) -> Vec<u8> {
    let ifd0_tags: Vec<(u16, &str)> = dates.date_time.map(|d| (0x0132, d)).into_iter().collect();
    let exif_tags: Vec<(u16, &str)> = [(0x9003, dates.original), (0x9004, dates.digitized)]
        .into_iter()
        .filter_map(|(tag, v)| v.map(|v| (tag, v)))
        .collect();
    let has_exif_ifd = !exif_tags.is_empty();

    let ifd0_offset = 8;
    let ifd0_count = ifd0_tags.len() + usize::from(has_exif_ifd);
    let exif_offset = ifd0_offset + 2 + ifd0_count * 12 + 4;
    let exif_size = if has_exif_ifd {
        2 + exif_tags.len() * 12 + 4
    } else {
        0
    };
    let mut next_offset = exif_offset + exif_size;
    let mut data = Vec::new();

    let mut w = Writer {
        little_endian,
        out: Vec::new(),
    };
    w.out
        .extend_from_slice(if little_endian { b"II" } else { b"MM" });
    w.u16(42);
    w.u32(ifd0_offset as u32);

    // IFD0, entries sorted by tag
    w.u16(ifd0_count as u16);
    for (tag, value) in &ifd0_tags {
        w.ascii_entry(*tag, value, &mut data, &mut next_offset);
    }
    if has_exif_ifd {
        w.u16(0x8769);
        w.u16(4);
        w.u32(1);
        w.u32(exif_offset as u32);
    }
    w.u32(0);

    if has_exif_ifd {
        w.u16(exif_tags.len() as u16);
        for (tag, value) in &exif_tags {
            w.ascii_entry(*tag, value, &mut data, &mut next_offset);
        }
        w.u32(0);
    }

    w.out.extend_from_slice(&data);
    w.out
}

const APP0_JFIF: &[u8] = &[
    0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x00,
];

/// Start of scan, a couple of entropy bytes, end of image.
const SCAN_TAIL: &[u8] = &[0xFF, 0xDA, 0x00, 0x02, 0x12, 0x34, 0xFF, 0xD9];

/// A JPEG with an APP0 segment and no APP1.
pub fn plain_jpeg() -> Vec<u8> {
    [&[0xFF, 0xD8][..], APP0_JFIF, SCAN_TAIL].concat()
}

/// A JPEG with an APP1 segment carrying `payload` verbatim.
pub fn jpeg_with_app1(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(APP0_JFIF);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(SCAN_TAIL);
    out
}

/// A JPEG whose APP1 segment carries an EXIF block with `dates`.
pub fn jpeg_with_exif(little_endian: bool, dates: &ExifDates) -> Vec<u8> {
    let payload = [b"Exif\0\0".as_slice(), &exif_tiff(little_endian, dates)].concat();
    jpeg_with_app1(&payload)
}

/// A JPEG whose only date is DateTimeOriginal.
pub fn jpeg_taken_at(datetime: &str) -> Vec<u8> {
    jpeg_with_exif(
        true,
        &ExifDates {
            original: Some(datetime),
            ..Default::default()
        },
    )
}

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Midnight UTC on the given day.
pub fn utc(year: i32, month: u32, day: u32) -> SystemTime {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap()
        .into()
}

/// Write `bytes` to `dir/name` and set its modification time.
pub fn write_image(dir: &Path, name: &str, bytes: &[u8], modified: SystemTime) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    set_modified(&path, modified);
    path
}

pub fn set_modified(path: &Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_tiff_layout_little_endian() {
        let tiff = exif_tiff(
            true,
            &ExifDates {
                original: Some("2022:01:01 00:00:00"),
                ..Default::default()
            },
        );
        assert_eq!(&tiff[0..4], b"II\x2A\x00");
        // IFD0 holds only the Exif pointer
        assert_eq!(u16::from_le_bytes([tiff[8], tiff[9]]), 1);
        assert_eq!(u16::from_le_bytes([tiff[10], tiff[11]]), 0x8769);
        assert!(tiff.ends_with(b"2022:01:01 00:00:00\0"));
    }

    #[test]
    fn jpeg_with_app1_declares_payload_length() {
        let jpeg = jpeg_with_app1(b"abc");
        let app1 = 2 + APP0_JFIF.len();
        assert_eq!(&jpeg[app1..app1 + 4], &[0xFF, 0xE1, 0x00, 0x05]);
    }
}
