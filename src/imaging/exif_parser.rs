//! Minimal EXIF date/time reader for JPEG files.
//!
//! Pulls one value out of the EXIF block: the capture date/time string.
//! Tags are tried in this order, first present wins:
//! - DateTimeOriginal (0x9003, Exif sub-IFD)
//! - DateTime (0x0132, IFD0)
//! - DateTimeDigitized (0x9004, Exif sub-IFD)
//!
//! Layout walked:
//!
//! ```text
//! FF D8                      SOI
//! FF Ex LL LL <payload>      APPn segments; LL includes its own two bytes
//! FF E1 LL LL "Exif\0\0"     APP1 carrying EXIF, followed by a TIFF block:
//!   "II"|"MM" 2A 00 <u32>    byte order, magic 42, offset of IFD0
//!   IFD: <u16 n> n×12-byte entries <u32 next>
//! FF DA ...                  SOS: entropy-coded data follows, stop here
//! ```
//!
//! TIFF offsets are relative to the start of the TIFF block. Every read is
//! bounds-checked; running off the end of the buffer is an error, never a
//! panic.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExifError {
    #[error("no EXIF segment found")]
    NoSegment,
    #[error("buffer ends inside or before the segment at offset {offset}")]
    Truncated { offset: usize },
    #[error("segment at offset {offset} declares invalid length {declared}")]
    BadLength { offset: usize, declared: usize },
    #[error("invalid TIFF header")]
    BadTiffHeader,
    #[error("IFD at TIFF offset {0} is out of range")]
    BadIfd(usize),
    #[error("no date/time tag present")]
    NoDateTag,
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EXIF_SIGNATURE: &[u8] = b"Exif\0\0";

const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;

const TYPE_ASCII: u16 = 2;
const TYPE_UNDEFINED: u16 = 7;

const IFD_ENTRY_LEN: usize = 12;

/// Extract the raw capture date/time string from a JPEG buffer.
///
/// The returned string is untouched apart from trailing NULs; validating
/// its format is the caller's job.
pub fn read_exif_datetime(data: &[u8]) -> Result<String, ExifError> {
    let tiff = find_exif_tiff(data)?;
    read_datetime_from_tiff(tiff)
}

// ---------------------------------------------------------------------------
// JPEG: locate the EXIF APP1 segment
// ---------------------------------------------------------------------------

/// Return the TIFF block inside the first APP1 segment that carries the
/// `Exif\0\0` signature.
///
/// Non-JPEG buffers (no SOI) have no segment. APP1 segments with other
/// signatures (XMP) are skipped. Only reaching SOS proves there is no EXIF
/// segment; running out of bytes before it is `Truncated`.
fn find_exif_tiff(data: &[u8]) -> Result<&[u8], ExifError> {
    if !data.starts_with(&SOI) {
        return Err(ExifError::NoSegment);
    }

    let mut pos = SOI.len();
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        match marker {
            // Fill byte or stuffed zero: not a marker start
            0xFF | 0x00 => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length field
            0x01 | 0xD0..=0xD9 => {
                pos += 2;
                continue;
            }
            SOS => return Err(ExifError::NoSegment),
            _ => {}
        }

        let Some(len_bytes) = data.get(pos + 2..pos + 4) else {
            return Err(ExifError::Truncated { offset: pos });
        };
        let declared = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if declared < 2 {
            return Err(ExifError::BadLength {
                offset: pos,
                declared,
            });
        }

        let payload_start = pos + 4;
        let segment_end = pos + 2 + declared;
        if segment_end > data.len() {
            return Err(ExifError::Truncated { offset: pos });
        }

        if marker == APP1 {
            if let Some(tiff) = data[payload_start..segment_end].strip_prefix(EXIF_SIGNATURE) {
                return Ok(tiff);
            }
        }

        pos = segment_end;
    }

    Err(ExifError::Truncated { offset: pos })
}

// ---------------------------------------------------------------------------
// TIFF: walk IFD0 and the Exif sub-IFD
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy)]
struct IfdEntry {
    tag: u16,
    typ: u16,
    count: u32,
    /// Position of the 4-byte value/offset field within the TIFF block.
    value_pos: usize,
}

struct Tiff<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Tiff<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, ExifError> {
        let order = match data.get(0..2) {
            Some(b"II") => ByteOrder::Little,
            Some(b"MM") => ByteOrder::Big,
            _ => return Err(ExifError::BadTiffHeader),
        };
        let tiff = Self { data, order };
        if tiff.u16_at(2) != Some(42) {
            return Err(ExifError::BadTiffHeader);
        }
        Ok(tiff)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(match self.order {
            ByteOrder::Little => u16::from_le_bytes([b[0], b[1]]),
            ByteOrder::Big => u16::from_be_bytes([b[0], b[1]]),
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        let bytes = [b[0], b[1], b[2], b[3]];
        Some(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    fn first_ifd_offset(&self) -> Result<usize, ExifError> {
        self.u32_at(4)
            .map(|o| o as usize)
            .ok_or(ExifError::BadTiffHeader)
    }

    /// Read all entries of the IFD at `offset`. The whole entry table must
    /// fit inside the block.
    fn read_ifd(&self, offset: usize) -> Result<Vec<IfdEntry>, ExifError> {
        let count = self.u16_at(offset).ok_or(ExifError::BadIfd(offset))? as usize;
        let entries_start = offset + 2;
        let entries_end = entries_start + count * IFD_ENTRY_LEN;
        if entries_end > self.data.len() {
            return Err(ExifError::BadIfd(offset));
        }

        let entries = (0..count)
            .filter_map(|i| {
                let at = entries_start + i * IFD_ENTRY_LEN;
                Some(IfdEntry {
                    tag: self.u16_at(at)?,
                    typ: self.u16_at(at + 2)?,
                    count: self.u32_at(at + 4)?,
                    value_pos: at + 8,
                })
            })
            .collect();
        Ok(entries)
    }

    /// Read an ASCII entry's text. Values of four bytes or fewer are stored
    /// inline in the value field; longer ones live at the offset it holds.
    fn ascii_value(&self, entry: &IfdEntry) -> Option<String> {
        if entry.typ != TYPE_ASCII && entry.typ != TYPE_UNDEFINED {
            return None;
        }
        let len = entry.count as usize;
        let start = if len <= 4 {
            entry.value_pos
        } else {
            self.u32_at(entry.value_pos)? as usize
        };
        let bytes = self.data.get(start..start.checked_add(len)?)?;
        let text = String::from_utf8_lossy(bytes);
        Some(text.trim_end_matches('\0').to_string())
    }
}

fn find_tag(entries: &[IfdEntry], tag: u16) -> Option<&IfdEntry> {
    entries.iter().find(|e| e.tag == tag)
}

/// Decode IFD0 (and the Exif sub-IFD it points to) and return the first
/// present date/time value in priority order.
fn read_datetime_from_tiff(data: &[u8]) -> Result<String, ExifError> {
    let tiff = Tiff::parse(data)?;
    let ifd0 = tiff.read_ifd(tiff.first_ifd_offset()?)?;

    let exif_ifd = match find_tag(&ifd0, TAG_EXIF_IFD_POINTER) {
        Some(pointer) => {
            let offset = tiff
                .u32_at(pointer.value_pos)
                .ok_or(ExifError::BadIfd(pointer.value_pos))? as usize;
            tiff.read_ifd(offset)?
        }
        None => Vec::new(),
    };

    let priority = [
        (exif_ifd.as_slice(), TAG_DATE_TIME_ORIGINAL),
        (ifd0.as_slice(), TAG_DATE_TIME),
        (exif_ifd.as_slice(), TAG_DATE_TIME_DIGITIZED),
    ];

    priority
        .iter()
        .find_map(|(entries, tag)| find_tag(entries, *tag).and_then(|e| tiff.ascii_value(e)))
        .ok_or(ExifError::NoDateTag)
}
