//! # Gallery Manifest
//!
//! Produces the ordered list of images a gallery front end renders. Your
//! filesystem is the data source: a directory of photographs, plus an
//! optional directory of pre-converted WebP siblings next to them.
//!
//! # Pipeline
//!
//! ```text
//! 1. Negotiate   alternate dir vs original dir  →  one authoritative listing
//! 2. Extract     each file's EXIF capture time  →  trusted or mtime fallback
//! 3. Order       trusted first, newest first    →  deterministic filename list
//! ```
//!
//! Every request rebuilds the manifest from scratch; there is no cache to
//! invalidate.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists one directory's image files, filtered by extension |
//! | [`imaging`] | Binary EXIF date/time reader, WebP capability probe |
//! | [`metadata`] | Resolves a [`metadata::CaptureTimestamp`] per file, with mtime fallback |
//! | [`order`] | The manifest ordering: trust, then recency, then filename |
//! | [`negotiate`] | Chooses the alternate or the original directory, never both |
//! | [`manifest`] | Orchestrates a request and defines the failure contract |
//! | [`naming`] | Maps originals to their converted siblings |
//! | [`config`] | `gallery.toml` loading, merging, validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## No Metadata Library
//!
//! Only one EXIF value is needed, the capture date/time. The [`imaging`]
//! module walks the JPEG segments and TIFF directories itself, reading just
//! the head of each file, and turns any malformed input into a fallback
//! rather than an error.
//!
//! ## Metadata Confidence First
//!
//! Photos with an embedded capture time always come before photos ordered by
//! modification time, regardless of the dates involved. See [`order`].
//!
//! ## Never Fail the Request
//!
//! A manifest is always returned. Problems with individual files degrade
//! that file's timestamp; an unreadable image directory degrades the whole
//! manifest to empty and flags it with a 500 status. See [`manifest`].

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod negotiate;
pub mod order;
pub mod output;
pub mod scan;

pub use manifest::{CancelToken, Manifest, ManifestBuilder, ManifestResponse};

#[cfg(test)]
pub(crate) mod test_helpers;
