//! Directory negotiation.
//!
//! Chooses the one directory a manifest is built from:
//!
//! | Alternate dir | Original dir | Chosen | Reason |
//! |---|---|---|---|
//! | has ≥1 `.webp` | any | `Alternate` | `AlternateNonempty` |
//! | missing, empty, or not consulted | exists | `Original` | `AlternateAbsent` |
//! | missing, empty, or not consulted | missing | `None` | `OriginalEmpty` |
//!
//! The listing taken while deciding is returned along with the decision, so
//! the manifest is built from exactly what was inspected. Entries from the
//! two directories are never mixed.

use crate::scan::{self, ImageCandidate, ScanError, ScanFilter};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChosenDirectory {
    Alternate,
    Original,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionReason {
    AlternateNonempty,
    AlternateAbsent,
    OriginalEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectorySelection {
    pub chosen_directory: ChosenDirectory,
    pub reason: SelectionReason,
}

impl DirectorySelection {
    pub const ALTERNATE: Self = Self {
        chosen_directory: ChosenDirectory::Alternate,
        reason: SelectionReason::AlternateNonempty,
    };
    pub const ORIGINAL: Self = Self {
        chosen_directory: ChosenDirectory::Original,
        reason: SelectionReason::AlternateAbsent,
    };
    pub const NONE: Self = Self {
        chosen_directory: ChosenDirectory::None,
        reason: SelectionReason::OriginalEmpty,
    };
}

/// The decision plus the listing of the chosen directory.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub selection: DirectorySelection,
    pub candidates: Vec<ImageCandidate>,
}

/// Pick the authoritative directory.
///
/// `alternate_dir` is `None` when the alternate format must not be
/// consulted. An unreadable alternate directory is treated as absent; an
/// unreadable original directory is an error.
pub fn select(
    alternate_dir: Option<&Path>,
    original_dir: &Path,
    alternate_name: &str,
) -> Result<Negotiated, ScanError> {
    if let Some(dir) = alternate_dir {
        match scan::list_dir(dir, ScanFilter::Alternate) {
            Ok(Some(candidates)) if !candidates.is_empty() => {
                return Ok(Negotiated {
                    selection: DirectorySelection::ALTERNATE,
                    candidates,
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "alternate directory unreadable, using originals");
            }
        }
    }

    let filter = ScanFilter::Original { alternate_name };
    Ok(match scan::list_dir(original_dir, filter)? {
        Some(candidates) => Negotiated {
            selection: DirectorySelection::ORIGINAL,
            candidates,
        },
        None => Negotiated {
            selection: DirectorySelection::NONE,
            candidates: Vec::new(),
        },
    })
}
