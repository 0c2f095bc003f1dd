//! Directory scanning.
//!
//! Lists the image files of a single directory. There is no recursion: the
//! gallery is a flat directory of photographs, plus one nested directory of
//! pre-converted siblings which is scanned on its own.
//!
//! ```text
//! public/images/               # original tree  (ScanFilter::Original)
//! ├── .DS_Store                # hidden, skipped
//! ├── a.jpg
//! ├── b.PNG                    # extensions compare case-insensitively
//! ├── notes.txt                # not an image, skipped
//! └── webp/                    # alternate tree (ScanFilter::Alternate), never
//!     ├── a.webp               # listed as part of the original scan
//!     └── b.webp
//! ```
//!
//! Output order is whatever the filesystem returns. Ordering is the job of
//! [`crate::order`].

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("directory {path} is not readable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extensions recognized in the original tree.
pub const ORIGINAL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];

/// Extensions recognized in the alternate tree.
pub const ALTERNATE_EXTENSIONS: &[&str] = &["webp"];

/// Which tree is being scanned, and therefore which entries survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFilter<'a> {
    /// Original tree. The named alternate subdirectory is excluded.
    Original { alternate_name: &'a str },
    /// Alternate tree: converted siblings only.
    Alternate,
}

impl ScanFilter<'_> {
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            ScanFilter::Original { .. } => ORIGINAL_EXTENSIONS,
            ScanFilter::Alternate => ALTERNATE_EXTENSIONS,
        }
    }

    fn accepts(&self, name: &str, path: &Path) -> bool {
        if name.starts_with('.') {
            return false;
        }
        if matches!(self, ScanFilter::Original { alternate_name } if name == *alternate_name) {
            return false;
        }
        let Some(ext) = normalized_extension(path) else {
            return false;
        };
        self.extensions().contains(&ext.as_str()) && path.is_file()
    }
}

/// A file that survived filtering. Lives only for the duration of one
/// manifest build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// File name, unique within its directory.
    pub filename: String,
    pub source_path: PathBuf,
    /// Lowercased extension without the dot.
    pub extension: String,
}

/// List a directory's image candidates.
///
/// A missing directory yields an empty list. A directory that exists but
/// cannot be read is an error.
pub fn scan(dir: &Path, filter: ScanFilter<'_>) -> Result<Vec<ImageCandidate>, ScanError> {
    Ok(list_dir(dir, filter)?.unwrap_or_default())
}

/// Like [`scan`], but distinguishes a missing directory (`Ok(None)`) from an
/// empty one (`Ok(Some(vec![]))`).
///
/// Existence is reported by the listing itself rather than by a separate
/// check beforehand, so there is no window between checking and reading.
pub fn list_dir(
    dir: &Path,
    filter: ScanFilter<'_>,
) -> Result<Option<Vec<ImageCandidate>>, ScanError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ScanError::Unreadable {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let source_dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    let candidates = entries
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let path = entry.path();
            if !filter.accepts(&name, &path) {
                return None;
            }
            let extension = normalized_extension(&path)?;
            Some(ImageCandidate {
                source_path: source_dir.join(&name),
                filename: name,
                extension,
            })
        })
        .collect();

    Ok(Some(candidates))
}

fn normalized_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}
