//! Manifest building.
//!
//! Ties the stages together for one request:
//!
//! ```text
//! negotiate::select      which directory is authoritative (and its listing)
//!   → metadata::extract  one CaptureTimestamp per candidate, in parallel
//!   → order::order       single-threaded sort
//!   → Manifest           ordered filenames + provenance
//! ```
//!
//! A manifest is built fresh on every call; nothing is cached between
//! requests, so the filesystem at request time is the source of truth.
//!
//! ## Failure contract
//!
//! [`ManifestBuilder::build`] never fails. Per-file problems degrade to
//! untrusted timestamps inside [`crate::metadata`]. An unreadable original
//! directory degrades to an empty manifest with
//! [`ServiceStatus::Degraded`], which maps to HTTP 500 so operators can tell
//! a permission problem from an empty gallery. A missing directory is just
//! empty.
//!
//! ## Response shape
//!
//! ```json
//! { "images": ["c.jpg", "a.jpg"], "format": "original", "directory": "images", "sortBy": "exif-datetime" }
//! ```

use crate::config::{self, ManifestConfig};
use crate::imaging;
use crate::metadata;
use crate::negotiate::{self, ChosenDirectory, DirectorySelection};
use crate::order::{self, Timestamped};
use crate::scan::{ImageCandidate, ScanError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the manifest order was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderingBasis {
    /// At least one image carried a trusted embedded timestamp.
    MetadataTimestamp,
    /// Every image was ordered by modification time.
    FilesystemTimestamp,
    /// Nothing to order.
    None,
}

impl OrderingBasis {
    fn of(entries: &[Timestamped]) -> Self {
        if entries.is_empty() {
            OrderingBasis::None
        } else if entries.iter().any(|e| e.captured.trusted) {
            OrderingBasis::MetadataTimestamp
        } else {
            OrderingBasis::FilesystemTimestamp
        }
    }
}

/// Ordered images from exactly one directory, plus how they were chosen and
/// ordered.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub entries: Vec<Timestamped>,
    pub directory_selection: DirectorySelection,
    pub ordering_basis: OrderingBasis,
}

impl Manifest {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            directory_selection: DirectorySelection::NONE,
            ordering_basis: OrderingBasis::None,
        }
    }

    pub fn ordered_filenames(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.filename.as_str()).collect()
    }
}

/// Why a manifest came back degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    DirectoryUnreadable { path: PathBuf, message: String },
    Cancelled,
}

impl From<&ScanError> for FailureReason {
    fn from(e: &ScanError) -> Self {
        match e {
            ScanError::Unreadable { path, source } => FailureReason::DirectoryUnreadable {
                path: path.clone(),
                message: source.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ServiceStatus {
    Ok,
    Degraded(FailureReason),
}

impl ServiceStatus {
    /// HTTP status the web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceStatus::Ok => 200,
            ServiceStatus::Degraded(_) => 500,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceStatus::Ok)
    }
}

/// JSON body handed to the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub images: Vec<String>,
    pub format: &'static str,
    pub directory: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<&'static str>,
}

/// A manifest together with the service status of the request.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestResponse {
    pub manifest: Manifest,
    pub status: ServiceStatus,
}

impl ManifestResponse {
    fn degraded(reason: FailureReason) -> Self {
        Self {
            manifest: Manifest::empty(),
            status: ServiceStatus::Degraded(reason),
        }
    }

    pub fn body(&self) -> ResponseBody {
        let (format, directory) = match self.manifest.directory_selection.chosen_directory {
            ChosenDirectory::Alternate => ("webp", "webp"),
            ChosenDirectory::Original => ("original", "images"),
            ChosenDirectory::None => ("none", "none"),
        };
        let sort_by = (self.manifest.ordering_basis == OrderingBasis::MetadataTimestamp)
            .then_some("exif-datetime");
        ResponseBody {
            images: self
                .manifest
                .entries
                .iter()
                .map(|e| e.filename.clone())
                .collect(),
            format,
            directory,
            sort_by,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a build.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Builds manifests from a fixed configuration. Holds its own bounded
/// worker pool for metadata extraction.
pub struct ManifestBuilder {
    config: ManifestConfig,
    pool: Option<rayon::ThreadPool>,
}

impl ManifestBuilder {
    pub fn new(config: ManifestConfig) -> Self {
        let threads = config::effective_threads(&config.processing);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("manifest-extract-{i}"))
            .build()
            .map_err(|e| tracing::warn!(error = %e, "worker pool unavailable, using global pool"))
            .ok();
        Self { config, pool }
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Build a manifest. Never fails; see the module docs for how failures
    /// are reported.
    pub fn build(&self) -> ManifestResponse {
        self.build_cancellable(&CancelToken::new())
            .unwrap_or_else(|| ManifestResponse::degraded(FailureReason::Cancelled))
    }

    /// Build a manifest, giving up if `token` is cancelled. A cancelled
    /// build returns `None`; partial results are dropped.
    pub fn build_cancellable(&self, token: &CancelToken) -> Option<ManifestResponse> {
        let original = self.config.original_dir();
        let alternate = self.config.alternate_dir();
        let consult_alternate =
            self.config.formats.prefer_alternate && imaging::alternate_format_supported();

        let negotiated = match negotiate::select(
            consult_alternate.then_some(alternate.as_path()),
            &original,
            &self.config.directories.alternate,
        ) {
            Ok(negotiated) => negotiated,
            Err(e) => {
                tracing::warn!(error = %e, "serving empty manifest");
                return Some(ManifestResponse::degraded(FailureReason::from(&e)));
            }
        };

        let entries = self.extract_all(&negotiated.candidates, token)?;
        let ordering_basis = OrderingBasis::of(&entries);
        let entries = order::order(entries);

        tracing::info!(
            images = entries.len(),
            directory = ?negotiated.selection.chosen_directory,
            basis = ?ordering_basis,
            "built manifest"
        );

        Some(ManifestResponse {
            manifest: Manifest {
                entries,
                directory_selection: negotiated.selection,
                ordering_basis,
            },
            status: ServiceStatus::Ok,
        })
    }

    /// Resolve every candidate's timestamp on the worker pool. Returns
    /// `None` as soon as a task observes cancellation.
    fn extract_all(
        &self,
        candidates: &[ImageCandidate],
        token: &CancelToken,
    ) -> Option<Vec<Timestamped>> {
        let extraction = &self.config.extraction;
        let run = || {
            candidates
                .par_iter()
                .map(|candidate| {
                    if token.is_cancelled() {
                        return None;
                    }
                    Some(Timestamped {
                        filename: candidate.filename.clone(),
                        captured: metadata::extract_capture_instant(
                            &candidate.source_path,
                            extraction,
                        ),
                    })
                })
                .collect::<Option<Vec<_>>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
