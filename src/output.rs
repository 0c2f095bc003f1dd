//! CLI output formatting for the `check` command.
//!
//! # Output Format
//!
//! ```text
//! Directory: original (alternate directory absent or empty)
//! Ordering: EXIF date/time
//! 001 c.jpg
//!     Captured: 2022-06-01 00:00:00 (EXIF)
//! 002 a.jpg
//!     Captured: 2022-01-01 00:00:00 (EXIF)
//! 003 b.jpg
//!     Captured: 2023-06-01 00:00:00 (file modified)
//!
//! 3 images, 2 with EXIF dates
//! ```
//!
//! `format_*` functions return lines and do no I/O; `print_*` wrappers write
//! them to stdout.

use crate::manifest::{FailureReason, ManifestResponse, OrderingBasis, ServiceStatus};
use crate::negotiate::{ChosenDirectory, SelectionReason};
use crate::order::Timestamped;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn directory_line(response: &ManifestResponse) -> String {
    let selection = response.manifest.directory_selection;
    let chosen = match selection.chosen_directory {
        ChosenDirectory::Alternate => "alternate",
        ChosenDirectory::Original => "original",
        ChosenDirectory::None => "none",
    };
    let reason = match selection.reason {
        SelectionReason::AlternateNonempty => "alternate directory has images",
        SelectionReason::AlternateAbsent => "alternate directory absent or empty",
        SelectionReason::OriginalEmpty => "no image directory found",
    };
    format!("Directory: {chosen} ({reason})")
}

fn ordering_line(basis: OrderingBasis) -> String {
    let label = match basis {
        OrderingBasis::MetadataTimestamp => "EXIF date/time",
        OrderingBasis::FilesystemTimestamp => "file modification time",
        OrderingBasis::None => "none",
    };
    format!("Ordering: {label}")
}

fn entry_lines(index: usize, entry: &Timestamped) -> [String; 2] {
    let source = if entry.captured.trusted {
        "EXIF"
    } else {
        "file modified"
    };
    [
        format!("{} {}", format_index(index), entry.filename),
        format!(
            "{}Captured: {} ({})",
            indent(1),
            entry.captured.instant.format("%Y-%m-%d %H:%M:%S"),
            source
        ),
    ]
}

fn failure_line(reason: &FailureReason) -> String {
    match reason {
        FailureReason::DirectoryUnreadable { path, message } => {
            format!("Degraded: {} is not readable ({})", path.display(), message)
        }
        FailureReason::Cancelled => "Degraded: build cancelled".to_string(),
    }
}

/// Format a manifest report.
pub fn format_manifest_output(response: &ManifestResponse) -> Vec<String> {
    let mut lines = Vec::new();

    if let ServiceStatus::Degraded(reason) = &response.status {
        lines.push(failure_line(reason));
    }

    let manifest = &response.manifest;
    lines.push(directory_line(response));
    lines.push(ordering_line(manifest.ordering_basis));

    for (i, entry) in manifest.entries.iter().enumerate() {
        lines.extend(entry_lines(i + 1, entry));
    }

    let trusted = manifest
        .entries
        .iter()
        .filter(|e| e.captured.trusted)
        .count();
    lines.push(String::new());
    lines.push(format!(
        "{} images, {} with EXIF dates",
        manifest.entries.len(),
        trusted
    ));
    lines
}

pub fn print_manifest_output(response: &ManifestResponse) {
    for line in format_manifest_output(response) {
        println!("{}", line);
    }
}
