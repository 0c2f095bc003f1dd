//! Service configuration.
//!
//! Handles loading, validating, and merging the `gallery.toml` file. Stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [directories]
//! original = "public/images"  # Tree holding the original photographs
//! alternate = "webp"          # Subdirectory of `original` with converted siblings
//!
//! [formats]
//! prefer_alternate = true     # Serve the alternate directory when it has images
//!
//! [processing]
//! max_processes = 8           # Max parallel extraction workers (omit for auto)
//!
//! [extraction]
//! timeout_ms = 300            # Soft per-file deadline for metadata extraction
//! max_header_bytes = 262144   # Bytes read before falling back to a whole-file read
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gallery.toml";

/// Upper bound on the automatic worker count. Extraction is I/O bound, so
/// more workers than this stop paying off.
const MAX_AUTO_WORKERS: usize = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `gallery.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Where the original and converted images live.
    pub directories: DirectoriesConfig,
    /// Alternate-format preferences.
    pub formats: FormatsConfig,
    /// Parallel extraction settings.
    pub processing: ProcessingConfig,
    /// Metadata extraction limits.
    pub extraction: ExtractionConfig,
}

impl ManifestConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let alternate = Path::new(&self.directories.alternate);
        let single_component = alternate.components().count() == 1
            && alternate.file_name().is_some_and(|n| n == alternate.as_os_str());
        if self.directories.alternate.is_empty() || !single_component {
            return Err(ConfigError::Validation(
                "directories.alternate must be a single directory name".into(),
            ));
        }
        if self.directories.alternate.starts_with('.') {
            return Err(ConfigError::Validation(
                "directories.alternate must not be a hidden name".into(),
            ));
        }
        if self.directories.original.is_empty() {
            return Err(ConfigError::Validation(
                "directories.original must not be empty".into(),
            ));
        }
        if self.extraction.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "extraction.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.extraction.max_header_bytes < MIN_HEADER_BYTES {
            return Err(ConfigError::Validation(format!(
                "extraction.max_header_bytes must be at least {MIN_HEADER_BYTES}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Point `directories.original` somewhere else (the `--source` flag) and
    /// validate the result.
    pub fn with_original(mut self, original: &Path) -> Result<Self, ConfigError> {
        self.directories.original = original.to_string_lossy().to_string();
        self.validate()?;
        Ok(self)
    }

    /// Absolute-or-relative path of the original image tree.
    pub fn original_dir(&self) -> PathBuf {
        PathBuf::from(&self.directories.original)
    }

    /// Path of the alternate-format directory, nested under the original tree.
    pub fn alternate_dir(&self) -> PathBuf {
        self.original_dir().join(&self.directories.alternate)
    }
}

/// Directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoriesConfig {
    /// Directory holding the original photographs.
    pub original: String,
    /// Name of the subdirectory of `original` holding converted siblings.
    pub alternate: String,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            original: "public/images".to_string(),
            alternate: "webp".to_string(),
        }
    }
}

/// Alternate-format preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    /// When false the alternate directory is never consulted.
    pub prefer_alternate: bool,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            prefer_alternate: true,
        }
    }
}

/// Parallel extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel extraction workers.
    /// When absent, defaults to the number of CPU cores (at most 16).
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → `min(cores, 16)`
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.min(cores))
        .unwrap_or_else(|| cores.min(MAX_AUTO_WORKERS))
        .max(1)
}

const MIN_HEADER_BYTES: usize = 4096;

/// Metadata extraction limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Soft per-file deadline in milliseconds.
    pub timeout_ms: u64,
    /// How much of each file is read before the parser gives up on the
    /// header region and reads the whole file.
    pub max_header_bytes: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 300,
            max_header_bytes: 256 * 1024,
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    // `max_processes = None` is simply omitted by the serializer.
    toml::Value::try_from(ManifestConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ManifestConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ManifestConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<ManifestConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Manifest Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Directory layout
# ---------------------------------------------------------------------------
[directories]
# Directory holding the original photographs.
original = "public/images"

# Subdirectory of `original` holding pre-converted WebP siblings
# (<stem>.webp). It is never listed as part of the original tree.
alternate = "webp"

# ---------------------------------------------------------------------------
# Formats
# ---------------------------------------------------------------------------
[formats]
# Serve the alternate directory whenever it holds at least one image.
prefer_alternate = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel metadata-extraction workers.
# Omit or comment out to auto-detect (= CPU cores, at most 16).
# max_processes = 8

# ---------------------------------------------------------------------------
# Metadata extraction
# ---------------------------------------------------------------------------
[extraction]
# Soft per-file deadline in milliseconds. A file that takes longer is
# ordered by its modification time instead.
timeout_ms = 300

# Bytes read from the start of each file when looking for the EXIF segment.
max_header_bytes = 262144
"##
}
