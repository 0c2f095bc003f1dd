//! End-to-end tests through the public API: config → builder → response.
//!
//! Run with: cargo test --test manifest_pipeline

use gallery_manifest::config::{ManifestConfig, load_config};
use gallery_manifest::manifest::{FailureReason, OrderingBasis, ServiceStatus};
use gallery_manifest::negotiate::{ChosenDirectory, SelectionReason};
use gallery_manifest::{ManifestBuilder, naming};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Minimal JPEG: SOI, APP1 with a little-endian TIFF block holding only
/// DateTimeOriginal, then SOS/EOI.
fn jpeg_taken_at(datetime: &str) -> Vec<u8> {
    let mut value = datetime.as_bytes().to_vec();
    value.push(0);

    // IFD0 at 8 (one entry: Exif pointer), Exif IFD at 26, string data at 44
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2A\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(tiff.len(), 44);
    tiff.extend_from_slice(&value);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&payload);
    jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x00, 0xFF, 0xD9]);
    jpeg
}

fn jpeg_without_metadata() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x00, 0xFF, 0xD9]
}

/// Seconds since the epoch for midnight UTC of a few fixed days.
fn day(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

const JUN_1_2023: u64 = 1_685_577_600;
const JAN_1_2024: u64 = 1_704_067_200;

fn write(dir: &Path, name: &str, bytes: &[u8], modified: SystemTime) {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

fn builder_for(original: &Path) -> ManifestBuilder {
    let mut config = ManifestConfig::default();
    config.directories.original = original.to_string_lossy().to_string();
    ManifestBuilder::new(config)
}

#[test]
fn trusted_dates_first_then_mtime() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write(dir, "a.jpg", &jpeg_taken_at("2022:01:01 00:00:00"), day(JAN_1_2024));
    write(dir, "b.jpg", &jpeg_without_metadata(), day(JUN_1_2023));
    write(dir, "c.jpg", &jpeg_taken_at("2022:06:01 00:00:00"), day(JAN_1_2024));

    let response = builder_for(dir).build();

    assert_eq!(response.status.http_status(), 200);
    assert_eq!(
        response.manifest.ordered_filenames(),
        vec!["c.jpg", "a.jpg", "b.jpg"]
    );
    assert_eq!(
        response.manifest.directory_selection.chosen_directory,
        ChosenDirectory::Original
    );
    assert_eq!(
        response.manifest.ordering_basis,
        OrderingBasis::MetadataTimestamp
    );

    let body = serde_json::to_value(response.body()).unwrap();
    assert_eq!(body["images"], serde_json::json!(["c.jpg", "a.jpg", "b.jpg"]));
    assert_eq!(body["format"], "original");
    assert_eq!(body["directory"], "images");
    assert_eq!(body["sortBy"], "exif-datetime");
}

#[test]
fn hidden_and_unrecognized_files_never_appear() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write(dir, ".DS_Store", b"junk", day(JAN_1_2024));
    write(dir, "notes.txt", b"text", day(JAN_1_2024));
    write(dir, "shot.JPG", &jpeg_taken_at("2021:03:03 03:03:03"), day(JUN_1_2023));

    let response = builder_for(dir).build();
    assert_eq!(response.manifest.ordered_filenames(), vec!["shot.JPG"]);
}

#[test]
fn converted_siblings_replace_originals_wholesale() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    write(dir, "a.jpg", &jpeg_taken_at("2022:01:01 00:00:00"), day(JAN_1_2024));
    write(dir, "b.jpg", &jpeg_taken_at("2022:02:01 00:00:00"), day(JAN_1_2024));
    fs::create_dir(dir.join("webp")).unwrap();
    write(&dir.join("webp"), "a.webp", b"RIFF", day(JUN_1_2023));

    let response = builder_for(dir).build();
    let selection = response.manifest.directory_selection;
    assert_eq!(selection.chosen_directory, ChosenDirectory::Alternate);
    assert_eq!(selection.reason, SelectionReason::AlternateNonempty);
    // Only the alternate directory's contents, even though b.jpg has no sibling
    assert_eq!(response.manifest.ordered_filenames(), vec!["a.webp"]);
    assert_eq!(response.body().format, "webp");
}

#[test]
fn config_file_drives_the_builder() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("photos");
    fs::create_dir(&images).unwrap();
    write(&images, "a.png", b"png", day(JUN_1_2023));

    let config_path = tmp.path().join("gallery.toml");
    fs::write(
        &config_path,
        format!(
            "[directories]\noriginal = {:?}\n\n[processing]\nmax_processes = 1\n",
            images.to_string_lossy()
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let response = ManifestBuilder::new(config).build();
    assert_eq!(response.manifest.ordered_filenames(), vec!["a.png"]);
    assert_eq!(
        response.manifest.ordering_basis,
        OrderingBasis::FilesystemTimestamp
    );
    assert!(response.body().sort_by.is_none());
}

#[test]
fn resolve_maps_original_to_sibling() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir(dir.join("webp")).unwrap();
    write(dir, "a.jpg", b"x", day(JUN_1_2023));
    write(&dir.join("webp"), "a.webp", b"x", day(JUN_1_2023));

    let mut config = ManifestConfig::default();
    config.directories.original = dir.to_string_lossy().to_string();
    assert_eq!(
        naming::resolve_preferred(&config, "a.jpg"),
        dir.join("webp").join("a.webp")
    );

    config.formats.prefer_alternate = false;
    assert_eq!(naming::resolve_preferred(&config, "a.jpg"), dir.join("a.jpg"));
}

#[test]
fn missing_directory_is_an_empty_gallery() {
    let tmp = TempDir::new().unwrap();
    let response = builder_for(&tmp.path().join("not-there")).build();

    assert_eq!(response.status.http_status(), 200);
    let body = serde_json::to_value(response.body()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "images": [], "format": "none", "directory": "none" })
    );
}

#[test]
fn file_configured_as_directory_answers_500() {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("images");
    write(tmp.path(), "images", b"not a directory", day(JAN_1_2024));

    let response = builder_for(&images).build();

    assert_eq!(response.status.http_status(), 500);
    assert!(matches!(
        response.status,
        ServiceStatus::Degraded(FailureReason::DirectoryUnreadable { .. })
    ));
    let body = serde_json::to_value(response.body()).unwrap();
    assert_eq!(body["images"], serde_json::json!([]));
    assert!(body.get("sortBy").is_none());
}

#[cfg(unix)]
#[test]
fn unreadable_directory_answers_500_with_empty_images() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("images");
    fs::create_dir(&images).unwrap();
    write(&images, "a.jpg", &jpeg_taken_at("2022:01:01 00:00:00"), day(JAN_1_2024));
    fs::set_permissions(&images, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind root
    let enforced = fs::read_dir(&images).is_err();
    let response = builder_for(&images).build();
    fs::set_permissions(&images, fs::Permissions::from_mode(0o755)).unwrap();
    if !enforced {
        return;
    }

    assert_eq!(response.status.http_status(), 500);
    assert!(!response.status.is_ok());
    assert!(response.body().images.is_empty());
}
