//! Computes the `--version` string at build time.
//!
//! - on a release tag: the package version (`0.3.0`)
//! - elsewhere: `0.3.0-dev+<short hash>`, or `0.3.0-dev` outside a checkout

use std::process::Command;

fn git_succeeds(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let package = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let on_release_tag = git_succeeds(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    let version = if on_release_tag {
        package
    } else {
        match git_succeeds(&["rev-parse", "--short", "HEAD"]).filter(|h| !h.is_empty()) {
            Some(hash) => format!("{package}-dev+{hash}"),
            None => format!("{package}-dev"),
        }
    };

    println!("cargo:rustc-env=GALLERY_VERSION={version}");
}
