//! Sets `TALLY_BUILD_SHA` for `--version`.
//!
//! An explicit `TALLY_BUILD_SHA` in the build environment wins, for source
//! tarballs and packaging builds without a git checkout. Otherwise the value
//! comes from `git describe`, marked `-dirty` when the tree has local changes.

use std::env;
use std::path::Path;
use std::process::Command;

const OVERRIDE_VAR: &str = "TALLY_BUILD_SHA";

fn main() {
    println!("cargo:rerun-if-env-changed={OVERRIDE_VAR}");

    let version = match env::var(OVERRIDE_VAR) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => describe_checkout().unwrap_or_else(|| "unknown".to_string()),
    };
    println!("cargo:rustc-env={OVERRIDE_VAR}={version}");
}

fn describe_checkout() -> Option<String> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").ok()?;
    let workspace_root = Path::new(&manifest_dir).parent()?;

    let git_dir = workspace_root.join(".git");
    if !git_dir.exists() {
        return None;
    }
    println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
    println!("cargo:rerun-if-changed={}", git_dir.join("index").display());

    let output = Command::new("git")
        .current_dir(workspace_root)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}
