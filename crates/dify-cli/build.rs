//! Stamps the CLI version with the commit it was built from.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let version = env!("CARGO_PKG_VERSION");
    let version = match commit_hash() {
        Some(hash) => format!("{}+g{}", version, hash),
        None => version.to_string(),
    };

    println!("cargo:rustc-env=DIFY_VERSION={}", version);
}

/// Short hash of HEAD, or `None` outside a git checkout.
fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}
