use std::path::Path;

use anyhow::Context;
use uepkg::{package::Package, package::PackageRc, File};

/// Loads and deserializes the package file at `path`.
///
/// The logical package name is the file stem; the command line tools do not know the
/// mount layout of a loose file.
pub fn load_package(path: &Path) -> anyhow::Result<PackageRc> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Package")
        .to_string();

    let file = File::from_file(path)
        .with_context(|| format!("failed to read package: {}", path.display()))?;
    Package::deserialize(format!("/{name}"), file)
        .with_context(|| format!("failed to decode package: {}", path.display()))
}

/// Shortens long values for table cells.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
