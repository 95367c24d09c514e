//! Writing export documents.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde_json::Value;

use crate::Result;

/// Turns an arbitrary string into a safe file name.
///
/// Surrounding whitespace is dropped, inner spaces become underscores, and everything
/// except alphanumerics, `-`, `_` and `.` is removed.
#[must_use]
pub fn valid_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|&c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Sanitises every component of a relative path with [`valid_filename`].
///
/// Components that end up empty, or are `.` / `..`, are dropped.
#[must_use]
pub fn clean_relative_path(path: &Path) -> PathBuf {
    path.iter()
        .filter_map(|part| part.to_str())
        .map(valid_filename)
        .filter(|part| !part.is_empty() && part != "." && part != "..")
        .collect()
}

/// Serialises `value` and writes it to `path` unless the file already holds exactly that.
///
/// Returns `true` if the file was written.
///
/// # Errors
/// Returns [`crate::Error::Json`] or [`crate::Error::FileError`].
pub fn save_json_if_changed(value: &Value, path: &Path, pretty: bool) -> Result<bool> {
    let mut content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    content.push('\n');

    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        debug!("Unchanged: {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!("Saved {}", path.display());
    Ok(true)
}

/// Deletes `path` if it is a file. Returns `true` if something was deleted.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the file exists but cannot be removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }

    fs::remove_file(path)?;
    info!("Removed empty {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filenames() {
        assert_eq!(valid_filename(" john's portrait in 2004.jpg"), "johns_portrait_in_2004.jpg");
        assert_eq!(valid_filename("Primal/Earth?"), "PrimalEarth");
        assert_eq!(
            clean_relative_path(Path::new("839162288-Super Structures/items.json")),
            PathBuf::from("839162288-Super_Structures").join("items.json")
        );
        assert_eq!(
            clean_relative_path(Path::new("../x.json")),
            PathBuf::from("x.json")
        );
    }

    #[test]
    fn save_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let value = json!({"version": "1.0", "items": [1, 2]});

        assert!(save_json_if_changed(&value, &path, true).unwrap());
        assert!(!save_json_if_changed(&value, &path, true).unwrap());
        assert!(save_json_if_changed(&value, &path, false).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\"version\":\"1.0\",\"items\":[1,2]}\n"
        );

        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
