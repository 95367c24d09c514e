//! Hierarchy export: one JSON document per class and output unit.
//!
//! An export stage ([`HierarchyExport`]) names a class, turns each proxy instance of that
//! class (and its registered subclasses) into an optional JSON item, and may add metadata
//! before and aggregate data after the item list. [`extract_and_save`] runs a stage over a
//! sequence of instances and writes
//!
//! ```json
//! { "version": "...", "format": "...", ...pre_data, "<field>": [items], ...post_data }
//! ```
//!
//! The document is only written when the item list is non-empty or the post-data holds
//! something; otherwise a previously written document at that path is removed. Unchanged
//! documents are not rewritten.

pub mod output;

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{json, Map, Value};

use crate::{
    loader::PackageLoader,
    proxy::{ProxyInstance, SchemaRegistry},
    Result,
};

/// What a document is produced for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportUnit {
    /// The base game content
    Core,
    /// One mod
    Mod {
        /// Mod identifier, also its directory name below the mods directory
        id: String,
        /// Short mod name
        tag: String,
        /// Display title, if different from the tag
        title: Option<String>,
    },
}

impl ExportUnit {
    /// The mod identifier, for mod units.
    #[must_use]
    pub fn mod_id(&self) -> Option<&str> {
        match self {
            ExportUnit::Core => None,
            ExportUnit::Mod { id, .. } => Some(id),
        }
    }
}

/// Result of writing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The document was written
    Written,
    /// The document already had this content
    Unchanged,
    /// The output was empty and a stale document was deleted
    Removed,
    /// The output was empty and there was nothing to delete
    Skipped,
}

/// One kind of exported document.
pub trait HierarchyExport {
    /// Name of the stage.
    fn name(&self) -> &str;

    /// Key of the item list in the document. Defaults to [`HierarchyExport::name`].
    fn field(&self) -> &str {
        self.name()
    }

    /// Format version written into the document.
    fn format_version(&self) -> &str;

    /// Whether to indent the document.
    fn use_pretty(&self) -> bool;

    /// Type identifier of the class to gather.
    fn ue_type(&self) -> &str;

    /// Turns one instance into an item. `None` (or an empty value) skips the instance.
    ///
    /// # Errors
    /// Any error returned here aborts the run.
    fn extract(&mut self, proxy: &ProxyInstance) -> Result<Option<Value>>;

    /// Entries placed before the item list. They never make a document non-empty.
    ///
    /// Defaults to the mod's metadata for mod units.
    fn pre_data(&self, unit: &ExportUnit) -> Map<String, Value> {
        let mut pre = Map::new();
        if let ExportUnit::Mod { id, tag, title } = unit {
            pre.insert(
                "mod".to_string(),
                json!({ "id": id, "tag": tag, "title": title.as_deref().unwrap_or(tag) }),
            );
        }
        pre
    }

    /// Entries placed after the item list, computed from the gathered items. Any truthy
    /// entry keeps the document from being considered empty.
    fn post_data(&self, _unit: &ExportUnit, _results: &[Value]) -> Map<String, Value> {
        Map::new()
    }

    /// Path of the core document, relative to the output root.
    fn core_file_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.json", self.field()))
    }

    /// Path of a mod's document, relative to the output root.
    fn mod_file_path(&self, id: &str, tag: &str) -> PathBuf {
        PathBuf::from(format!("{id}-{tag}")).join(format!("{}.json", self.field()))
    }

    /// Path of the document for `unit`, relative to the output root.
    fn file_path(&self, unit: &ExportUnit) -> PathBuf {
        match unit {
            ExportUnit::Core => self.core_file_path(),
            ExportUnit::Mod { id, tag, .. } => self.mod_file_path(id, tag),
        }
    }
}

/// Builds the version stamp of a document from the game version and a build number or
/// mod change stamp.
#[must_use]
pub fn create_export_version(game_version: &str, build_or_change: &str) -> String {
    format!("{game_version}.{build_or_change}")
}

/// Returns `true` for values that count as content: anything but `null`, `false`, zero
/// and empty strings, arrays or objects.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Runs `stage` over `proxies` and saves (or removes) the resulting document at
/// `base_path/relative_path`, with every path component sanitised.
///
/// # Errors
/// Propagates the first failing instance, any error from [`HierarchyExport::extract`] and
/// I/O errors.
pub fn extract_and_save<E, I>(
    stage: &mut E,
    version: &str,
    unit: &ExportUnit,
    base_path: &Path,
    relative_path: &Path,
    proxies: I,
) -> Result<ExportOutcome>
where
    E: HierarchyExport + ?Sized,
    I: IntoIterator<Item = Result<ProxyInstance>>,
{
    let output_path = base_path.join(output::clean_relative_path(relative_path));

    let mut document = Map::new();
    document.insert("version".to_string(), Value::from(version));
    document.insert("format".to_string(), Value::from(stage.format_version()));
    document.extend(stage.pre_data(unit));

    let mut results = Vec::new();
    for proxy in proxies {
        let proxy = proxy?;
        if let Some(item) = stage.extract(&proxy)? {
            if is_truthy(&item) {
                results.push(item);
            }
        }
    }

    let post = stage.post_data(unit, &results);
    let post_has_content = post.values().any(is_truthy);
    let has_results = !results.is_empty();
    debug!(
        "{}: {} items for {}",
        stage.name(),
        results.len(),
        output_path.display()
    );

    document.insert(stage.field().to_string(), Value::Array(results));
    document.extend(post);

    if has_results || post_has_content {
        let written =
            output::save_json_if_changed(&Value::Object(document), &output_path, stage.use_pretty())?;
        Ok(if written {
            ExportOutcome::Written
        } else {
            ExportOutcome::Unchanged
        })
    } else if output::remove_if_exists(&output_path)? {
        Ok(ExportOutcome::Removed)
    } else {
        Ok(ExportOutcome::Skipped)
    }
}

/// Runs export stages against a loader and schema registry.
pub struct ExportRunner<'a> {
    loader: &'a PackageLoader,
    registry: &'a SchemaRegistry,
    base_path: PathBuf,
}

impl<'a> ExportRunner<'a> {
    /// Creates a runner writing below `base_path`.
    pub fn new(
        loader: &'a PackageLoader,
        registry: &'a SchemaRegistry,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        ExportRunner {
            loader,
            registry,
            base_path: base_path.into(),
        }
    }

    /// Exports the base game content.
    ///
    /// # Errors
    /// See [`extract_and_save`].
    pub fn run_core<E>(&self, stage: &mut E, version: &str) -> Result<ExportOutcome>
    where
        E: HierarchyExport + ?Sized,
    {
        self.run(stage, version, &ExportUnit::Core)
    }

    /// Exports one mod.
    ///
    /// # Errors
    /// See [`extract_and_save`].
    pub fn run_mod<E>(&self, stage: &mut E, version: &str, unit: &ExportUnit) -> Result<ExportOutcome>
    where
        E: HierarchyExport + ?Sized,
    {
        self.run(stage, version, unit)
    }

    fn run<E>(&self, stage: &mut E, version: &str, unit: &ExportUnit) -> Result<ExportOutcome>
    where
        E: HierarchyExport + ?Sized,
    {
        let relative = stage.file_path(unit);
        let ue_type = stage.ue_type().to_string();
        let proxies = self.loader.instances_of_type(self.registry, &ue_type, unit)?;
        extract_and_save(stage, version, unit, &self.base_path, &relative, proxies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Names;

    impl HierarchyExport for Names {
        fn name(&self) -> &str {
            "names"
        }
        fn format_version(&self) -> &str {
            "1"
        }
        fn use_pretty(&self) -> bool {
            false
        }
        fn ue_type(&self) -> &str {
            "Thing"
        }
        fn extract(&mut self, _proxy: &ProxyInstance) -> Result<Option<Value>> {
            Ok(None)
        }
    }

    #[test]
    fn paths_and_metadata() {
        let stage = Names;
        assert_eq!(stage.core_file_path(), PathBuf::from("names.json"));
        let unit = ExportUnit::Mod {
            id: "123".into(),
            tag: "Eco".into(),
            title: None,
        };
        assert_eq!(stage.file_path(&unit), PathBuf::from("123-Eco").join("names.json"));
        assert_eq!(
            Value::Object(stage.pre_data(&unit)),
            json!({"mod": {"id": "123", "tag": "Eco", "title": "Eco"}})
        );
        assert!(stage.pre_data(&ExportUnit::Core).is_empty());
        assert_eq!(unit.mod_id(), Some("123"));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!(0.5)));
        assert_eq!(create_export_version("358.17", "4519323"), "358.17.4519323");
    }
}
