use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use uepkg::{
    context::ParsingDepth,
    export::ExportUnit,
    loader::{DirectorySource, PackageLoader},
    LoaderConfig,
};

use crate::{
    app::GlobalOptions,
    output::{print_output, print_table},
};

#[derive(Debug, Serialize)]
struct PackageEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    exports: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(root: &Path, mod_id: Option<&str>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let config = LoaderConfig::default();
    let loader = PackageLoader::new(DirectorySource::with_config(root, &config), config);

    let unit = match mod_id {
        Some(id) => ExportUnit::Mod {
            id: id.to_string(),
            tag: id.to_string(),
            title: None,
        },
        None => ExportUnit::Core,
    };
    let names = loader
        .discover(&unit)
        .with_context(|| format!("failed to list packages below {}", root.display()))?;

    // Tables only; the listing never decodes object bodies
    let entries: Vec<PackageEntry> = names
        .into_iter()
        .map(|name| match loader.fetch(&name, ParsingDepth::TABLES) {
            Ok(package) => PackageEntry {
                name,
                exports: Some(package.exports().len()),
                error: None,
            },
            Err(error) => PackageEntry {
                name,
                exports: None,
                error: Some(error.to_string()),
            },
        })
        .collect();

    print_output(&entries, opts, |entries| {
        let rows = entries
            .iter()
            .map(|entry| {
                let exports = match (&entry.exports, &entry.error) {
                    (Some(count), _) => count.to_string(),
                    (None, Some(error)) => format!("error: {error}"),
                    (None, None) => "-".to_string(),
                };
                vec![entry.name.clone(), exports]
            })
            .collect();
        print_table(None, &["Package", "Exports"], rows);
        println!("\n{} packages", entries.len());
    })
}
