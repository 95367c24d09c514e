use std::path::Path;

use anyhow::bail;
use serde::Serialize;
use uepkg::{
    package::{Package, Stage, StandaloneResolver},
    LoaderConfig,
};

use crate::{
    app::GlobalOptions,
    commands::common::{load_package, truncate},
    output::{print_output, print_table},
};

#[derive(Debug, Serialize)]
struct NameRow {
    index: usize,
    name: String,
    hash: String,
}

#[derive(Debug, Serialize)]
struct ImportRow {
    index: i32,
    class: String,
    outer: i32,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportRow {
    index: i32,
    class: String,
    outer: i32,
    name: String,
    offset: usize,
    size: usize,
    flags: String,
}

#[derive(Debug, Default, Serialize)]
struct TablesOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    names: Vec<NameRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    imports: Vec<ImportRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exports: Vec<ExportRow>,
}

/// Class column: the linked class name, or the raw object index before linking.
fn class_of(package: &Package, index: usize) -> String {
    let export = &package.exports()[index];
    export
        .class_name()
        .map_or_else(|_| export.entry.class.0.to_string(), str::to_string)
}

pub fn run(path: &Path, table: Option<&str>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    if let Err(error) =
        package.advance_to(Stage::Linked, &StandaloneResolver, &LoaderConfig::default())
    {
        log::warn!("{error}");
    }

    let (names, imports, exports) = match table.map(str::to_ascii_lowercase).as_deref() {
        None => (true, true, true),
        Some("names") => (true, false, false),
        Some("imports") => (false, true, false),
        Some("exports") => (false, false, true),
        Some(other) => bail!("unknown table '{other}' (expected names, imports, or exports)"),
    };

    let mut output = TablesOutput::default();
    if names {
        output.names = package
            .names()
            .iter()
            .enumerate()
            .map(|(index, entry)| NameRow {
                index,
                name: entry.name.clone(),
                hash: format!("0x{:08X}", entry.hash),
            })
            .collect();
    }
    if imports {
        output.imports = package
            .imports()
            .iter()
            .map(|import| ImportRow {
                index: -(import.index as i32) - 1,
                class: format!("{}.{}", import.class_package, import.class_name),
                outer: import.outer.0,
                name: import.object_name.clone(),
                path: import.full_path().map(str::to_string),
            })
            .collect();
    }
    if exports {
        output.exports = package
            .exports()
            .iter()
            .map(|export| ExportRow {
                index: export.index as i32 + 1,
                class: class_of(&package, export.index),
                outer: export.entry.outer.0,
                name: export.name().to_string(),
                offset: export.entry.serial_offset,
                size: export.entry.serial_size,
                flags: format!("{:?}", export.entry.export_flags),
            })
            .collect();
    }

    print_output(&output, opts, |output| {
        if !output.names.is_empty() {
            let rows = output
                .names
                .iter()
                .map(|row| vec![row.index.to_string(), row.name.clone(), row.hash.clone()])
                .collect();
            print_table(Some("Names"), &["#", "Name", "Hash"], rows);
            println!();
        }

        if !output.imports.is_empty() {
            let rows = output
                .imports
                .iter()
                .map(|row| {
                    vec![
                        row.index.to_string(),
                        row.class.clone(),
                        row.outer.to_string(),
                        row.name.clone(),
                        truncate(row.path.as_deref().unwrap_or("-"), 80),
                    ]
                })
                .collect();
            print_table(Some("Imports"), &["#", "Class", "Outer", "Name", "Path"], rows);
            println!();
        }

        if !output.exports.is_empty() {
            let rows = output
                .exports
                .iter()
                .map(|row| {
                    vec![
                        row.index.to_string(),
                        row.class.clone(),
                        row.outer.to_string(),
                        row.name.clone(),
                        format!("0x{:X}", row.offset),
                        row.size.to_string(),
                        row.flags.clone(),
                    ]
                })
                .collect();
            print_table(
                Some("Exports"),
                &["#", "Class", "Outer", "Name", "Offset", "Size", "Flags"],
                rows,
            );
        }
    })
}
