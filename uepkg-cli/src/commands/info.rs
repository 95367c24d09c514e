use std::path::Path;

use serde::Serialize;
use uepkg::{
    package::{Stage, StandaloneResolver},
    LoaderConfig,
};

use crate::{
    app::GlobalOptions,
    commands::common::load_package,
    output::print_output,
};

#[derive(Debug, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub size: usize,
    pub legacy_version: i32,
    pub file_version: i32,
    pub folder_name: String,
    pub flags: String,
    pub name_count: usize,
    pub import_count: usize,
    pub export_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_export: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_data_start: Option<usize>,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_error: Option<String>,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;

    // Linking on its own only needs the tables; report a failure instead of aborting
    let link_error = package
        .advance_to(Stage::Linked, &StandaloneResolver, &LoaderConfig::default())
        .err()
        .map(|error| error.to_string());

    let header = package.header();
    let info = PackageInfo {
        name: package.name().to_string(),
        size: package.file().len(),
        legacy_version: header.legacy_version,
        file_version: header.file_version,
        folder_name: header.folder_name.clone(),
        flags: format!("{:?}", header.flags),
        name_count: package.names().len(),
        import_count: package.imports().len(),
        export_count: package.exports().len(),
        default_export: package.default_export().map(|export| export.name().to_string()),
        bulk_data_start: header.bulk_data_start(),
        stage: package.stage().to_string(),
        link_error,
    };

    print_output(&info, opts, |info| {
        println!("Package: {}", info.name);
        field("Size", format!("{} bytes", info.size));
        field(
            "Version",
            format!("{} (legacy {})", info.file_version, info.legacy_version),
        );
        field("Folder", &info.folder_name);
        field("Flags", &info.flags);
        field("Names", info.name_count);
        field("Imports", info.import_count);
        field("Exports", info.export_count);
        if let Some(default_export) = &info.default_export {
            field("Default export", default_export);
        }
        if let Some(start) = info.bulk_data_start {
            field("Bulk data", format!("0x{start:X}"));
        }
        field("Stage", &info.stage);
        if let Some(error) = &info.link_error {
            field("Link error", error);
        }
    })
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<18} {}", format!("{label}:"), value);
}
