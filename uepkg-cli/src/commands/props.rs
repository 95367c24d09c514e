use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;
use uepkg::{
    package::{Stage, StandaloneResolver},
    LoaderConfig,
};

use crate::{app::GlobalOptions, commands::common::load_package};

pub struct PropsOptions<'a> {
    pub export: Option<&'a str>,
    pub bulk: bool,
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct BulkInfo {
    flags: String,
    elements: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<(usize, usize)>,
}

#[derive(Debug, Serialize)]
struct ExportProps {
    name: String,
    class: String,
    path: String,
    properties: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    bulk_data: Option<BulkInfo>,
}

pub fn run(path: &Path, options: &PropsOptions, opts: &GlobalOptions) -> anyhow::Result<()> {
    let package = load_package(path)?;
    let config = if options.strict {
        LoaderConfig::strict()
    } else {
        LoaderConfig::default()
    };
    let target = if options.bulk {
        Stage::BulkDataParsed
    } else {
        Stage::PropertiesParsed
    };
    package
        .advance_to(target, &StandaloneResolver, &config)
        .with_context(|| format!("failed to decode properties of {}", package.name()))?;

    let exports: Vec<_> = package
        .exports()
        .iter()
        .filter(|export| options.export.is_none_or(|name| export.name() == name))
        .collect();
    if let (Some(name), true) = (options.export, exports.is_empty()) {
        bail!("no export named '{name}' in {}", package.name());
    }

    let mut output = Vec::with_capacity(exports.len());
    for export in &exports {
        let bulk = if options.bulk { export.bulk_data()? } else { None };
        let bulk_data = bulk.map(|bulk| BulkInfo {
            flags: format!("{:?}", bulk.flags),
            elements: bulk.element_count,
            size: bulk.size_on_disk,
            payload: bulk.payload.clone().map(|range| (range.start, range.len())),
        });
        output.push(ExportProps {
            name: export.name().to_string(),
            class: export.class_name()?.to_string(),
            path: export.path()?.to_string(),
            properties: serde_json::to_value(export.properties()?)?,
            bulk_data,
        });
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (export, props) in exports.iter().zip(&output) {
        println!("{} ({})", props.path, props.class);
        for property in export.properties()? {
            println!(
                "  {}[{}]: {} = {}",
                property.name, property.index, property.type_name, property.value
            );
        }
        if let Some(bulk) = &props.bulk_data {
            match bulk.payload {
                Some((offset, len)) => {
                    println!("  bulk data: {len} bytes at 0x{offset:X} ({})", bulk.flags);
                }
                None => println!("  bulk data: no payload ({})", bulk.flags),
            }
        }
        println!();
    }
    Ok(())
}
