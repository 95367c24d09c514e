//! The link stage.
//!
//! Linking resolves every object index in the import and export tables. Imports get their
//! full object path (`/Game/Dinos/Dodo/Dodo_Character_BP.Dodo_Character_BP_C`, with `:`
//! separating sub-objects) and, if the package they come from is already cached and
//! linked, a binding to the export they name. Exports get their class, super and outer
//! references and their own full path.
//!
//! Everything is computed into a [`LinkResult`] first; the package commits it only if the
//! whole stage succeeded.

use crate::{
    package::{
        exports::ExportLink, imports::ImportTarget, objects::ObjectRef, Package, PackageRc,
        Stage,
    },
    Error, Result,
};

/// Looks up other packages while linking.
///
/// Implemented by [`crate::loader::PackageLoader`], which answers from its cache without
/// loading anything.
pub trait ImportResolver {
    /// Returns the package called `name` if it is already loaded.
    fn linked_package(&self, name: &str) -> Option<PackageRc>;
}

/// A resolver that knows no other packages; every cross-package import stays external.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneResolver;

impl ImportResolver for StandaloneResolver {
    fn linked_package(&self, _name: &str) -> Option<PackageRc> {
        None
    }
}

/// Uncommitted output of the link stage.
pub(crate) struct LinkResult {
    pub(crate) import_paths: Vec<String>,
    pub(crate) import_targets: Vec<ImportTarget>,
    pub(crate) exports: Vec<ExportLink>,
}

pub(crate) fn link(package: &Package, resolver: &dyn ImportResolver) -> Result<LinkResult> {
    let imports = package.imports();
    let mut import_paths = Vec::with_capacity(imports.len());
    let mut roots = Vec::with_capacity(imports.len());
    for index in 0..imports.len() {
        let (path, root) = import_path(package, index)?;
        import_paths.push(path);
        roots.push(root);
    }

    let mut import_targets = Vec::with_capacity(imports.len());
    for (index, path) in import_paths.iter().enumerate() {
        let root = roots[index];
        if root == index {
            import_targets.push(ImportTarget::External);
            continue;
        }

        let owner = &imports[root].object_name;
        let target = match resolver.linked_package(owner) {
            Some(other) if other.stage() >= Stage::Linked => {
                let export = other
                    .exports()
                    .iter()
                    .find(|export| export.path().is_ok_and(|candidate| candidate == path.as_str()))
                    .ok_or_else(|| Error::UnresolvedReference {
                        package: package.name().to_string(),
                        index: import_index(index),
                        message: format!("'{path}' is not exported by '{owner}'"),
                    })?;
                ImportTarget::Export(export.clone())
            }
            _ => ImportTarget::External,
        };
        import_targets.push(target);
    }

    let mut exports = Vec::with_capacity(package.exports().len());
    for export in package.exports() {
        let what = |field: &str| format!("{} of export '{}'", field, export.name());
        let class = package.resolve_index(export.entry.class, &what("class"))?;
        let super_struct = package.resolve_index(export.entry.super_index, &what("super"))?;
        let outer = package.resolve_index(export.entry.outer, &what("outer"))?;

        let class_name = match class {
            ObjectRef::Null => "Class".to_string(),
            ObjectRef::Import(index) => imports[index].object_name.clone(),
            ObjectRef::Export(index) => package.exports()[index].name().to_string(),
        };

        exports.push(ExportLink {
            class,
            super_struct,
            outer,
            class_name,
            path: export_path(package, export.index, &import_paths)?,
        });
    }

    Ok(LinkResult {
        import_paths,
        import_targets,
        exports,
    })
}

/// Builds an import's path by walking its outer chain. Also returns the chain's root.
fn import_path(package: &Package, index: usize) -> Result<(String, usize)> {
    let imports = package.imports();
    let mut chain = vec![index];
    let mut current = index;

    loop {
        let outer = imports[current].outer;
        let what = format!("outer of import '{}'", imports[current].object_name);
        match package.resolve_index(outer, &what)? {
            ObjectRef::Null => break,
            ObjectRef::Import(next) => {
                if chain.len() > imports.len() {
                    return Err(malformed_error!(
                        "Import '{}' has a cyclic outer chain",
                        imports[index].object_name
                    ));
                }
                chain.push(next);
                current = next;
            }
            ObjectRef::Export(_) => {
                return Err(Error::UnresolvedReference {
                    package: package.name().to_string(),
                    index: outer.0,
                    message: what,
                });
            }
        }
    }

    let mut path = String::new();
    for (depth, &link) in chain.iter().rev().enumerate() {
        match depth {
            0 => {}
            1 => path.push('.'),
            _ => path.push(':'),
        }
        path.push_str(&imports[link].object_name);
    }

    Ok((path, current))
}

/// Builds an export's path: `{package}.{name}` for top-level objects, `{outer}:{name}`
/// below that.
fn export_path(package: &Package, index: usize, import_paths: &[String]) -> Result<String> {
    let exports = package.exports();
    let mut chain = vec![index];
    let mut current = index;
    let mut prefix = None;

    loop {
        let outer = exports[current].entry.outer;
        let what = format!("outer of export '{}'", exports[current].name());
        match package.resolve_index(outer, &what)? {
            ObjectRef::Null => break,
            ObjectRef::Export(next) => {
                if chain.len() > exports.len() {
                    return Err(malformed_error!(
                        "Export '{}' has a cyclic outer chain",
                        exports[index].name()
                    ));
                }
                chain.push(next);
                current = next;
            }
            ObjectRef::Import(import) => {
                prefix = Some(import_paths[import].clone());
                break;
            }
        }
    }

    let mut names = chain.iter().rev().map(|&link| exports[link].name());
    let mut path = match prefix {
        Some(prefix) => prefix,
        None => {
            let top = names.next().unwrap_or_default();
            format!("{}.{}", package.name(), top)
        }
    };
    for name in names {
        path.push(':');
        path.push_str(name);
    }

    Ok(path)
}

fn import_index(index: usize) -> i32 {
    i32::try_from(index).map_or(i32::MIN, |index| -index - 1)
}
