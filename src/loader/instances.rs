use std::{collections::VecDeque, vec};

use log::{debug, trace};

use crate::{
    context::{DepthRequest, ParsingContext},
    loader::PackageLoader,
    package::{exports::ExportRc, Package},
    proxy::{ProxyInstance, SchemaRegistry},
    Result,
};

/// Lazy iterator over the proxy instances of one type.
///
/// Packages are fetched one at a time, linked and with properties, as the iterator is
/// advanced. Every export whose class is registered as the requested type or one of its
/// subtypes yields an instance of the schema registered for its own class, with its decoded
/// properties overlaid. A package that fails to decode yields its error and iteration goes on
/// with the next package.
pub struct Instances<'l> {
    loader: &'l PackageLoader,
    registry: &'l SchemaRegistry,
    ue_type: String,
    names: vec::IntoIter<String>,
    pending: VecDeque<(String, ExportRc)>,
}

impl<'l> Instances<'l> {
    pub(crate) fn new(
        loader: &'l PackageLoader,
        registry: &'l SchemaRegistry,
        ue_type: &str,
        names: Vec<String>,
    ) -> Self {
        debug!("Gathering {} from {} packages", ue_type, names.len());
        Instances {
            loader,
            registry,
            ue_type: ue_type.to_string(),
            names: names.into_iter(),
            pending: VecDeque::new(),
        }
    }

    /// The requested type identifier.
    #[must_use]
    pub fn ue_type(&self) -> &str {
        &self.ue_type
    }

    /// Number of packages not yet visited.
    #[must_use]
    pub fn packages_left(&self) -> usize {
        self.names.len()
    }

    /// The registered schema key an export's class matches, if any.
    fn schema_key(&self, package: &Package, export: &ExportRc) -> Result<Option<String>> {
        let link = export.link()?;
        let candidates = package
            .object_path(link.class)
            .into_iter()
            .chain(std::iter::once(link.class_name.clone()));

        for key in candidates {
            if key == self.ue_type || self.registry.is_subtype(&key, &self.ue_type) {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn queue_package(&mut self, name: &str) -> Result<()> {
        let depth = DepthRequest::new()
            .link(true)
            .properties(true)
            .within(ParsingContext::current());
        let package = self.loader.fetch(name, depth)?;

        for export in package.exports() {
            if let Some(key) = self.schema_key(&package, export)? {
                trace!("{}: '{}' matches {}", package.name(), export.name(), key);
                self.pending.push_back((key, export.clone()));
            }
        }
        Ok(())
    }

    fn instance(&self, key: &str, export: &ExportRc) -> Result<Option<ProxyInstance>> {
        let Some(mut proxy) = self.registry.proxy_for_type(key) else {
            return Ok(None);
        };

        proxy.update(export.properties()?.field_map());
        proxy.set_source(export);
        Ok(Some(proxy))
    }
}

impl Iterator for Instances<'_> {
    type Item = Result<ProxyInstance>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some((key, export)) = self.pending.pop_front() {
                match self.instance(&key, &export) {
                    Ok(Some(proxy)) => return Some(Ok(proxy)),
                    Ok(None) => continue,
                    Err(error) => return Some(Err(error)),
                }
            }

            let name = self.names.next()?;
            if let Err(error) = self.queue_package(&name) {
                return Some(Err(error));
            }
        }
    }
}

impl std::fmt::Debug for Instances<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instances")
            .field("ue_type", &self.ue_type)
            .field("packages_left", &self.names.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
