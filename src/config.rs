//! Loader and decoding configuration.
//!
//! [`LoaderConfig`] collects the knobs that depend on the engine build a package was cooked
//! with rather than on the package itself: where tagged property lists end, how deep struct
//! and array values may nest, and how package names map onto the content directory.

use std::collections::HashMap;

/// Rule deciding where an export's tagged property list ends.
///
/// The rule depends on the engine version that produced the data, so it is a configuration
/// point rather than a constant. It can be set globally and overridden per class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
pub enum PropertyBoundary {
    /// The list ends at the first `None` marker; reaching the end of the export's serial
    /// region without one is a decoding error.
    Terminator,
    /// The list runs to the end of the export's serial region; `None` markers in between
    /// are consumed and skipped. Exports decoded this way cannot carry a bulk data record.
    DeclaredSize,
    /// The list ends at the first `None` marker or at the end of the serial region,
    /// whichever comes first.
    #[default]
    Either,
}

/// Configuration for package loading and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Property boundary used for classes without an override
    pub property_boundary: PropertyBoundary,

    /// Per-class property boundary overrides, keyed by class name
    pub boundary_overrides: HashMap<String, PropertyBoundary>,

    /// Maximum nesting of struct and array values inside a property list (default: 16)
    pub max_property_depth: usize,

    /// Mount point every package name is rooted at (default: `/Game`)
    pub mount_point: String,

    /// Directory below the mount point that holds one sub-directory per mod
    /// (default: `Mods`)
    pub mods_directory: String,

    /// File extension of package files (default: `uasset`)
    pub package_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            property_boundary: PropertyBoundary::Either,
            boundary_overrides: HashMap::new(),
            max_property_depth: 16,
            mount_point: "/Game".to_string(),
            mods_directory: "Mods".to_string(),
            package_extension: "uasset".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration that keeps decoding shallow.
    ///
    /// Struct and array values are not allowed to nest; anything deeper is rejected as
    /// malformed.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_property_depth: 1,
            ..Self::default()
        }
    }

    /// Creates a configuration with strict `None`-terminated property lists and generous
    /// nesting.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            property_boundary: PropertyBoundary::Terminator,
            max_property_depth: 64,
            ..Self::default()
        }
    }

    /// Sets the boundary rule for one class.
    #[must_use]
    pub fn with_boundary_override(
        mut self,
        class_name: impl Into<String>,
        boundary: PropertyBoundary,
    ) -> Self {
        self.boundary_overrides.insert(class_name.into(), boundary);
        self
    }

    /// Returns the boundary rule that applies to exports of `class_name`.
    #[must_use]
    pub fn boundary_for(&self, class_name: &str) -> PropertyBoundary {
        self.boundary_overrides
            .get(class_name)
            .copied()
            .unwrap_or(self.property_boundary)
    }

    /// Returns the package-name prefix shared by all packages of one mod.
    #[must_use]
    pub fn mod_prefix(&self, mod_id: &str) -> String {
        format!("{}/{}/{}/", self.mount_point, self.mods_directory, mod_id)
    }

    /// Returns the package-name prefix shared by all mod packages.
    #[must_use]
    pub fn mods_root(&self) -> String {
        format!("{}/{}/", self.mount_point, self.mods_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_overrides() {
        let config = LoaderConfig::default()
            .with_boundary_override("PrimalItem_C", PropertyBoundary::Terminator);

        assert_eq!(config.boundary_for("PrimalItem_C"), PropertyBoundary::Terminator);
        assert_eq!(config.boundary_for("Anything"), PropertyBoundary::Either);
        assert_eq!(
            LoaderConfig::strict().boundary_for("Anything"),
            PropertyBoundary::Terminator
        );
    }

    #[test]
    fn boundary_from_str() {
        assert_eq!(
            "DeclaredSize".parse::<PropertyBoundary>().unwrap(),
            PropertyBoundary::DeclaredSize
        );
        assert!("Sideways".parse::<PropertyBoundary>().is_err());
    }

    #[test]
    fn mod_prefixes() {
        let config = LoaderConfig::default();
        assert_eq!(config.mods_root(), "/Game/Mods/");
        assert_eq!(config.mod_prefix("839162288"), "/Game/Mods/839162288/");
    }
}
