//! # uepkg Prelude
//!
//! The most commonly used types, for glob imports.
//!
//! ```rust
//! use uepkg::prelude::*;
//!
//! let registry = SchemaRegistry::new();
//! registry.register(ProxyDeclaration::new("PrimalItem"))?;
//! assert!(registry.contains("PrimalItem"));
//! # Ok::<(), uepkg::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

pub use crate::{Error, Result};

pub use crate::{Cursor, File};

pub use crate::config::{LoaderConfig, PropertyBoundary};

// ================================================================================================
// Packages
// ================================================================================================

pub use crate::package::{
    exports::{Export, ExportRc},
    imports::{Import, ImportTarget},
    objects::{ObjectIndex, ObjectRef},
    properties::{Property, PropertyList, PropertyValue, StructValue},
    ImportResolver, Package, PackageRc, Stage, StandaloneResolver,
};

// ================================================================================================
// Loading
// ================================================================================================

pub use crate::context::{with_parsing_depth, DepthRequest, ParsingContext, ParsingDepth};

pub use crate::loader::{DirectorySource, MemorySource, PackageLoader, PackageSource};

// ================================================================================================
// Proxies and Export
// ================================================================================================

pub use crate::proxy::{FieldValues, ProxyDeclaration, ProxyInstance, SchemaRegistry};

pub use crate::export::{ExportOutcome, ExportRunner, ExportUnit, HierarchyExport};
