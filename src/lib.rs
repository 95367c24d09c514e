// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # uepkg
//!
//! A staged decoder for Unreal-style game packages (`.uasset`), with a typed proxy overlay
//! on top of the decoded objects and a pipeline that turns them into JSON documents.
//!
//! ## Features
//!
//! - **Bounded reads** - Every decoding layer reads through a [`Cursor`] over a window of an
//!   immutable, memory-mapped [`File`]; reads never cross their window
//! - **Staged decoding** - Packages are deserialized, linked, property-parsed and
//!   bulk-parsed on demand, and upgraded in place when a later caller needs more
//! - **Scoped depth** - [`context::ParsingContext`] scopes decide how deep the loader decodes
//! - **Proxy overlay** - Hand-declared schemas give every field of a class a default, and
//!   decoded values override them per `(field, index)`
//! - **Export pipeline** - Instances of a class hierarchy become one JSON document per
//!   output unit, written only when their content changed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uepkg::prelude::*;
//!
//! let loader = PackageLoader::new(DirectorySource::new("Content"), LoaderConfig::default());
//! let package = loader.get("/Game/PrimalEarth/CoreBlueprints/PrimalGameData_BP")?;
//!
//! for export in package.exports() {
//!     println!("{} ({}): {} properties", export.name(), export.class_name()?, export.properties()?.len());
//! }
//! # Ok::<(), uepkg::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Byte sources and the bounded [`Cursor`]
//! - [`package`] - Header, tables, staged decoding, linking, properties and bulk data
//! - [`context`] - Thread-local parsing depth scopes
//! - [`loader`] - Package sources, the package cache and instance discovery
//! - [`proxy`] - Schemas, the schema registry and proxy instances
//! - [`export`] - Hierarchy export stages and document output
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. A failing package stage is reported as
//! [`Error::Decoding`], naming the package and the stage; the package stays usable at the
//! last stage that completed.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

pub mod config;
pub mod context;
pub mod export;
pub mod file;
pub mod loader;
pub mod package;
pub mod prelude;
pub mod proxy;

/// `uepkg` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `uepkg` Error type
///
/// # Examples
///
/// ```rust
/// use uepkg::{Error, package::Package};
///
/// match Package::from_bytes("/Game/Broken", vec![0u8; 8]) {
///     Ok(_) => unreachable!(),
///     Err(Error::Decoding { package, reached, .. }) => {
///         assert_eq!(package, "/Game/Broken");
///         assert!(reached.is_none());
///     }
///     Err(e) => panic!("unexpected error: {e}"),
/// }
/// ```
pub use error::Error;

/// Byte sources and the bounded reader.
pub use file::{cursor::Cursor, File};

/// Loader configuration.
pub use config::{LoaderConfig, PropertyBoundary};
