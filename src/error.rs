use thiserror::Error;

use crate::package::Stage;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! end_of_stream_error {
    ($offset:expr, $requested:expr, $available:expr) => {
        crate::Error::EndOfStream {
            offset: $offset,
            requested: $requested,
            available: $available,
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Stream and decoding errors
/// - [`Error::EndOfStream`] - A read would have crossed the end of a cursor window
/// - [`Error::Malformed`] - Corrupted or invalid structure inside a single read
/// - [`Error::Decoding`] - A package stage failed; tagged with package name and stage
/// - [`Error::UnresolvedReference`] - An object index could not be resolved while linking
/// - [`Error::StageNotReached`] - Data was requested from a stage the package has not reached
///
/// ## Schema errors
/// - [`Error::MultipleInheritance`], [`Error::MissingTypeId`], [`Error::DuplicateSchema`],
///   [`Error::UnknownParent`] - raised when registering proxy schemas
///
/// ## Proxy errors
/// - [`Error::FieldNotFound`] - A proxy field/index was absent and no fallback was supplied
///
/// ## I/O and external errors
/// - [`Error::FileError`], [`Error::Json`], [`Error::PackageNotFound`]
///
/// # Examples
///
/// ```rust,no_run
/// use uepkg::{Error, loader::{LoaderConfig, PackageLoader, DirectorySource}};
///
/// let loader = PackageLoader::new(DirectorySource::new("Content"), LoaderConfig::default());
/// match loader.get("/Game/PrimalEarth/Dinos/Dodo/Dodo_Character_BP") {
///     Ok(package) => println!("{} exports", package.exports().len()),
///     Err(Error::Decoding { package, stage, source, .. }) => {
///         eprintln!("{package} failed while {stage}: {source}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A read would have crossed the end of the cursor window.
    ///
    /// The cursor position is left where it was before the failing read.
    #[error("End of stream at offset {offset}: requested {requested} bytes, {available} available")]
    EndOfStream {
        /// Absolute offset of the failing read
        offset: usize,
        /// Number of bytes the read needed
        requested: usize,
        /// Number of bytes left in the window
        available: usize,
    },

    /// The data is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A package stage failed to decode.
    ///
    /// The package is left at `reached`, the last stage that completed successfully. A
    /// package that failed to deserialize has reached nothing and is never cached.
    #[error("Failed to decode '{package}' at stage {stage}: {source}")]
    Decoding {
        /// Name of the package being decoded
        package: String,
        /// The stage that was being attempted
        stage: Stage,
        /// The last stage that completed successfully
        reached: Option<Stage>,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// An object index did not resolve against the name, import or export tables.
    #[error("Unresolved reference {index} in '{package}': {message}")]
    UnresolvedReference {
        /// Package containing the reference
        package: String,
        /// The raw object index
        index: i32,
        /// What was being resolved
        message: String,
    },

    /// Stage-dependent data was accessed before the owning package reached that stage.
    #[error("'{package}' has not been decoded up to {required} (currently {current})")]
    StageNotReached {
        /// Package name
        package: String,
        /// The stage the access needs
        required: Stage,
        /// The stage the package is at
        current: Stage,
    },

    /// A proxy schema declared more than one parent.
    #[error("Proxy schema '{0}' cannot inherit from more than one class")]
    MultipleInheritance(String),

    /// A proxy schema was declared without a type identifier.
    #[error("A type identifier must be specified for this proxy schema")]
    MissingTypeId,

    /// A different schema has already been registered for this type.
    #[error("A different proxy schema is already registered for '{0}'")]
    DuplicateSchema(String),

    /// A proxy schema names a parent that has not been registered.
    #[error("Proxy schema '{ue_type}' extends unregistered '{parent}'")]
    UnknownParent {
        /// The schema being registered
        ue_type: String,
        /// The missing parent
        parent: String,
    },

    /// A proxy field lookup failed and no fallback was supplied.
    #[error("{field}[{index}] not found on {proxy_type} proxy")]
    FieldNotFound {
        /// Requested field name
        field: String,
        /// Requested index
        index: u32,
        /// Type identifier of the proxy
        proxy_type: String,
    },

    /// The package source has no package with this name.
    #[error("Package not found - {0}")]
    PackageNotFound(String),

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// JSON serialisation error while writing export documents.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// Failed to lock target; an earlier holder panicked.
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Returns `true` if this error (or the error it wraps) is an end-of-stream condition.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Error::EndOfStream { .. } => true,
            Error::Decoding { source, .. } => source.is_end_of_stream(),
            _ => false,
        }
    }
}
