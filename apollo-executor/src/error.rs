use displaydoc::Display;
use thiserror::Error;

use crate::json_ext::Path;
pub use crate::spec::SpecError;

/// Error types for execution.
///
/// Executions fail as a whole: the first error met, in selection order, is the one returned
/// and no partial result is produced.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutionError {
    /// An operation name is required when the document contains multiple operations
    AmbiguousOperation,

    /// Please provide an operation
    NoOperation,

    /// Unknown operation named "{0}"
    UnknownOperation(String),

    /// There can be only one operation named "{0}"
    DuplicateOperation(String),

    /// schema does not support {0} operations
    UnsupportedOperation(&'static str),

    /// cannot query field '{field}' on kind '{kind}' at {path}
    UnknownField {
        /// The underlying field name.
        field: String,
        /// The kind of the object the field was requested on.
        kind: String,
        /// The response path of the field.
        path: Path,
    },

    /// field '{field}' of kind '{kind}' requires a selection of subfields at {path}
    MissingSelection {
        /// The underlying field name.
        field: String,
        /// The kind of the object returned for the field.
        kind: String,
        /// The response path of the field.
        path: Path,
    },

    /// resolver for field '{field}' failed at {path}: {message}
    Resolver {
        /// The underlying field name.
        field: String,
        /// The response path of the field.
        path: Path,
        /// The error reported by the resolver.
        message: String,
    },

    /// request exceeded complexity limits: {0}
    LimitsExceeded(String),

    /// {0}
    Spec(#[from] SpecError),
}
