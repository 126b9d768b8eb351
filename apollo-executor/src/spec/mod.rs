//! Normalization of GraphQL selection sets.

mod fragments;
pub(crate) mod operation_limits;
mod selection;

use displaydoc::Display;
pub use fragments::Fragments;
pub use selection::*;
use thiserror::Error;

pub(crate) const TYPENAME: &str = "__typename";

/// GraphQL selection errors.
#[derive(Error, Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpecError {
    /// Unknown fragment "{0}"
    UnknownFragment(String),
    /// There can be only one fragment named "{0}"
    DuplicateFragment(String),
    /// response key '{key}' is selected both with and without subfields
    AmbiguousMerge {
        /// The response key of the field.
        key: String,
    },
    /// fields '{existing}' and '{new}' conflict because they are both selected as '{key}'
    ConflictingFields {
        /// The response key shared by both fields.
        key: String,
        /// The field first selected under the key.
        existing: String,
        /// The field selected later under the same key.
        new: String,
    },
    /// field '{key}' is selected more than once with different arguments
    ConflictingArguments {
        /// The response key of the field.
        key: String,
    },
    /// selection processing recursion limit exceeded
    RecursionLimitExceeded,
}
