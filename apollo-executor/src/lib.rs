//! Executes GraphQL operations against a graph of resolvable objects.
//!
//! The entry point is the [`Executor`]: it holds one root object per operation kind,
//! picks the requested operation out of an already parsed document, normalizes its
//! selection set into a [`Selection`] (merging repeated fields and expanding fragments)
//! and evaluates it, resolving sibling fields concurrently.
//!
//! ```ignore
//! let executor = Executor::new()
//!     .with_query(Object::new("Query").value("hello", "world"));
//! let document = ast::Document::parse("{ hello }", "query.graphql")?;
//! let response = executor.execute(&document, None, None).await?;
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(unreachable_pub)]

mod configuration;
mod context;
mod error;
mod execution;
mod executor;
pub mod json_ext;
mod kinds;
mod object;
mod response;
pub mod services;
pub mod spec;

pub use configuration::*;
pub use context::*;
pub use error::*;
pub use executor::*;
pub use kinds::KindSet;
pub use object::*;
pub use response::Response;
pub use spec::Arguments;
pub use spec::Field;
pub use spec::Selection;

/// Re-exports of the crates appearing in the public API.
pub mod reexports {
    pub use apollo_compiler;
    pub use serde_json_bytes;
}
