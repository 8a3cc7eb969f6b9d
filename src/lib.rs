//! Library surface of the `conda-envfile` tool.
//!
//! The heavy lifting lives in the `envfile_types` and `envfile_parser`
//! crates; this crate adds the CLI commands on top.

pub mod check;
pub mod console_utils;
pub mod fmt;
pub mod list;
pub mod opt;

pub use envfile_parser::{EnvironmentFile, lint, to_canonical_string};
pub use envfile_types::{Channel, DependencySpec};
