//! Span-preserving parser for conda environment manifests
//!
//! This crate turns `environment.yml`-style manifests into a typed
//! [`EnvironmentFile`], keeping enough of the source layout (entry order,
//! group-header comments, commented-out dependency lines) that a manifest
//! can be linted and re-emitted without losing its documentation.
//!
//! # Example
//!
//! ```rust
//! use envfile_parser::EnvironmentFile;
//!
//! let env = EnvironmentFile::from_source(
//!     "name: ci\ndependencies:\n  - numpy<1.24.0\n  - boto3\n",
//! )
//! .unwrap();
//! assert_eq!(env.active_specs().count(), 2);
//! ```
//!
//! Errors carry `marked_yaml` spans; with the `miette` feature enabled they
//! render as fancy diagnostics over the original source via
//! [`ParseErrorWithSource`].

pub mod document;
pub mod error;
pub mod format;
pub mod lint;
pub mod yaml;

pub use document::{
    ChannelEntry, DependencyEntry, DependencyGroup, EnvironmentFile, SpecEntry,
    parse_environment_file,
};
pub use error::{ParseError, ParseResult, format_span};
#[cfg(feature = "miette")]
pub use error::ParseErrorWithSource;
pub use format::{is_canonical, to_canonical_string};
pub use lint::{LintReport, LintWarning, lint};
pub use yaml::parse_yaml;
