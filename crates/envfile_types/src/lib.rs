//! Types for conda environment manifest entries
//!
//! This crate provides the specifier-level vocabulary of an
//! `environment.yml`-style manifest:
//!
//! - [`DependencySpec`] - a package name with optional extras and an
//!   optional version constraint (`numpy<1.24.0`, `coverage[toml]`, `boto3`)
//! - [`VersionConstraint`] - one or more comparison predicates joined by `,`
//! - [`Channel`] - a prioritized package source, either a named channel or a URL
//!
//! All types parse from and display as their textual manifest form, so they
//! can be used directly with string-based serde.

pub mod channel;
pub mod error;
pub mod spec;
pub mod version;

pub use channel::Channel;
pub use error::ParseSpecError;
pub use spec::{DependencySpec, PackageName};
pub use version::{CompareOp, VersionConstraint, VersionPredicate};
