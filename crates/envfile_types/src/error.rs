//! Error types for specifier parsing

use thiserror::Error;

/// Errors that can occur while parsing a dependency specifier, version
/// constraint, or channel from its textual form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseSpecError {
    /// The package name is empty
    #[error("package name is empty")]
    EmptyName,

    /// The package name contains an invalid character
    #[error("invalid character '{invalid}' in package name '{name}'")]
    InvalidName { name: String, invalid: char },

    /// A constraint was given without a comparison operator
    #[error("constraint '{constraint}' does not start with a comparison operator")]
    MissingOperator { constraint: String },

    /// The comparison operator is not recognized
    #[error("unrecognized comparison operator '{operator}'")]
    UnknownOperator { operator: String },

    /// The version string after an operator is empty
    #[error("empty version after operator '{operator}'")]
    EmptyVersion { operator: String },

    /// The version string contains an invalid character
    #[error("invalid character '{invalid}' in version '{version}'")]
    InvalidVersion { version: String, invalid: char },

    /// The extras qualifier is malformed
    #[error("malformed extras qualifier in '{spec}': {reason}")]
    MalformedExtras { spec: String, reason: String },

    /// The channel identifier is empty
    #[error("channel identifier is empty")]
    EmptyChannel,
}
