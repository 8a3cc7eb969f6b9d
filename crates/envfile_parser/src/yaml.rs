//! YAML loading with proper quote handling
//!
//! Uses `prevent_coercion(true)` so that quoted values like `"3.10"` stay
//! strings instead of being coerced to numbers, and
//! `error_on_duplicate_keys(true)` so a manifest with two `dependencies:`
//! keys is rejected up front.

use marked_yaml::{LoadError, LoaderOptions, Node, parse_yaml_with_options};

/// Parse YAML from a string, keeping spans on every node.
pub fn parse_yaml(source: &str) -> Result<Node, LoadError> {
    let options = LoaderOptions::default()
        .error_on_duplicate_keys(true)
        .prevent_coercion(true);

    parse_yaml_with_options(0, source, options)
}
