//! Dependency specifiers
//!
//! The textual forms accepted here are the ones found in CI environment
//! manifests: a bare name (`boto3`), a name with a constraint
//! (`numpy<1.24.0`, `meson >= 1.2.1`), and a name with an extras qualifier
//! (`coverage[toml]`, possibly followed by a constraint).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::ParseSpecError, version::VersionConstraint};

/// A validated package name.
///
/// Names start with an ASCII alphanumeric and continue with alphanumerics,
/// `-`, `_` or `.`. Comparison is case-insensitive; the original casing is
/// preserved for display.
#[derive(Debug, Clone, Eq)]
pub struct PackageName {
    source: String,
    normalized: String,
}

impl PackageName {
    /// The name as written in the manifest.
    pub fn as_source(&self) -> &str {
        &self.source
    }

    /// The lowercased form used for equality and duplicate detection.
    pub fn as_normalized(&self) -> &str {
        &self.normalized
    }
}

impl FromStr for PackageName {
    type Err = ParseSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseSpecError::EmptyName);
        }
        let mut chars = s.chars();
        let first = chars.next().expect("non-empty string has a first char");
        if !first.is_ascii_alphanumeric() {
            return Err(ParseSpecError::InvalidName {
                name: s.to_string(),
                invalid: first,
            });
        }
        if let Some(invalid) =
            chars.find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
        {
            return Err(ParseSpecError::InvalidName {
                name: s.to_string(),
                invalid,
            });
        }
        Ok(Self {
            normalized: s.to_ascii_lowercase(),
            source: s.to_string(),
        })
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl std::hash::Hash for PackageName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A dependency specifier: package name, optional extras, optional
/// version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencySpec {
    /// The package name
    pub name: PackageName,
    /// Optional sub-feature qualifiers (`coverage[toml]`)
    pub extras: Vec<String>,
    /// Optional version constraint; `None` means any version
    pub constraint: Option<VersionConstraint>,
}

impl DependencySpec {
    /// A specifier with no extras and no constraint.
    pub fn any_version(name: PackageName) -> Self {
        Self {
            name,
            extras: Vec::new(),
            constraint: None,
        }
    }

    /// Whether this specifier restricts the acceptable versions.
    pub fn is_constrained(&self) -> bool {
        self.constraint.is_some()
    }

    /// The `name[extras]` portion of the textual form, without the
    /// constraint.
    pub fn name_and_extras(&self) -> String {
        let mut out = self.name.as_source().to_string();
        if !self.extras.is_empty() {
            out.push('[');
            out.push_str(&self.extras.join(","));
            out.push(']');
        }
        out
    }
}

/// Byte offset of the first character that ends the name portion of a
/// specifier string.
fn name_end(s: &str) -> usize {
    s.find(|c: char| c.is_whitespace() || matches!(c, '[' | '<' | '>' | '=' | '!' | '~'))
        .unwrap_or(s.len())
}

impl FromStr for DependencySpec {
    type Err = ParseSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name_part, mut rest) = s.split_at(name_end(s));
        let name: PackageName = name_part.parse()?;

        rest = rest.trim_start();
        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let Some(close) = after_bracket.find(']') else {
                return Err(ParseSpecError::MalformedExtras {
                    spec: s.to_string(),
                    reason: "missing closing ']'".to_string(),
                });
            };
            let inner = &after_bracket[..close];
            if inner.trim().is_empty() {
                return Err(ParseSpecError::MalformedExtras {
                    spec: s.to_string(),
                    reason: "empty extras list".to_string(),
                });
            }
            for extra in inner.split(',') {
                let extra = extra.trim();
                // Extras follow the same lexical rules as package names.
                extra
                    .parse::<PackageName>()
                    .map_err(|_| ParseSpecError::MalformedExtras {
                        spec: s.to_string(),
                        reason: format!("invalid extra '{extra}'"),
                    })?;
                extras.push(extra.to_string());
            }
            rest = after_bracket[close + 1..].trim_start();
        }

        let constraint = if rest.is_empty() {
            None
        } else {
            Some(rest.parse()?)
        };

        Ok(Self {
            name,
            extras,
            constraint,
        })
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name_and_extras())?;
        if let Some(constraint) = &self.constraint {
            write!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

impl Serialize for DependencySpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DependencySpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("boto3", "boto3", None)]
    #[case("numpy<1.24.0", "numpy", Some("<1.24.0"))]
    #[case("pytest-xdist>=2.2.0", "pytest-xdist", Some(">=2.2.0"))]
    #[case("python-dateutil==2.8.2", "python-dateutil", Some("==2.8.2"))]
    #[case("meson >= 1.2.1", "meson", Some(">=1.2.1"))]
    #[case("typing_extensions>=4.4.0", "typing_extensions", Some(">=4.4.0"))]
    fn parse_spec(#[case] input: &str, #[case] name: &str, #[case] constraint: Option<&str>) {
        let spec: DependencySpec = input.parse().unwrap();
        assert_eq!(spec.name.as_source(), name);
        assert_eq!(
            spec.constraint.as_ref().map(|c| c.to_string()),
            constraint.map(str::to_string)
        );
        assert!(spec.extras.is_empty());
    }

    #[test]
    fn parse_extras() {
        let spec: DependencySpec = "coverage[toml]".parse().unwrap();
        assert_eq!(spec.name.as_source(), "coverage");
        assert_eq!(spec.extras, vec!["toml".to_string()]);
        assert_eq!(spec.constraint, None);
        assert_eq!(spec.to_string(), "coverage[toml]");
    }

    #[test]
    fn parse_extras_with_constraint() {
        let spec: DependencySpec = "meson[ninja]=1.2.1".parse().unwrap();
        assert_eq!(spec.name.as_source(), "meson");
        assert_eq!(spec.extras, vec!["ninja".to_string()]);
        assert_eq!(spec.constraint.unwrap().to_string(), "=1.2.1");
    }

    #[test]
    fn parse_multiple_extras() {
        let spec: DependencySpec = "pkg[a,b]>=1.0".parse().unwrap();
        assert_eq!(spec.extras, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(spec.to_string(), "pkg[a,b]>=1.0");
    }

    #[test]
    fn name_and_extras_matches_display_prefix() {
        for input in ["boto3", "coverage[toml]", "pkg[a,b]>=1.0", "numpy<1.24.0"] {
            let spec: DependencySpec = input.parse().unwrap();
            assert!(spec.to_string().starts_with(&spec.name_and_extras()));
            let constraint = spec
                .constraint
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default();
            assert_eq!(format!("{}{}", spec.name_and_extras(), constraint), input);
        }
    }

    #[test]
    fn display_round_trips_canonical_forms() {
        for input in ["boto3", "numpy<1.24.0", "pytest-xdist>=2.2.0", "tzdata", "pyqt>=5.15.6"] {
            let spec: DependencySpec = input.parse().unwrap();
            assert_eq!(spec.to_string(), input);
        }
    }

    #[test]
    fn name_comparison_is_case_insensitive() {
        let a: PackageName = "Cython".parse().unwrap();
        let b: PackageName = "cython".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Cython");
    }

    #[rstest]
    #[case("")]
    #[case("<1.0")]
    #[case("name with spaces")]
    #[case("pkg[")]
    #[case("pkg[]")]
    #[case("pkg[a b]")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<DependencySpec>().is_err());
    }
}
