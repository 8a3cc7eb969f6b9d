//! Version constraint expressions
//!
//! A constraint is one or more comparison predicates joined by `,`, all of
//! which must hold: `<1.24.0`, `>=2.2.0,<3`. The operator set matches what
//! conda match specs accept, including the bare `=` "starts with" form
//! (`=1.2` matches `1.2.*`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseSpecError;

/// A comparison operator in a version predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==` exact equality
    Equal,
    /// `!=` exclusion
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `=` conda prefix match (`=1.2` accepts any `1.2.*`)
    StartsWith,
}

impl CompareOp {
    /// All recognized operators, longest first so that parsing can take the
    /// longest matching prefix (`>=` before `>`).
    pub const ALL: [CompareOp; 7] = [
        CompareOp::Equal,
        CompareOp::NotEqual,
        CompareOp::LessEqual,
        CompareOp::GreaterEqual,
        CompareOp::Less,
        CompareOp::Greater,
        CompareOp::StartsWith,
    ];

    /// The textual form of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::Less => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEqual => ">=",
            CompareOp::StartsWith => "=",
        }
    }

    /// Split an operator off the front of a predicate string.
    ///
    /// Returns the operator and the remainder. Fails if the string does not
    /// start with a recognized operator.
    fn strip_from(s: &str) -> Result<(CompareOp, &str), ParseSpecError> {
        for op in Self::ALL {
            if let Some(rest) = s.strip_prefix(op.as_str()) {
                return Ok((op, rest));
            }
        }
        // Something that looks like an operator but isn't one we know
        // (e.g. `~=` or `=>`) gets a dedicated error.
        let operator: String = s
            .chars()
            .take_while(|c| matches!(c, '<' | '>' | '=' | '!' | '~'))
            .collect();
        if operator.is_empty() {
            Err(ParseSpecError::MissingOperator {
                constraint: s.to_string(),
            })
        } else {
            Err(ParseSpecError::UnknownOperator { operator })
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison predicate: an operator and a version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionPredicate {
    /// The comparison operator
    pub op: CompareOp,
    /// The version literal, kept as written (`1.24.0`, `2022.05.0`, `1.2.*`)
    pub version: String,
}

impl VersionPredicate {
    /// Create a predicate, validating the version literal.
    pub fn new(op: CompareOp, version: impl Into<String>) -> Result<Self, ParseSpecError> {
        let version = version.into();
        if version.is_empty() {
            return Err(ParseSpecError::EmptyVersion {
                operator: op.as_str().to_string(),
            });
        }
        if let Some(invalid) = version
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '*' | '!' | '+' | '-' | '_'))
        {
            return Err(ParseSpecError::InvalidVersion { version, invalid });
        }
        Ok(Self { op, version })
    }
}

impl FromStr for VersionPredicate {
    type Err = ParseSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (op, rest) = CompareOp::strip_from(s.trim())?;
        VersionPredicate::new(op, rest.trim())
    }
}

impl fmt::Display for VersionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A version constraint: the conjunction of one or more predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    predicates: Vec<VersionPredicate>,
}

impl VersionConstraint {
    /// Create a constraint from predicates. At least one is required; an
    /// absent constraint is modeled as `Option<VersionConstraint>` at the
    /// specifier level, never as an empty predicate list.
    pub fn new(predicates: Vec<VersionPredicate>) -> Result<Self, ParseSpecError> {
        if predicates.is_empty() {
            return Err(ParseSpecError::MissingOperator {
                constraint: String::new(),
            });
        }
        Ok(Self { predicates })
    }

    /// Create a constraint from a single predicate.
    pub fn single(op: CompareOp, version: impl Into<String>) -> Result<Self, ParseSpecError> {
        Ok(Self {
            predicates: vec![VersionPredicate::new(op, version)?],
        })
    }

    /// The predicates, in source order.
    pub fn predicates(&self) -> &[VersionPredicate] {
        &self.predicates
    }
}

impl FromStr for VersionConstraint {
    type Err = ParseSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let predicates = s
            .split(',')
            .map(VersionPredicate::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        VersionConstraint::new(predicates)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
