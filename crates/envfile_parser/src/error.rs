//! Error types for manifest parsing

use envfile_types::ParseSpecError;
use marked_yaml::Span;
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

#[cfg(feature = "miette")]
use miette::{Diagnostic, SourceSpan};

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while parsing an environment manifest
#[derive(Debug, Error, Clone)]
pub enum ParseError {
    /// IO error when reading a file
    #[error("IO error while reading file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    /// The YAML itself could not be loaded
    #[error("invalid YAML: {message}")]
    YamlError { message: String, span: Span },

    /// Generic parse error with message and location
    #[error("parse error: {message}")]
    Generic {
        message: String,
        span: Span,
        suggestion: Option<String>,
    },

    /// Type mismatch
    #[error("expected {expected} but got {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
        span: Span,
    },

    /// Invalid value
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        field: String,
        reason: String,
        span: Span,
        suggestion: Option<String>,
    },

    /// A dependency entry that is not a valid specifier
    #[error("invalid dependency specifier: {source}")]
    InvalidSpec { source: ParseSpecError, span: Span },

    /// The same package is declared by two active entries
    #[error("package '{name}' is declared more than once")]
    DuplicateDependency {
        name: String,
        first_span: Span,
        span: Span,
    },
}

impl ParseError {
    /// Create a generic parse error
    pub fn generic(message: impl Into<String>, span: Span) -> Self {
        Self::Generic {
            message: message.into(),
            span,
            suggestion: None,
        }
    }

    /// Create a type mismatch error
    pub fn expected_type(
        expected: impl Into<String>,
        actual: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            span,
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>, span: Span) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
            span,
            suggestion: None,
        }
    }

    /// Create an invalid specifier error
    pub fn invalid_spec(source: ParseSpecError, span: Span) -> Self {
        Self::InvalidSpec { source, span }
    }

    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        Self::IoError {
            path,
            source: Arc::new(source),
        }
    }

    /// Wrap a YAML loader error. The loader reports its own location in the
    /// message; no structured span is available.
    pub fn yaml_error(error: marked_yaml::LoadError) -> Self {
        Self::YamlError {
            message: error.to_string(),
            span: Span::new_blank(),
        }
    }

    /// Add a suggestion to the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        match &mut self {
            Self::Generic { suggestion: s, .. } | Self::InvalidValue { suggestion: s, .. } => {
                *s = Some(suggestion.into());
            }
            _ => {}
        }
        self
    }

    /// Get the primary span from this error, if it has one
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::YamlError { span, .. }
            | Self::Generic { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::InvalidValue { span, .. }
            | Self::InvalidSpec { span, .. }
            | Self::DuplicateDependency { span, .. } => Some(span),
            Self::IoError { .. } => None,
        }
    }
}

#[cfg(feature = "miette")]
impl Diagnostic for ParseError {
    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let span = self.span()?;
        let source_span = span_to_source_span(span);

        let label = match self {
            Self::IoError { .. } => return None,
            Self::YamlError { message, .. } | Self::Generic { message, .. } => {
                miette::LabeledSpan::new_with_span(Some(message.clone()), source_span)
            }
            Self::TypeMismatch {
                expected, actual, ..
            } => miette::LabeledSpan::new_with_span(
                Some(format!("expected {} but got {}", expected, actual)),
                source_span,
            ),
            Self::InvalidValue { field, reason, .. } => miette::LabeledSpan::new_with_span(
                Some(format!("invalid value for '{}': {}", field, reason)),
                source_span,
            ),
            Self::InvalidSpec { source, .. } => {
                miette::LabeledSpan::new_with_span(Some(source.to_string()), source_span)
            }
            Self::DuplicateDependency {
                name, first_span, ..
            } => {
                let first = miette::LabeledSpan::new_with_span(
                    Some(format!("'{}' first declared here", name)),
                    span_to_source_span(first_span),
                );
                let second = miette::LabeledSpan::new_with_span(
                    Some("declared again here".to_string()),
                    source_span,
                );
                return Some(Box::new([first, second].into_iter()));
            }
        };

        Some(Box::new(std::iter::once(label)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            Self::Generic {
                suggestion: Some(s),
                ..
            }
            | Self::InvalidValue {
                suggestion: Some(s),
                ..
            } => Some(Box::new(s.clone())),
            Self::DuplicateDependency { name, .. } => Some(Box::new(format!(
                "remove or comment out one of the '{}' entries",
                name
            ))),
            _ => None,
        }
    }
}

/// Format a span for error messages
pub fn format_span(span: &Span) -> String {
    if let Some(start) = span.start() {
        format!("line {}, column {}", start.line(), start.column())
    } else {
        "unknown location".to_string()
    }
}

/// Convert a marked_yaml Span to a miette SourceSpan
#[cfg(feature = "miette")]
fn span_to_source_span(span: &Span) -> SourceSpan {
    if let Some(start) = span.start() {
        let offset = start.character();
        let len = if let Some(end) = span.end() {
            end.character().saturating_sub(offset).max(1)
        } else {
            1
        };
        SourceSpan::new(offset.into(), len)
    } else {
        SourceSpan::new(0.into(), 0)
    }
}

/// Find the length of a YAML token starting at the given byte offset
#[cfg(feature = "miette")]
fn find_token_length(src: &str, start: usize) -> usize {
    let remaining = &src[start..];
    let mut len = 0;

    for (i, ch) in remaining.char_indices() {
        if ch.is_whitespace() || ch == ':' || ch == ',' {
            return if len == 0 { i.max(1) } else { len };
        }
        len = i + ch.len_utf8();
    }

    if len == 0 { remaining.len().max(1) } else { len }
}

/// Wrapper that combines a ParseError with its source text so miette can
/// render a snippet. Single-character spans are expanded to cover the full
/// token under the cursor.
#[cfg(feature = "miette")]
#[derive(Debug)]
pub struct ParseErrorWithSource<S> {
    source: S,
    error: ParseError,
}

#[cfg(feature = "miette")]
impl<S> ParseErrorWithSource<S> {
    pub fn new(source: S, error: ParseError) -> Self {
        Self { source, error }
    }

    pub fn error(&self) -> &ParseError {
        &self.error
    }

    pub fn into_error(self) -> ParseError {
        self.error
    }
}

#[cfg(feature = "miette")]
impl<S> std::fmt::Display for ParseErrorWithSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(feature = "miette")]
impl<S> std::error::Error for ParseErrorWithSource<S> where S: std::fmt::Debug {}

#[cfg(feature = "miette")]
impl<S> Diagnostic for ParseErrorWithSource<S>
where
    S: AsRef<str> + miette::SourceCode + std::fmt::Debug,
{
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let labels = self.error.labels()?;
        let source_str = self.source.as_ref();

        let expanded_labels = labels.map(move |label| {
            let span = label.inner();
            if span.len() == 1 && span.offset() < source_str.len() {
                let offset = span.offset();
                let token_len = find_token_length(source_str, offset);
                miette::LabeledSpan::new(label.label().map(|s| s.to_string()), offset, token_len)
            } else {
                label
            }
        });
        Some(Box::new(expanded_labels))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.error.help()
    }
}
