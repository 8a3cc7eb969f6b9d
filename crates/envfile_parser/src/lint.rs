//! Lint checks over a parsed manifest
//!
//! Name and operator validity are enforced at parse time; the checks here
//! look across entries. Duplicate active packages are errors, duplicate
//! channels only warnings (the resolver tolerates them, they are just
//! noise).

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    document::EnvironmentFile,
    error::{ParseError, format_span},
};

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub message: String,
}

/// The outcome of linting a manifest.
#[derive(Debug, Default)]
pub struct LintReport {
    /// Violations that make the manifest invalid
    pub errors: Vec<ParseError>,
    /// Findings worth surfacing but not failing on
    pub warnings: Vec<LintWarning>,
}

impl LintReport {
    /// Whether the manifest passed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run all lint checks.
pub fn lint(env: &EnvironmentFile) -> LintReport {
    let mut report = LintReport::default();
    check_duplicate_dependencies(env, &mut report);
    check_duplicate_channels(env, &mut report);
    report
}

/// No two active entries may declare the same (normalized) package name.
/// Disabled entries are documentation and do not participate.
fn check_duplicate_dependencies(env: &EnvironmentFile, report: &mut LintReport) {
    let mut seen = IndexMap::new();
    for entry in env.active_specs() {
        match seen.entry(entry.spec.name.as_normalized().to_string()) {
            indexmap::map::Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
            indexmap::map::Entry::Occupied(first) => {
                let first = first.get();
                tracing::debug!(
                    "duplicate dependency '{}' at {} (first at {})",
                    entry.spec.name,
                    format_span(&entry.span),
                    format_span(&first.span),
                );
                report.errors.push(ParseError::DuplicateDependency {
                    name: entry.spec.name.as_source().to_string(),
                    first_span: first.span,
                    span: entry.span,
                });
            }
        }
    }
}

fn check_duplicate_channels(env: &EnvironmentFile, report: &mut LintReport) {
    let duplicates = env
        .channel_list()
        .duplicates()
        .map(|channel| channel.to_redacted_string())
        .collect::<Vec<_>>();
    for channel in duplicates {
        report.warnings.push(LintWarning {
            message: format!("channel '{}' is listed more than once", channel),
        });
    }
}
