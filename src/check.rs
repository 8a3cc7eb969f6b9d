//! The `check` command: parse and lint manifests.

use std::path::Path;

use miette::IntoDiagnostic;

use envfile_parser::{EnvironmentFile, ParseError, ParseErrorWithSource, lint};

use crate::opt::CheckOpts;

/// Check all given manifests. Returns an error if any of them fail.
pub fn run_check(opts: CheckOpts) -> miette::Result<()> {
    let mut failures = 0usize;
    for path in &opts.files {
        if !check_one(path, opts.strict)? {
            failures += 1;
        }
    }

    if failures > 0 {
        Err(miette::miette!(
            "{} of {} manifest(s) failed the checks",
            failures,
            opts.files.len()
        ))
    } else {
        Ok(())
    }
}

/// Check a single manifest, printing diagnostics as they are found.
fn check_one(path: &Path, strict: bool) -> miette::Result<bool> {
    let source = fs_err::read_to_string(path).into_diagnostic()?;

    let env = match EnvironmentFile::from_source(&source) {
        Ok(env) => env,
        Err(err) => {
            report(path, &source, err);
            return Ok(false);
        }
    };

    let lint_report = lint(&env);
    for warning in &lint_report.warnings {
        tracing::warn!("{}: {}", path.display(), warning.message);
    }
    for err in &lint_report.errors {
        report(path, &source, err.clone());
    }

    let failed = !lint_report.is_ok() || (strict && !lint_report.warnings.is_empty());
    if !failed {
        tracing::info!(
            "{}: ok ({} dependencies, {} channels)",
            path.display(),
            env.active_specs().count(),
            env.channel_list().count()
        );
    }
    Ok(!failed)
}

fn report(path: &Path, source: &str, error: ParseError) {
    tracing::error!("{}: invalid manifest", path.display());
    let report = miette::Report::new(ParseErrorWithSource::new(source.to_string(), error));
    eprintln!("{:?}", report);
}
