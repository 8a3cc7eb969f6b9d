//! The `fmt` command: rewrite a manifest in canonical form.

use miette::IntoDiagnostic;

use envfile_parser::{EnvironmentFile, to_canonical_string};

use crate::opt::FmtOpts;

/// Format a manifest in place, or verify it with `--check`.
pub fn run_fmt(opts: FmtOpts) -> miette::Result<()> {
    let source = fs_err::read_to_string(&opts.file).into_diagnostic()?;
    let env = EnvironmentFile::from_source(&source).into_diagnostic()?;
    let formatted = to_canonical_string(&env);

    if formatted == source {
        tracing::info!("{}: already canonical", opts.file.display());
        return Ok(());
    }

    if opts.check {
        return Err(miette::miette!(
            "{} is not in canonical form (run `conda-envfile fmt` to rewrite it)",
            opts.file.display()
        ));
    }

    fs_err::write(&opts.file, formatted).into_diagnostic()?;
    tracing::info!("{}: rewritten", opts.file.display());
    Ok(())
}
