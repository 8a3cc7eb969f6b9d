//! The `list` command: print active dependency specifiers.

use console::style;
use miette::IntoDiagnostic;

use envfile_parser::EnvironmentFile;

use crate::opt::ListOpts;

/// List the active specifiers of a manifest, optionally restricted to one
/// informal group.
pub fn run_list(opts: ListOpts) -> miette::Result<()> {
    let env = EnvironmentFile::from_path(&opts.file).into_diagnostic()?;
    let output = render_list(&env, opts.group.as_deref(), opts.constrained_only)?;
    print!("{}", output);
    Ok(())
}

/// Render the listing. Group selection matches by substring against the
/// informal headers.
pub fn render_list(
    env: &EnvironmentFile,
    group: Option<&str>,
    constrained_only: bool,
) -> miette::Result<String> {
    let groups = env.groups();
    let selected: Vec<_> = match group {
        None => groups.iter().collect(),
        Some(wanted) => {
            let matching: Vec<_> = groups
                .iter()
                .filter(|group| group.header.is_some_and(|header| header.contains(wanted)))
                .collect();
            if matching.is_empty() {
                let headers = groups
                    .iter()
                    .filter_map(|group| group.header)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(miette::miette!(
                    "no group header matches '{}' (headers: {})",
                    wanted,
                    headers
                ));
            }
            matching
        }
    };

    let mut out = String::new();
    for group in selected {
        if let Some(header) = group.header {
            out.push_str(&format!("{}\n", style(format!("# {}", header)).dim()));
        }
        for entry in &group.specs {
            if constrained_only && !entry.spec.is_constrained() {
                continue;
            }
            let name = entry.spec.name_and_extras();
            match &entry.spec.constraint {
                Some(constraint) => out.push_str(&format!(
                    "{}{}\n",
                    name,
                    style(constraint.to_string()).cyan()
                )),
                None => out.push_str(&format!("{}\n", name)),
            }
        }
    }

    Ok(out)
}
