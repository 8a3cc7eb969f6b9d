//! Canonical serialization
//!
//! Re-emits a manifest deterministically: leading comments, `name`,
//! `channels`, `dependencies`, two-space indent, comments (full-line and
//! inline trailers) and disabled lines in place. Parsing a canonical file
//! and serializing it again reproduces the input byte for byte.

use crate::document::{ChannelEntry, DependencyEntry, EnvironmentFile};

fn push_line(out: &mut String, content: &str, trailing: Option<&String>) {
    out.push_str(content);
    if let Some(text) = trailing {
        out.push_str(&format!(" # {text}"));
    }
    out.push('\n');
}

/// Serialize a manifest to its canonical textual form.
pub fn to_canonical_string(env: &EnvironmentFile) -> String {
    let mut out = String::new();

    for comment in &env.leading_comments {
        out.push_str(&format!("# {comment}\n"));
    }
    if let Some(name) = &env.name {
        push_line(&mut out, &format!("name: {name}"), env.name_trailing_comment.as_ref());
    }
    for comment in &env.name_comments {
        out.push_str(&format!("# {comment}\n"));
    }
    if !env.channels.is_empty() {
        out.push_str("channels:\n");
        for entry in &env.channels {
            match entry {
                ChannelEntry::Channel {
                    channel,
                    trailing_comment,
                } => {
                    push_line(&mut out, &format!("  - {channel}"), trailing_comment.as_ref());
                }
                ChannelEntry::Comment(text) => {
                    out.push_str(&format!("  # {text}\n"));
                }
            }
        }
    }
    if env.dependencies.is_empty() {
        out.push_str("dependencies: []\n");
    } else {
        out.push_str("dependencies:\n");
        for entry in &env.dependencies {
            match entry {
                DependencyEntry::Spec(entry) => {
                    push_line(
                        &mut out,
                        &format!("  - {}", entry.spec),
                        entry.trailing_comment.as_ref(),
                    );
                }
                DependencyEntry::Comment(text) => {
                    out.push_str(&format!("  # {text}\n"));
                }
                DependencyEntry::Disabled(spec) => {
                    out.push_str(&format!("  # - {spec}\n"));
                }
            }
        }
    }

    out
}

/// Whether the given source already is in canonical form.
pub fn is_canonical(source: &str, env: &EnvironmentFile) -> bool {
    to_canonical_string(env) == source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EnvironmentFile;
    use pretty_assertions::assert_eq;

    const CANONICAL: &str = "\
# oldest supported versions
name: pandas-ci
channels:
  - conda-forge
dependencies:
  # build dependencies
  - cython>=0.29.32
  # test dependencies
  - pytest>=6.0
  - pytest-xdist>=2.2.0
  # required
  - numpy<1.24.0
  # optional
  - boto3
  # - scipy
  - coverage[toml]
";

    #[test]
    fn canonical_input_round_trips_byte_for_byte() {
        let env = EnvironmentFile::from_source(CANONICAL).unwrap();
        assert_eq!(to_canonical_string(&env), CANONICAL);
        assert!(is_canonical(CANONICAL, &env));
    }

    #[test]
    fn normalizes_spacing() {
        let env = EnvironmentFile::from_source("name: x\ndependencies:\n  - meson >= 1.2.1\n")
            .unwrap();
        assert_eq!(
            to_canonical_string(&env),
            "name: x\ndependencies:\n  - meson>=1.2.1\n"
        );
    }

    #[test]
    fn empty_dependency_list() {
        let env = EnvironmentFile::from_source("name: x\n").unwrap();
        assert_eq!(to_canonical_string(&env), "name: x\ndependencies: []\n");
    }

    #[test]
    fn channel_block_comments_survive_formatting() {
        let source = "\
channels:
  # primary channel, do not reorder
  - conda-forge
  - defaults
dependencies:
  - boto3
";
        let env = EnvironmentFile::from_source(source).unwrap();
        assert_eq!(to_canonical_string(&env), source);
    }

    #[test]
    fn inline_trailers_survive_formatting() {
        let env = EnvironmentFile::from_source(
            "name: ci   # renamed in 2023\nchannels:\n  - conda-forge   #  keep first\ndependencies:\n  - boto3 # needed for s3 tests\n",
        )
        .unwrap();
        assert_eq!(
            to_canonical_string(&env),
            "\
name: ci # renamed in 2023
channels:
  - conda-forge #  keep first
dependencies:
  - boto3 # needed for s3 tests
",
        );
    }

    #[test]
    fn round_trip_preserves_sets_and_order() {
        let env = EnvironmentFile::from_source(CANONICAL).unwrap();
        let reparsed = EnvironmentFile::from_source(&to_canonical_string(&env)).unwrap();

        assert_eq!(reparsed.channels, env.channels);
        let before: Vec<_> = env.active_specs().map(|e| e.spec.to_string()).collect();
        let after: Vec<_> = reparsed.active_specs().map(|e| e.spec.to_string()).collect();
        assert_eq!(before, after);
        assert_eq!(reparsed.groups().len(), env.groups().len());
    }
}
