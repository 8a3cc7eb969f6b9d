//! Document model for environment manifests
//!
//! An [`EnvironmentFile`] mirrors the source layout: channels in priority
//! order and dependency entries in declaration order, with comment lines
//! (group headers, commented-out specifiers, inline trailers) kept in place
//! so that the manifest can be re-emitted without losing its documentation.

use std::{path::Path, str::FromStr};

use envfile_types::{Channel, DependencySpec, VersionConstraint};
use marked_yaml::{Node as MarkedNode, Span, types::MarkedMappingNode};

use crate::{
    error::{ParseError, ParseResult},
    yaml,
};

/// Top-level keys a manifest may carry.
const VALID_FIELDS: &[&str] = &["name", "channels", "dependencies"];

/// An active dependency specifier together with its source location.
#[derive(Debug, Clone)]
pub struct SpecEntry {
    /// The parsed specifier
    pub spec: DependencySpec,
    /// Where the specifier appears in the source
    pub span: Span,
    /// An inline comment on the same line (`- boto3 # needed for s3`)
    pub trailing_comment: Option<String>,
}

/// One line of the `dependencies` block, in source order.
#[derive(Debug, Clone)]
pub enum DependencyEntry {
    /// An active specifier
    Spec(SpecEntry),
    /// A free-text annotation, typically an informal group header
    /// (`# test dependencies`)
    Comment(String),
    /// A commented-out specifier (`# - scipy`), preserved as documentation
    /// and never linted
    Disabled(DependencySpec),
}

/// One line of the `channels` block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEntry {
    /// A channel, with any inline comment on the same line
    Channel {
        channel: Channel,
        trailing_comment: Option<String>,
    },
    /// A full-line annotation inside the block
    Comment(String),
}

/// A view of the active specifiers under one informal comment header.
///
/// Grouping is documentation only: it is derived from the comment lines and
/// carries no enforced invariant.
#[derive(Debug)]
pub struct DependencyGroup<'a> {
    /// The header text, or `None` for entries before the first comment
    pub header: Option<&'a str>,
    /// Active specifiers in this group, in source order
    pub specs: Vec<&'a SpecEntry>,
}

/// A parsed environment manifest.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentFile {
    /// The environment name, if declared
    pub name: Option<String>,
    /// An inline comment on the `name:` line
    pub name_trailing_comment: Option<String>,
    /// Comment lines before the first top-level key
    pub leading_comments: Vec<String>,
    /// Full-line comments between the `name:` line and the next key
    pub name_comments: Vec<String>,
    /// Channel entries in priority order, comments included
    pub channels: Vec<ChannelEntry>,
    /// Dependency entries in source order, comments included
    pub dependencies: Vec<DependencyEntry>,
}

impl EnvironmentFile {
    /// Read and parse a manifest from a file.
    pub fn from_path(path: &Path) -> ParseResult<Self> {
        let source = fs_err::read_to_string(path)
            .map_err(|err| ParseError::io_error(path.to_path_buf(), err))?;
        Self::from_source(&source)
    }

    /// Parse a manifest from source text.
    pub fn from_source(source: &str) -> ParseResult<Self> {
        parse_environment_file(source)
    }

    /// The channels, in priority order, skipping comment entries.
    pub fn channel_list(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter_map(|entry| match entry {
            ChannelEntry::Channel { channel, .. } => Some(channel),
            ChannelEntry::Comment(_) => None,
        })
    }

    /// The active specifiers, in source order.
    pub fn active_specs(&self) -> impl Iterator<Item = &SpecEntry> {
        self.dependencies.iter().filter_map(|entry| match entry {
            DependencyEntry::Spec(spec) => Some(spec),
            _ => None,
        })
    }

    /// Partition the active specifiers by the informal comment headers.
    ///
    /// Every comment line starts a new group; entries before the first
    /// comment land in a group with no header. Empty groups (two adjacent
    /// comment lines) are kept so headers are never silently merged.
    pub fn groups(&self) -> Vec<DependencyGroup<'_>> {
        let mut groups: Vec<DependencyGroup<'_>> = Vec::new();
        for entry in &self.dependencies {
            match entry {
                DependencyEntry::Comment(text) => groups.push(DependencyGroup {
                    header: Some(text.as_str()),
                    specs: Vec::new(),
                }),
                DependencyEntry::Spec(spec) => {
                    if groups.is_empty() {
                        groups.push(DependencyGroup {
                            header: None,
                            specs: Vec::new(),
                        });
                    }
                    groups
                        .last_mut()
                        .expect("groups is non-empty here")
                        .specs
                        .push(spec);
                }
                DependencyEntry::Disabled(_) => {}
            }
        }
        groups
    }
}

/// Get the span from a marked_yaml node
pub fn get_span(node: &MarkedNode) -> Span {
    match node {
        MarkedNode::Scalar(s) => *s.span(),
        MarkedNode::Mapping(m) => *m.span(),
        MarkedNode::Sequence(s) => *s.span(),
    }
}

fn node_kind(node: &MarkedNode) -> &'static str {
    match node {
        MarkedNode::Scalar(_) => "a scalar",
        MarkedNode::Mapping(_) => "a mapping",
        MarkedNode::Sequence(_) => "a sequence",
    }
}

/// Check that every key in a mapping is a known field, with a suggestion
/// listing the valid ones otherwise.
fn validate_mapping_fields(
    mapping: &MarkedMappingNode,
    context_name: &str,
    valid_fields: &[&str],
) -> ParseResult<()> {
    for (key_node, _value_node) in mapping.iter() {
        let key = key_node.as_str();
        if !valid_fields.contains(&key) {
            return Err(ParseError::invalid_value(
                context_name,
                format!("unknown field '{}'", key),
                *key_node.span(),
            )
            .with_suggestion(format!("Valid fields are: {}", valid_fields.join(", "))));
        }
    }
    Ok(())
}

/// Parse a manifest from source text.
pub fn parse_environment_file(source: &str) -> ParseResult<EnvironmentFile> {
    let root = yaml::parse_yaml(source).map_err(ParseError::yaml_error)?;
    let mapping = root
        .as_mapping()
        .ok_or_else(|| ParseError::expected_type("a mapping", node_kind(&root), get_span(&root)))?;
    validate_mapping_fields(mapping, "environment", VALID_FIELDS)?;

    let name = match mapping.get("name") {
        None => None,
        Some(node) => {
            let scalar = node.as_scalar().ok_or_else(|| {
                ParseError::expected_type("a string", node_kind(node), get_span(node))
            })?;
            Some(scalar.as_str().to_string())
        }
    };

    let channel_items = match mapping.get("channels") {
        None => Vec::new(),
        Some(node) => parse_channels(node)?,
    };

    let mut specs = Vec::new();
    if let Some(node) = mapping.get("dependencies") {
        parse_dependency_items(node, &mut specs)?;
    }

    let layout = scan_comments(source, mapping);

    for spec in &mut specs {
        let line = spec.span.start().map(|start| start.line()).unwrap_or(0);
        spec.trailing_comment = lookup_trailing(&layout.dependency_trailing, line);
    }

    let channels = interleave_channels(channel_items, &layout);
    let dependencies = interleave_entries(specs, layout.dependency_comments);

    Ok(EnvironmentFile {
        name,
        name_trailing_comment: layout.name_trailing_comment,
        leading_comments: layout.leading_comments,
        name_comments: layout.name_comments,
        channels,
        dependencies,
    })
}

fn parse_channels(node: &MarkedNode) -> ParseResult<Vec<(usize, Channel)>> {
    // An empty `channels:` key loads as an empty scalar.
    if let Some(scalar) = node.as_scalar()
        && scalar.as_str().is_empty()
    {
        return Ok(Vec::new());
    }
    let sequence = node.as_sequence().ok_or_else(|| {
        ParseError::expected_type("a sequence of channels", node_kind(node), get_span(node))
    })?;

    let mut channels = Vec::new();
    for item in sequence.iter() {
        let scalar = item.as_scalar().ok_or_else(|| {
            ParseError::expected_type("a channel string", node_kind(item), get_span(item))
        })?;
        let channel = Channel::from_str(scalar.as_str())
            .map_err(|err| ParseError::invalid_value("channels", err.to_string(), *scalar.span()))?;
        let line = scalar.span().start().map(|start| start.line()).unwrap_or(0);
        channels.push((line, channel));
    }
    Ok(channels)
}

fn parse_dependency_items(node: &MarkedNode, specs: &mut Vec<SpecEntry>) -> ParseResult<()> {
    // An empty `dependencies:` key loads as an empty scalar.
    if let Some(scalar) = node.as_scalar()
        && scalar.as_str().is_empty()
    {
        return Ok(());
    }
    let sequence = node.as_sequence().ok_or_else(|| {
        ParseError::expected_type("a sequence of dependencies", node_kind(node), get_span(node))
    })?;

    for item in sequence.iter() {
        match item {
            MarkedNode::Scalar(scalar) => {
                let spec = DependencySpec::from_str(scalar.as_str())
                    .map_err(|err| ParseError::invalid_spec(err, *scalar.span()))?;
                specs.push(SpecEntry {
                    spec,
                    span: *scalar.span(),
                    trailing_comment: None,
                });
            }
            MarkedNode::Mapping(mapping) => {
                specs.push(parse_mapping_item(mapping)?);
            }
            MarkedNode::Sequence(_) => {
                return Err(ParseError::expected_type(
                    "a dependency string or single-key mapping",
                    "a sequence",
                    get_span(item),
                ));
            }
        }
    }
    Ok(())
}

/// Parse the single-key mapping form, `- numpy: "<1.24.0"`.
fn parse_mapping_item(mapping: &MarkedMappingNode) -> ParseResult<SpecEntry> {
    let mut entries = mapping.iter();
    let Some((key, value)) = entries.next() else {
        return Err(ParseError::generic(
            "empty mapping in dependency list",
            *mapping.span(),
        ));
    };
    if entries.next().is_some() {
        return Err(ParseError::generic(
            "dependency mappings must have exactly one key",
            *mapping.span(),
        )
        .with_suggestion("write each dependency as its own list item"));
    }

    // The key may carry extras (`coverage[toml]: ">=6.0"`) but the
    // constraint belongs in the value.
    let mut spec = DependencySpec::from_str(key.as_str())
        .map_err(|err| ParseError::invalid_spec(err, *key.span()))?;
    if spec.constraint.is_some() {
        return Err(ParseError::invalid_value(
            "dependencies",
            format!("'{}' declares a constraint in both key and value", key.as_str()),
            *key.span(),
        ));
    }

    let scalar = value.as_scalar().ok_or_else(|| {
        ParseError::expected_type("a version constraint string", node_kind(value), get_span(value))
    })?;
    let text = scalar.as_str().trim();
    if !text.is_empty() {
        let constraint = VersionConstraint::from_str(text)
            .map_err(|err| ParseError::invalid_spec(err, *scalar.span()))?;
        spec.constraint = Some(constraint);
    }

    Ok(SpecEntry {
        spec,
        span: *key.span(),
        trailing_comment: None,
    })
}

#[derive(Default)]
struct CommentLayout {
    leading_comments: Vec<String>,
    name_trailing_comment: Option<String>,
    name_comments: Vec<String>,
    /// Full-line comments inside the channels block, with 1-based lines
    channel_comments: Vec<(usize, String)>,
    /// Inline comments on channel lines
    channel_trailing: Vec<(usize, String)>,
    /// Full-line comment entries inside the dependencies block
    dependency_comments: Vec<(usize, DependencyEntry)>,
    /// Inline comments on dependency lines
    dependency_trailing: Vec<(usize, String)>,
}

/// Split a source line into its content and an optional comment trailer.
///
/// A `#` starts a comment only at the beginning of the content or after
/// whitespace, and never inside a quoted scalar.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut in_single = false;
    let mut in_double = false;
    for (i, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => {
                let at_boundary =
                    i == 0 || line[..i].ends_with(|c: char| c.is_whitespace());
                if at_boundary {
                    let text = &line[i + 1..];
                    return (&line[..i], Some(text.strip_prefix(' ').unwrap_or(text)));
                }
            }
            _ => {}
        }
    }
    (line, None)
}

/// Recover the comment lines that the YAML loader drops.
///
/// `marked-yaml` keeps spans but not comments, so the source is re-scanned
/// line by line. Each comment is attributed to the top-level key block it
/// appears in (nearest preceding key line); inline trailers are recorded
/// against their line so they can be re-attached to the parsed entries. A
/// full-line comment whose text is itself a list item with a valid
/// specifier becomes a disabled dependency entry.
fn scan_comments(source: &str, mapping: &MarkedMappingNode) -> CommentLayout {
    let key_lines: Vec<(usize, &str)> = mapping
        .iter()
        .filter_map(|(key, _)| key.span().start().map(|start| (start.line(), key.as_str())))
        .collect();
    let first_key_line = key_lines.iter().map(|(line, _)| *line).min();
    let block_of = |line_no: usize| -> Option<&str> {
        key_lines
            .iter()
            .filter(|(key_line, _)| *key_line <= line_no)
            .max_by_key(|(key_line, _)| *key_line)
            .map(|(_, key)| *key)
    };
    let key_at = |line_no: usize| -> Option<&str> {
        key_lines
            .iter()
            .find(|(key_line, _)| *key_line == line_no)
            .map(|(_, key)| *key)
    };

    let mut layout = CommentLayout::default();
    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let (content, comment) = split_comment(line);
        let Some(text) = comment else { continue };
        let text = text.to_string();

        if content.trim().is_empty() {
            // Full-line comment.
            if first_key_line.is_none_or(|first| line_no < first) {
                layout.leading_comments.push(text);
                continue;
            }
            match block_of(line_no) {
                Some("name") => layout.name_comments.push(text),
                Some("channels") => layout.channel_comments.push((line_no, text)),
                Some("dependencies") => {
                    let entry = match disabled_spec(&text) {
                        Some(spec) => DependencyEntry::Disabled(spec),
                        None => DependencyEntry::Comment(text),
                    };
                    layout.dependency_comments.push((line_no, entry));
                }
                _ => {}
            }
        } else {
            // Inline trailer on a content line.
            match key_at(line_no) {
                Some("name") => layout.name_trailing_comment = Some(text),
                // A trailer on the block key line itself becomes the
                // block's first full-line comment.
                Some("channels") => layout.channel_comments.push((line_no, text)),
                Some("dependencies") => layout
                    .dependency_comments
                    .push((line_no, DependencyEntry::Comment(text))),
                _ => match block_of(line_no) {
                    Some("channels") => layout.channel_trailing.push((line_no, text)),
                    Some("dependencies") => layout.dependency_trailing.push((line_no, text)),
                    _ => {}
                },
            }
        }
    }

    layout
}

fn lookup_trailing(trailing: &[(usize, String)], line: usize) -> Option<String> {
    trailing
        .iter()
        .find(|(trailing_line, _)| *trailing_line == line)
        .map(|(_, text)| text.clone())
}

/// Interpret a comment as a disabled dependency line if it looks like one.
fn disabled_spec(text: &str) -> Option<DependencySpec> {
    let item = text.trim_start().strip_prefix('-')?.trim_start();
    DependencySpec::from_str(item).ok()
}

/// Merge parsed channels and recovered comment lines back into source order.
fn interleave_channels(items: Vec<(usize, Channel)>, layout: &CommentLayout) -> Vec<ChannelEntry> {
    let mut entries: Vec<(usize, ChannelEntry)> = items
        .into_iter()
        .map(|(line, channel)| {
            let trailing_comment = lookup_trailing(&layout.channel_trailing, line);
            (
                line,
                ChannelEntry::Channel {
                    channel,
                    trailing_comment,
                },
            )
        })
        .collect();
    entries.extend(
        layout
            .channel_comments
            .iter()
            .map(|(line, text)| (*line, ChannelEntry::Comment(text.clone()))),
    );
    entries.sort_by_key(|(line, _)| *line);
    entries.into_iter().map(|(_, entry)| entry).collect()
}

/// Merge parsed specifiers and recovered comment lines back into source
/// order.
fn interleave_entries(
    specs: Vec<SpecEntry>,
    comments: Vec<(usize, DependencyEntry)>,
) -> Vec<DependencyEntry> {
    let mut entries: Vec<(usize, DependencyEntry)> = specs
        .into_iter()
        .map(|spec| {
            let line = spec.span.start().map(|start| start.line()).unwrap_or(0);
            (line, DependencyEntry::Spec(spec))
        })
        .collect();
    entries.extend(comments);
    entries.sort_by_key(|(line, _)| *line);
    entries.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = "\
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
    fn parses_a_full_manifest() {
        let env = EnvironmentFile::from_source(MANIFEST).unwrap();
        assert_eq!(env.name.as_deref(), Some("pandas-ci"));
        assert_eq!(env.channel_list().count(), 1);
        assert_eq!(env.active_specs().count(), 6);

        let names: Vec<_> = env
            .active_specs()
            .map(|entry| entry.spec.name.as_source().to_string())
            .collect();
        assert_eq!(
            names,
            ["cython", "pytest", "pytest-xdist", "numpy", "boto3", "coverage"]
        );
    }

    #[test]
    fn recovers_comments_and_disabled_entries() {
        let env = EnvironmentFile::from_source(MANIFEST).unwrap();
        let comments: Vec<_> = env
            .dependencies
            .iter()
            .filter_map(|entry| match entry {
                DependencyEntry::Comment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            comments,
            [
                "build dependencies",
                "test dependencies",
                "required",
                "optional"
            ]
        );

        let disabled: Vec<_> = env
            .dependencies
            .iter()
            .filter_map(|entry| match entry {
                DependencyEntry::Disabled(spec) => Some(spec.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(disabled, ["scipy"]);
    }

    #[test]
    fn groups_follow_comment_headers() {
        let env = EnvironmentFile::from_source(MANIFEST).unwrap();
        let groups = env.groups();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].header, Some("build dependencies"));
        assert_eq!(groups[1].header, Some("test dependencies"));
        assert_eq!(groups[1].specs.len(), 2);
        assert_eq!(groups[3].header, Some("optional"));
        assert_eq!(groups[3].specs.len(), 2);
    }

    #[test]
    fn mapping_form_dependency() {
        let env = EnvironmentFile::from_source(
            "dependencies:\n  - numpy: \"<1.24.0\"\n",
        )
        .unwrap();
        let entry = env.active_specs().next().unwrap();
        assert_eq!(entry.spec.to_string(), "numpy<1.24.0");
    }

    #[test]
    fn mapping_form_rejects_double_constraint() {
        let err = EnvironmentFile::from_source(
            "dependencies:\n  - numpy<1.0: \"<1.24.0\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("both key and value"));
    }

    #[test]
    fn unknown_top_level_key() {
        let err = EnvironmentFile::from_source("name: x\nprefix: /opt/env\n").unwrap_err();
        assert!(err.to_string().contains("unknown field 'prefix'"));
    }

    #[test]
    fn empty_sections_are_accepted() {
        let env = EnvironmentFile::from_source("name: empty\nchannels:\ndependencies:\n").unwrap();
        assert!(env.channels.is_empty());
        assert!(env.dependencies.is_empty());
    }

    #[test]
    fn invalid_specifier_has_a_span() {
        let err = EnvironmentFile::from_source("dependencies:\n  - numpy~=1.0\n").unwrap_err();
        let span = err.span().expect("specifier errors carry a span");
        assert_eq!(span.start().unwrap().line(), 2);
    }

    #[test]
    fn leading_comments_are_kept() {
        let env = EnvironmentFile::from_source(
            "# CI environment for the oldest supported versions\nname: minimum\n",
        )
        .unwrap();
        assert_eq!(
            env.leading_comments,
            ["CI environment for the oldest supported versions"]
        );
    }

    #[test]
    fn channel_block_comments_are_kept() {
        let env = EnvironmentFile::from_source(
            "channels:\n  # primary channel, do not reorder\n  - conda-forge\n  - defaults\n",
        )
        .unwrap();
        assert_eq!(env.channels.len(), 3);
        assert_eq!(
            env.channels[0],
            ChannelEntry::Comment("primary channel, do not reorder".to_string())
        );
        assert_eq!(env.channel_list().count(), 2);
    }

    #[test]
    fn inline_trailers_are_attached_to_their_entries() {
        let env = EnvironmentFile::from_source(
            "channels:\n  - conda-forge # keep first\ndependencies:\n  - boto3 # needed for s3 tests\n",
        )
        .unwrap();
        assert_eq!(
            env.channels[0],
            ChannelEntry::Channel {
                channel: "conda-forge".parse().unwrap(),
                trailing_comment: Some("keep first".to_string()),
            }
        );
        let entry = env.active_specs().next().unwrap();
        assert_eq!(entry.trailing_comment.as_deref(), Some("needed for s3 tests"));
    }

    #[test]
    fn name_line_comments_are_kept() {
        let env = EnvironmentFile::from_source(
            "name: ci # renamed in 2023\n# channels below are ordered\nchannels:\n  - conda-forge\n",
        )
        .unwrap();
        assert_eq!(env.name_trailing_comment.as_deref(), Some("renamed in 2023"));
        assert_eq!(env.name_comments, ["channels below are ordered"]);
    }

    #[test]
    fn hash_inside_quotes_is_not_a_comment() {
        let (content, comment) = split_comment("  - pkg: \"==1.0 # not a comment\"");
        assert_eq!(content, "  - pkg: \"==1.0 # not a comment\"");
        assert_eq!(comment, None);
    }
}
