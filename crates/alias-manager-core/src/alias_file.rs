/// Reading and rewriting the managed alias region of a shell profile.
/// The region opens with a sentinel comment (the marker) and runs to the
/// last `alias` line after it. Inside, `# name` comments start a section and
/// `alias NAME=VALUE` lines define aliases. Everything before the marker and
/// everything after the region is carried over verbatim on rewrite.
use std::collections::BTreeMap;

use alias_manager_config::{DEFAULT_MARKER, DEFAULT_SUB_ITEM_PREFIX};

use crate::model::AliasRecord;

const ALIAS_PREFIX: &str = "alias ";
const COMMENT_PREFIX: &str = "# ";

/// Line conventions of the managed region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasFileFormat {
    /// Sentinel line that opens the region (compared after trimming).
    pub marker: String,
    /// Comment prefix that marks a sub-item rather than a section header.
    pub sub_item_prefix: String,
}

impl Default for AliasFileFormat {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            sub_item_prefix: DEFAULT_SUB_ITEM_PREFIX.to_string(),
        }
    }
}

impl AliasFileFormat {
    pub fn new(marker: impl Into<String>, sub_item_prefix: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            sub_item_prefix: sub_item_prefix.into(),
        }
    }

    fn is_marker(&self, line: &str) -> bool {
        line.trim() == self.marker
    }

    /// Returns the section named by a header line, if `trimmed` is one.
    fn section_header<'a>(&self, trimmed: &'a str) -> Option<&'a str> {
        if trimmed == self.marker || trimmed.starts_with(self.sub_item_prefix.as_str()) {
            return None;
        }
        trimmed.strip_prefix(COMMENT_PREFIX)
    }

    /// The header line written for `section`.
    pub fn header_line(&self, section: &str) -> String {
        format!("{COMMENT_PREFIX}{section}\n")
    }

    /// Whether `section` would read back as the same section from its header.
    pub fn is_writable_section(&self, section: &str) -> bool {
        let header = self.header_line(section);
        self.section_header(header.trim()) == Some(section)
    }
}

/// An alias definition found in the managed region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAlias {
    pub name: String,
    pub command: String,
    pub section: String,
}

/// Result of scanning a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub aliases: Vec<ParsedAlias>,
    /// Section headers in file order, without duplicates.
    pub sections: Vec<String>,
    pub marker_found: bool,
}

/// Line span of the managed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    /// Index of the marker line.
    marker: usize,
    /// Index one past the last `alias` line (or one past the marker).
    end: usize,
}

/// Splits text into lines, keeping each line's terminator.
fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn is_alias_line(trimmed: &str) -> bool {
    trimmed.starts_with(ALIAS_PREFIX)
}

fn locate_region(lines: &[&str], format: &AliasFileFormat) -> Option<Region> {
    let marker = lines.iter().position(|l| format.is_marker(l))?;
    let end = (marker + 1..lines.len())
        .rev()
        .find(|&i| is_alias_line(lines[i].trim()))
        .map_or(marker + 1, |i| i + 1);
    Some(Region { marker, end })
}

/// First line after the region that belongs to someone else.
///
/// Blank lines, stray `alias` lines and `# ` comments directly after the
/// region are considered leftovers of the generated block and skipped.
fn trailing_start(lines: &[&str], region: Region) -> Option<usize> {
    (region.end..lines.len()).find(|&i| {
        let t = lines[i].trim();
        !t.is_empty() && !is_alias_line(t) && !t.starts_with(COMMENT_PREFIX)
    })
}

/// Removes one layer of matching single or double quotes.
pub fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Splits a trimmed `alias NAME=VALUE` line into name and unquoted command.
pub fn parse_alias_line(trimmed: &str) -> Option<(String, String)> {
    let rest = trimmed.strip_prefix(ALIAS_PREFIX)?;
    let (name, value) = rest.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), unquote(value.trim()).to_string()))
}

/// Formats one alias definition.
///
/// Commands containing a single quote are wrapped in double quotes so the
/// quote does not terminate the value; everything else uses single quotes.
pub fn alias_line(name: &str, command: &str) -> String {
    if command.contains('\'') {
        format!("{ALIAS_PREFIX}{name}=\"{command}\"\n")
    } else {
        format!("{ALIAS_PREFIX}{name}='{command}'\n")
    }
}

/// Scans `text` for aliases and section headers inside the managed region.
pub fn parse(text: &str, format: &AliasFileFormat) -> ParsedFile {
    let lines = split_lines(text);
    let Some(region) = locate_region(&lines, format) else {
        return ParsedFile::default();
    };

    let mut parsed = ParsedFile {
        marker_found: true,
        ..ParsedFile::default()
    };
    let mut current_section = String::new();

    for (offset, line) in lines[region.marker + 1..region.end].iter().enumerate() {
        let trimmed = line.trim();
        if is_alias_line(trimmed) {
            match parse_alias_line(trimmed) {
                Some((name, command)) => parsed.aliases.push(ParsedAlias {
                    name,
                    command,
                    section: current_section.clone(),
                }),
                None => tracing::debug!(
                    "Skipping malformed alias line {}: {trimmed}",
                    region.marker + offset + 2
                ),
            }
        } else if let Some(section) = format.section_header(trimmed) {
            current_section = section.to_string();
            if !parsed.sections.iter().any(|s| s == section) {
                parsed.sections.push(current_section.clone());
            }
        }
    }

    parsed
}

/// Rewrites the managed region of `text` with `aliases`.
///
/// Sections are emitted in lexicographic order, aliases by name within each
/// section. Aliases without a section are written first, with no header.
/// Returns `None` if the marker is missing.
pub fn render(text: &str, format: &AliasFileFormat, aliases: &[AliasRecord]) -> Option<String> {
    let lines = split_lines(text);
    let region = locate_region(&lines, format)?;

    let mut out = String::with_capacity(text.len() + aliases.len() * 32);
    for line in &lines[..=region.marker] {
        out.push_str(line);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');

    let mut by_section: BTreeMap<&str, Vec<&AliasRecord>> = BTreeMap::new();
    for alias in aliases {
        by_section.entry(alias.section.as_str()).or_default().push(alias);
    }
    for (section, mut members) in by_section {
        if !section.is_empty() {
            out.push_str(&format.header_line(section));
        }
        members.sort_by(|a, b| a.name.cmp(&b.name));
        for alias in members {
            out.push_str(&alias_line(&alias.name, &alias.command));
        }
        out.push('\n');
    }

    if let Some(start) = trailing_start(&lines, region) {
        for line in &lines[start..] {
            out.push_str(line);
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> AliasFileFormat {
        AliasFileFormat::default()
    }

    fn record(name: &str, command: &str, section: &str) -> AliasRecord {
        AliasRecord::new(name, command, section, "")
    }

    const SAMPLE: &str = "\
export PATH=$PATH:~/bin
# CUSTOM ALIASES

# git
alias gs='git status'
alias gl=\"git log --format='%h %s'\"
# ↓ push helpers
alias gp='git push'

# files
alias ll='ls -la'

if [ -f ~/.extra ]; then
    . ~/.extra
fi
";

    #[test]
    fn test_parse_sections_and_aliases() {
        let parsed = parse(SAMPLE, &fmt());
        assert!(parsed.marker_found);
        assert_eq!(parsed.sections, vec!["git".to_string(), "files".to_string()]);
        let names: Vec<&str> = parsed.aliases.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["gs", "gl", "gp", "ll"]);
        assert_eq!(parsed.aliases[1].command, "git log --format='%h %s'");
        // The sub-item comment does not open a new section
        assert_eq!(parsed.aliases[2].section, "git");
        assert_eq!(parsed.aliases[3].section, "files");
    }

    #[test]
    fn test_parse_without_marker() {
        let parsed = parse("alias gs='git status'\n", &fmt());
        assert!(!parsed.marker_found);
        assert!(parsed.aliases.is_empty());
    }

    #[test]
    fn test_parse_ignores_aliases_before_marker() {
        let text = "alias early='x'\n# CUSTOM ALIASES\n# s\nalias late='y'\n";
        let parsed = parse(text, &fmt());
        assert_eq!(parsed.aliases.len(), 1);
        assert_eq!(parsed.aliases[0].name, "late");
    }

    #[test]
    fn test_parse_alias_before_any_header_has_empty_section() {
        let parsed = parse("# CUSTOM ALIASES\nalias x='y'\n", &fmt());
        assert_eq!(parsed.aliases[0].section, "");
        assert!(parsed.sections.is_empty());
    }

    #[test]
    fn test_parse_skips_alias_without_equals() {
        let parsed = parse("# CUSTOM ALIASES\n# s\nalias broken\nalias ok='1'\n", &fmt());
        assert_eq!(parsed.aliases.len(), 1);
        assert_eq!(parsed.aliases[0].name, "ok");
    }

    #[test]
    fn test_parse_handles_crlf() {
        let text = "# CUSTOM ALIASES\r\n# git\r\nalias gs='git status'\r\n";
        let parsed = parse(text, &fmt());
        assert_eq!(parsed.sections, vec!["git".to_string()]);
        assert_eq!(parsed.aliases[0].command, "git status");
    }

    #[test]
    fn test_parse_alias_line_variants() {
        assert_eq!(
            parse_alias_line("alias ll='ls -la'"),
            Some(("ll".to_string(), "ls -la".to_string()))
        );
        assert_eq!(
            parse_alias_line("alias k=kubectl"),
            Some(("k".to_string(), "kubectl".to_string()))
        );
        assert_eq!(
            parse_alias_line("alias eq='a=b'"),
            Some(("eq".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_alias_line("alias =x"), None);
        assert_eq!(parse_alias_line("unalias x"), None);
    }

    #[test]
    fn test_unquote_strips_one_matching_layer() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("\"a\""), "a");
        assert_eq!(unquote("''a''"), "'a'");
        assert_eq!(unquote("'a\""), "'a\"");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_alias_line_quoting() {
        assert_eq!(alias_line("gs", "git status"), "alias gs='git status'\n");
        assert_eq!(
            alias_line("q", "echo 'hi'"),
            "alias q=\"echo 'hi'\"\n"
        );
    }

    #[test]
    fn test_render_sorts_sections_and_names() {
        let aliases = vec![
            record("zz", "z", "misc"),
            record("gs", "git status", "git"),
            record("ga", "git add", "git"),
            record("Gb", "git branch", "git"),
        ];
        let out = render("top\n# CUSTOM ALIASES\n", &fmt(), &aliases).expect("marker");
        assert_eq!(
            out,
            "top\n# CUSTOM ALIASES\n\n# git\nalias Gb='git branch'\nalias ga='git add'\nalias gs='git status'\n\n# misc\nalias zz='z'\n\n"
        );
    }

    #[test]
    fn test_render_preserves_prefix_and_trailing_content() {
        let aliases = vec![record("gs", "git status", "git")];
        let out = render(SAMPLE, &fmt(), &aliases).expect("marker");
        assert!(out.starts_with("export PATH=$PATH:~/bin\n# CUSTOM ALIASES\n\n# git\n"));
        assert!(out.ends_with("\nif [ -f ~/.extra ]; then\n    . ~/.extra\nfi\n"));
        assert!(!out.contains("alias ll="));
    }

    #[test]
    fn test_render_without_marker_is_none() {
        assert!(render("alias a='b'\n", &fmt(), &[]).is_none());
    }

    #[test]
    fn test_render_marker_without_newline_at_eof() {
        let out = render("# CUSTOM ALIASES", &fmt(), &[record("a", "b", "s")]).expect("marker");
        assert_eq!(out, "# CUSTOM ALIASES\n\n# s\nalias a='b'\n\n");
    }

    #[test]
    fn test_render_empty_region_keeps_following_code() {
        let text = "# CUSTOM ALIASES\n\nexport EDITOR=vim\n";
        let out = render(text, &fmt(), &[]).expect("marker");
        assert_eq!(out, "# CUSTOM ALIASES\n\nexport EDITOR=vim\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let parsed = parse(SAMPLE, &fmt());
        let aliases: Vec<AliasRecord> = parsed
            .aliases
            .iter()
            .map(|a| record(&a.name, &a.command, &a.section))
            .collect();
        let once = render(SAMPLE, &fmt(), &aliases).expect("marker");
        let reparsed = parse(&once, &fmt());
        let again: Vec<AliasRecord> = reparsed
            .aliases
            .iter()
            .map(|a| record(&a.name, &a.command, &a.section))
            .collect();
        let twice = render(&once, &fmt(), &again).expect("marker");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unsectioned_aliases_round_trip() {
        let aliases = vec![record("x", "y", ""), record("a", "b", "s")];
        let out = render("# CUSTOM ALIASES\n", &fmt(), &aliases).expect("marker");
        assert_eq!(out, "# CUSTOM ALIASES\n\nalias x='y'\n\n# s\nalias a='b'\n\n");
        let parsed = parse(&out, &fmt());
        assert_eq!(parsed.aliases[0].section, "");
        assert_eq!(parsed.aliases[1].section, "s");
    }

    #[test]
    fn test_is_writable_section() {
        let format = fmt();
        assert!(format.is_writable_section("git"));
        assert!(!format.is_writable_section("↓ nested"));
        assert!(!format.is_writable_section("CUSTOM ALIASES"));
    }
}
