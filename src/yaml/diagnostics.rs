//! Record file errors rendered with the offending line highlighted

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A record file that could not be parsed, with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid record file: {message}")]
#[diagnostic(code(qms::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying parser message
    message: String,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error and the text that produced it
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convert a 1-based line/column to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            let line_start = i;
            let mut col = 1;
            for (j, c) in source[line_start..].char_indices() {
                if col == column {
                    return line_start + j;
                }
                if c == '\n' {
                    break;
                }
                col += 1;
            }
            return line_start + column.saturating_sub(1);
        }
        if ch == '\n' {
            current_line += 1;
        }
        offset = i;
    }

    offset
}

/// Suggest a fix for the common ways a hand-edited record goes wrong
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("unknown variant") {
        return Some(
            "Status, priority, severity and role values must be one of the listed keys, \
             in snake_case (e.g. pending_review)"
                .to_string(),
        );
    }

    if msg.contains("missing field") {
        return Some("Add the missing field; `qms <type> new` writes a complete record.".to_string());
    }

    if msg.contains("invalid id") || msg.contains("invalid ulid") || msg.contains("prefix") {
        return Some("Ids look like CAPA-01HQ3K4N5M6P7R8S9T0VWXYZAB.".to_string());
    }

    if msg.contains("premature end of input") || msg.contains("input contains invalid characters")
    {
        return Some(
            "Dates are written YYYY-MM-DD and timestamps as RFC 3339 (2024-01-15T09:00:00Z)."
                .to_string(),
        );
    }

    if msg.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg.contains("duplicate key") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg.contains("mapping values are not allowed") {
        return Some(
            "You may be missing a space after ':' or have incorrect indentation.".to_string(),
        );
    }

    if msg.contains("found unexpected ':'") {
        return Some("Colons in values need to be quoted: \"value:with:colons\"".to_string());
    }

    None
}
