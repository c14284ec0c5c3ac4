//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader;
use crate::core::{Config, Project, SessionContext};
use crate::entities::UserProfile;

/// Find the project named by `--project`, or the one enclosing the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Build the acting session for a command
///
/// The current user is the profile whose email matches the configured
/// `user`; the organization comes from `.qms/organization.yaml`.
pub fn session(project: &Project, config: &Config) -> SessionContext {
    let user = config.user.as_deref().and_then(|email| {
        loader::load_all::<UserProfile>(project)
            .into_iter()
            .map(|l| l.record)
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
    });

    if config.user.is_some() && user.is_none() {
        tracing::warn!(user = ?config.user, "configured user has no profile in this project");
    }

    SessionContext::new(project.organization(), user)
}

/// Print a single record for `show`
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(record).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(record).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Print records as a JSON array or YAML sequence
pub fn print_records<T: Serialize>(records: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(records).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(records).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Format a string ID for display, truncating if too long
///
/// IDs longer than 16 characters are cut to 13 with a "..." suffix.
pub fn format_short_id_str(id: &str) -> String {
    truncate_str(id, 16)
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
