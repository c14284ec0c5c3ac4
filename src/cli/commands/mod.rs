//! CLI command implementations

pub mod capa;
pub mod change;
pub mod completions;
pub mod doc;
pub mod event;
pub mod init;
pub mod search;
pub mod status;
pub mod user;

use console::style;
use miette::Result;

use crate::cli::helpers::print_records;
use crate::cli::table::{ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::OutputFormat;
use crate::core::entity::Entity;
use crate::core::loader::Loaded;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;

/// Ordering and paging flags shared by every list command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListView {
    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Wrap text in columns at the given width
    #[arg(long, short = 'w')]
    pub wrap: Option<usize>,
}

impl ListView {
    /// Apply `--reverse` then `--limit` to already sorted items
    pub fn apply<T>(&self, items: &mut Vec<T>) {
        if self.reverse {
            items.reverse();
        }
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
    }
}

/// How a record type names itself in list output
pub(crate) struct Listing<'a> {
    pub name: &'static str,
    pub plural: &'static str,
    pub columns: &'a [ColumnDef],
}

/// Number the listed records `@1..@N` and persist the index
pub(crate) fn remember_short_ids(
    project: &Project,
    ids: impl IntoIterator<Item = String>,
) -> ShortIdIndex {
    let mut short_ids = ShortIdIndex::new();
    short_ids.rebuild(ids);
    if let Err(e) = short_ids.save(project) {
        tracing::warn!(error = %e, "cannot save short id index");
    }
    short_ids
}

/// Give a newly created record the next free short ID
pub(crate) fn add_short_id(project: &Project, id: String) -> String {
    let mut short_ids = ShortIdIndex::load(project);
    let label = format!("@{}", short_ids.add(id));
    if let Err(e) = short_ids.save(project) {
        tracing::warn!(error = %e, "cannot save short id index");
    }
    label
}

/// Print filtered, sorted records in the requested format
pub(crate) fn print_list<T, F>(
    project: &Project,
    records: &[T],
    listing: Listing<'_>,
    view: &ListView,
    format: OutputFormat,
    to_row: F,
) -> Result<()>
where
    T: Entity,
    F: Fn(&T, &ShortIdIndex) -> TableRow,
{
    if view.count {
        println!("{}", records.len());
        return Ok(());
    }

    if records.is_empty() && !matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        println!("No {} found.", listing.plural);
        return Ok(());
    }

    let short_ids = remember_short_ids(project, records.iter().map(|r| r.id().to_string()));

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_records(records, format)?,
        _ => {
            let config = match view.wrap {
                Some(width) => TableConfig::with_wrap(width),
                None => TableConfig::default(),
            };
            let rows: Vec<TableRow> = records.iter().map(|r| to_row(r, &short_ids)).collect();
            TableFormatter::new(listing.columns, listing.name)
                .with_config(config)
                .output(rows, format);
        }
    }

    Ok(())
}

/// Print one record found by `show`
///
/// `pretty` renders the human view used when no format is requested.
pub(crate) fn show_record<T, F>(
    project: &Project,
    loaded: &Loaded<T>,
    format: OutputFormat,
    pretty: F,
) -> Result<()>
where
    T: Entity,
    F: FnOnce(&T),
{
    let record = &loaded.record;
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            crate::cli::helpers::print_record(record, format)?;
        }
        OutputFormat::Id => println!("{}", record.id()),
        OutputFormat::ShortId => {
            println!("{}", ShortIdIndex::load(project).label(&record.id().to_string()));
        }
        _ => {
            rule();
            pretty(record);
            rule();
            println!(
                "{}: {} | {}: {}",
                style("Created").dim(),
                record.created_at().format("%Y-%m-%d %H:%M"),
                style("File").dim(),
                project.relative_path(&loaded.path)
            );
        }
    }
    Ok(())
}

/// A labelled line in a `show` view
pub(crate) fn field(label: &str, value: impl std::fmt::Display) {
    println!("{}: {}", style(label).bold(), value);
}

/// A labelled line that is skipped when the value is missing or blank
pub(crate) fn optional_field(label: &str, value: Option<impl std::fmt::Display>) {
    if let Some(value) = value {
        let text = value.to_string();
        if !text.trim().is_empty() {
            field(label, text);
        }
    }
}

/// A multi-line text section in a `show` view, skipped when blank
pub(crate) fn section(label: &str, text: &str) {
    if !text.trim().is_empty() {
        println!();
        println!("{}", style(format!("{}:", label)).bold());
        println!("{}", text.trim_end());
    }
}

fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

/// Case-insensitive substring test used by `--search` filters
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_view_reverse_then_limit() {
        let view = ListView {
            reverse: true,
            limit: Some(2),
            ..ListView::default()
        };
        let mut items = vec![1, 2, 3, 4];
        view.apply(&mut items);
        assert_eq!(items, vec![4, 3]);
    }

    #[test]
    fn test_list_view_default_keeps_everything() {
        let mut items = vec!["a", "b"];
        ListView::default().apply(&mut items);
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Temperature Deviation", "temperature"));
        assert!(contains_ci("SOP-QA-001", "qa-00"));
        assert!(!contains_ci("Calibration", "audit"));
    }
}
