//! `qms event` command - Quality event tracking

use chrono::{Datelike, NaiveDate};
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::commands::{
    add_short_id, contains_ci, field, optional_field, print_list, section, show_record, ListView,
    Listing,
};
use crate::cli::helpers::{open_project, session};
use crate::cli::table::{paint, CellValue, ColumnDef, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::classify::Badged;
use crate::core::entity::Entity;
use crate::core::loader::{self, Loaded};
use crate::core::numbering::next_number;
use crate::core::overdue::is_overdue;
use crate::core::shortid::ShortIdIndex;
use crate::core::{Config, SessionContext};
use crate::entities::{EventStatus, QualityEvent, Severity};

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// List quality events with filtering
    List(ListArgs),

    /// Report a new quality event
    New(NewArgs),

    /// Show a quality event's details
    Show(ShowArgs),
}

/// Sort field for event lists
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortField {
    Number,
    Title,
    Status,
    Severity,
    #[default]
    Reported,
    Due,
}

const EVENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NUMBER", 14),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("severity", "SEVERITY", 10),
    ColumnDef::new("status", "STATUS", 20),
    ColumnDef::new("reported", "REPORTED", 10),
    ColumnDef::new("due", "DUE", 10),
    ColumnDef::new("overdue", "OVERDUE", 7),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in title, number and description
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by event status
    #[arg(long)]
    pub status: Option<EventStatus>,

    /// Filter by severity
    #[arg(long)]
    pub severity: Option<Severity>,

    /// Show only overdue events
    #[arg(long)]
    pub overdue: bool,

    /// Sort by field
    #[arg(long, default_value = "reported")]
    pub sort: SortField,

    #[command(flatten)]
    pub view: ListView,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Event title
    #[arg(long, short = 't')]
    pub title: String,

    /// What happened
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Event type (e.g. Deviation, Non-conformance, Complaint)
    #[arg(long = "type", short = 'T', default_value = "Deviation")]
    pub event_type: String,

    /// Event number (default: next QE-YYYY-NNN)
    #[arg(long)]
    pub number: Option<String>,

    /// Severity
    #[arg(long, short = 'S', default_value = "medium")]
    pub severity: Severity,

    /// Person investigating
    #[arg(long, short = 'a')]
    pub assigned: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Event number, ID, partial ID or short ID (@N)
    pub id: String,
}

/// Run an event subcommand
pub fn run(cmd: EventCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EventCommands::List(args) => run_list(args, global),
        EventCommands::New(args) => run_new(args, global),
        EventCommands::Show(args) => run_show(args, global),
    }
}

fn filter_events(
    events: Vec<QualityEvent>,
    args: &ListArgs,
    ctx: &SessionContext,
) -> Vec<QualityEvent> {
    events
        .into_iter()
        .filter(|e| {
            args.search.as_deref().map_or(true, |q| {
                contains_ci(&e.title, q)
                    || contains_ci(&e.event_number, q)
                    || contains_ci(&e.description, q)
            })
        })
        .filter(|e| args.status.map_or(true, |s| e.status == s))
        .filter(|e| args.severity.map_or(true, |s| e.severity == s))
        .filter(|e| !args.overdue || is_overdue(e, ctx.today))
        .collect()
}

fn sort_events(events: &mut [QualityEvent], sort: SortField) {
    match sort {
        SortField::Number => events.sort_by(|a, b| a.event_number.cmp(&b.event_number)),
        SortField::Title => events.sort_by_key(|e| e.title.to_lowercase()),
        SortField::Status => events.sort_by_key(|e| e.status),
        SortField::Severity => events.sort_by(|a, b| b.severity.cmp(&a.severity)),
        SortField::Reported => events.sort_by_key(|e| (e.reported_date, e.created_at)),
        SortField::Due => events.sort_by_key(|e| (e.due_date.is_none(), e.due_date)),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let all: Vec<QualityEvent> = loader::load_all(&project)
        .into_iter()
        .map(|l: Loaded<QualityEvent>| l.record)
        .collect();
    let mut events = filter_events(all, &args, &ctx);
    sort_events(&mut events, args.sort);
    args.view.apply(&mut events);

    let listing = Listing {
        name: "event",
        plural: "quality events",
        columns: EVENT_COLUMNS,
    };
    print_list(&project, &events, listing, &args.view, format, |e, ids| {
        event_to_row(e, ids, &ctx)
    })
}

fn event_to_row(event: &QualityEvent, short_ids: &ShortIdIndex, ctx: &SessionContext) -> TableRow {
    TableRow::new(event.id.to_string(), short_ids)
        .cell("number", CellValue::Text(event.event_number.clone()))
        .cell("title", CellValue::Text(event.title.clone()))
        .cell("type", CellValue::text(Some(&event.event_type)))
        .cell(
            "severity",
            CellValue::badge(event.severity.as_str(), event.severity.badge()),
        )
        .cell(
            "status",
            CellValue::badge(event.status.as_str(), event.status.badge()),
        )
        .cell("reported", CellValue::Date(event.reported_date))
        .cell("due", CellValue::date(event.due_date))
        .cell("overdue", CellValue::Overdue(is_overdue(event, ctx.today)))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);

    let existing: Vec<Loaded<QualityEvent>> = loader::load_all(&project);
    let number = match args.number {
        Some(n) => n.trim().to_string(),
        None => next_number(
            "QE",
            ctx.now.year(),
            existing.iter().map(|l| l.record.event_number.as_str()),
        ),
    };

    let reporter = ctx.author_or(&config.author());
    let mut event = QualityEvent::new(number, args.title, args.event_type, reporter, ctx.now);
    event.reported_date = ctx.today;
    event.description = args.description;
    event.severity = args.severity;
    event.assigned_to = args.assigned;
    event.due_date = args.due;

    let path = loader::save(&project, &event)?;
    let short_id = add_short_id(&project, event.id.to_string());
    tracing::debug!(id = %event.id, number = %event.event_number, "reported quality event");

    match global.format {
        OutputFormat::Id => println!("{}", event.id),
        OutputFormat::ShortId => println!("{}", short_id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Reported event {} {}",
                style("✓").green(),
                style(&event.event_number).yellow(),
                style(&short_id).cyan()
            );
            println!("   {}", style(project.relative_path(&path)).dim());
            println!(
                "   {} | {}",
                paint(event.severity.badge().tone, event.severity.badge()),
                style(&event.title).white()
            );
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Auto);

    let loaded = loader::find::<QualityEvent>(&project, &args.id, &ShortIdIndex::load(&project))?;

    show_record(&project, &loaded, format, |event| {
        field("ID", style(event.id()).cyan());
        field("Number", &event.event_number);
        field("Title", style(&event.title).yellow());
        field("Type", &event.event_type);
        field(
            "Severity",
            paint(event.severity.badge().tone, event.severity.badge()),
        );
        field(
            "Status",
            paint(event.status.badge().tone, event.status.badge()),
        );
        field("Reported", format!("{} by {}", event.reported_date, event.reported_by));
        optional_field("Assigned", event.assigned_to.as_deref());
        if let Some(due) = event.due_date {
            if is_overdue(event, ctx.today) {
                field("Due", format!("{} {}", due, style("(overdue)").red().bold()));
            } else {
                field("Due", due);
            }
        }
        optional_field("Closed", event.closed_date);
        section("Description", &event.description);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx() -> SessionContext {
        SessionContext::fixed(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap())
    }

    fn event(number: &str, title: &str, severity: Severity, status: EventStatus) -> QualityEvent {
        let mut e = QualityEvent::new(
            number.to_string(),
            title.to_string(),
            "Deviation".to_string(),
            "Emily Davis".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        );
        e.severity = severity;
        e.status = status;
        e
    }

    fn list_args() -> ListArgs {
        ListArgs {
            search: None,
            status: None,
            severity: None,
            overdue: false,
            sort: SortField::Reported,
            view: ListView::default(),
        }
    }

    fn sample() -> Vec<QualityEvent> {
        let mut storage = event(
            "QE-2024-001",
            "Temperature Deviation in Storage Room A",
            Severity::High,
            EventStatus::UnderInvestigation,
        );
        storage.description = "Temperature exceeded 25°C for 2 hours".to_string();
        storage.due_date = Some(ctx().today - Duration::days(1));

        let mut complaint = event(
            "QE-2024-002",
            "Customer Complaint - Product Quality",
            Severity::Medium,
            EventStatus::Open,
        );
        complaint.due_date = Some(ctx().today + Duration::days(3));

        let mut closed = event(
            "QE-2024-003",
            "Calibration Overdue",
            Severity::Low,
            EventStatus::Closed,
        );
        closed.due_date = Some(ctx().today - Duration::days(5));

        vec![storage, complaint, closed]
    }

    #[test]
    fn test_search_in_description() {
        let mut args = list_args();
        args.search = Some("25°c".to_string());
        let found = filter_events(sample(), &args, &ctx());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].event_number, "QE-2024-001");
    }

    #[test]
    fn test_overdue_filter() {
        let mut args = list_args();
        args.overdue = true;
        let found = filter_events(sample(), &args, &ctx());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].event_number, "QE-2024-001");
    }

    #[test]
    fn test_severity_and_status_filters() {
        let mut args = list_args();
        args.severity = Some(Severity::Medium);
        assert_eq!(filter_events(sample(), &args, &ctx()).len(), 1);

        args.severity = None;
        args.status = Some(EventStatus::PendingApproval);
        assert!(filter_events(sample(), &args, &ctx()).is_empty());
    }

    #[test]
    fn test_severity_sort_is_most_severe_first() {
        let mut events = sample();
        sort_events(&mut events, SortField::Severity);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[2].severity, Severity::Low);
    }
}
