//! `qms change` command - Change control management

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
use crate::core::entity::{Entity, Priority};
use crate::core::loader::{self, Loaded};
use crate::core::numbering::next_number;
use crate::core::overdue::is_overdue;
use crate::core::shortid::ShortIdIndex;
use crate::core::{Config, SessionContext};
use crate::entities::{ChangeControl, ChangeStatus};

#[derive(Subcommand, Debug)]
pub enum ChangeCommands {
    /// List change controls with filtering
    List(ListArgs),

    /// Request a new change
    New(NewArgs),

    /// Show a change control's details
    Show(ShowArgs),
}

/// Sort field for change lists
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortField {
    Number,
    Title,
    Status,
    Priority,
    Due,
    #[default]
    Created,
}

const CHANGE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NUMBER", 14),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("type", "TYPE", 16),
    ColumnDef::new("status", "STATUS", 18),
    ColumnDef::new("priority", "PRIORITY", 10),
    ColumnDef::new("requested", "REQUESTED BY", 18),
    ColumnDef::new("due", "DUE", 10),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in title, number and description
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by change status
    #[arg(long)]
    pub status: Option<ChangeStatus>,

    /// Filter by priority
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Show only overdue changes
    #[arg(long)]
    pub overdue: bool,

    /// Sort by field
    #[arg(long, default_value = "created")]
    pub sort: SortField,

    #[command(flatten)]
    pub view: ListView,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Change title
    #[arg(long, short = 't')]
    pub title: String,

    /// What changes and why
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Change type (e.g. Process, Document, Equipment)
    #[arg(long = "type", short = 'T', default_value = "Process")]
    pub change_type: String,

    /// Change number (default: next CR-YYYY-NNN)
    #[arg(long)]
    pub number: Option<String>,

    /// Priority
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: Priority,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Change number, ID, partial ID or short ID (@N)
    pub id: String,
}

/// Run a change subcommand
pub fn run(cmd: ChangeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChangeCommands::List(args) => run_list(args, global),
        ChangeCommands::New(args) => run_new(args, global),
        ChangeCommands::Show(args) => run_show(args, global),
    }
}

fn filter_changes(
    changes: Vec<ChangeControl>,
    args: &ListArgs,
    ctx: &SessionContext,
) -> Vec<ChangeControl> {
    changes
        .into_iter()
        .filter(|c| {
            args.search.as_deref().map_or(true, |q| {
                contains_ci(&c.title, q)
                    || contains_ci(&c.change_number, q)
                    || contains_ci(&c.description, q)
            })
        })
        .filter(|c| args.status.map_or(true, |s| c.status == s))
        .filter(|c| args.priority.map_or(true, |p| c.priority == p))
        .filter(|c| !args.overdue || is_overdue(c, ctx.today))
        .collect()
}

fn sort_changes(changes: &mut [ChangeControl], sort: SortField) {
    match sort {
        SortField::Number => changes.sort_by(|a, b| a.change_number.cmp(&b.change_number)),
        SortField::Title => changes.sort_by_key(|c| c.title.to_lowercase()),
        SortField::Status => changes.sort_by_key(|c| c.status),
        SortField::Priority => changes.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortField::Due => changes.sort_by_key(|c| (c.due_date.is_none(), c.due_date)),
        SortField::Created => changes.sort_by_key(|c| c.created_at),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let all: Vec<ChangeControl> = loader::load_all(&project)
        .into_iter()
        .map(|l: Loaded<ChangeControl>| l.record)
        .collect();
    let mut changes = filter_changes(all, &args, &ctx);
    sort_changes(&mut changes, args.sort);
    args.view.apply(&mut changes);

    let listing = Listing {
        name: "change",
        plural: "change controls",
        columns: CHANGE_COLUMNS,
    };
    print_list(&project, &changes, listing, &args.view, format, change_to_row)
}

fn change_to_row(change: &ChangeControl, short_ids: &ShortIdIndex) -> TableRow {
    TableRow::new(change.id.to_string(), short_ids)
        .cell("number", CellValue::Text(change.change_number.clone()))
        .cell("title", CellValue::Text(change.title.clone()))
        .cell("type", CellValue::text(Some(&change.change_type)))
        .cell(
            "status",
            CellValue::badge(change.status.as_str(), change.status.badge()),
        )
        .cell(
            "priority",
            CellValue::badge(change.priority.as_str(), change.priority.badge()),
        )
        .cell("requested", CellValue::Text(change.requested_by.clone()))
        .cell("due", CellValue::date(change.due_date))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);

    let existing: Vec<Loaded<ChangeControl>> = loader::load_all(&project);
    let number = match args.number {
        Some(n) => n.trim().to_string(),
        None => next_number(
            "CR",
            ctx.now.year(),
            existing.iter().map(|l| l.record.change_number.as_str()),
        ),
    };

    let requester = ctx.author_or(&config.author());
    let mut change = ChangeControl::new(number, args.title, args.change_type, requester, ctx.now);
    change.description = args.description;
    change.priority = args.priority;
    change.due_date = args.due;

    let path = loader::save(&project, &change)?;
    let short_id = add_short_id(&project, change.id.to_string());
    tracing::debug!(id = %change.id, number = %change.change_number, "created change control");

    match global.format {
        OutputFormat::Id => println!("{}", change.id),
        OutputFormat::ShortId => println!("{}", short_id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Created change {} {}",
                style("✓").green(),
                style(&change.change_number).yellow(),
                style(&short_id).cyan()
            );
            println!("   {}", style(project.relative_path(&path)).dim());
            println!(
                "   {} | {}",
                style(&change.change_type).yellow(),
                style(&change.title).white()
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

    let loaded =
        loader::find::<ChangeControl>(&project, &args.id, &ShortIdIndex::load(&project))?;

    show_record(&project, &loaded, format, |change| {
        field("ID", style(change.id()).cyan());
        field("Number", &change.change_number);
        field("Title", style(&change.title).yellow());
        field("Type", &change.change_type);
        field(
            "Status",
            paint(change.status.badge().tone, change.status.badge()),
        );
        field(
            "Priority",
            paint(change.priority.badge().tone, change.priority.badge()),
        );
        field("Requested by", &change.requested_by);
        optional_field("Approved by", change.approved_by.as_deref());
        if let Some(due) = change.due_date {
            if is_overdue(change, ctx.today) {
                field("Due", format!("{} {}", due, style("(overdue)").red().bold()));
            } else {
                field("Due", due);
            }
        }
        optional_field("Completed", change.completed_date);
        section("Description", &change.description);
    })
}
