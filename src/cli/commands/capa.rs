//! `qms capa` command - Corrective/Preventive Action management

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
use crate::entities::{Capa, CapaStatus};

#[derive(Subcommand, Debug)]
pub enum CapaCommands {
    /// List CAPAs with filtering
    List(ListArgs),

    /// Create a new CAPA
    New(NewArgs),

    /// Show a CAPA's details
    Show(ShowArgs),
}

/// Sort field for CAPA lists
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

const CAPA_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NUMBER", 16),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("status", "STATUS", 20),
    ColumnDef::new("priority", "PRIORITY", 10),
    ColumnDef::new("assigned", "ASSIGNED", 18),
    ColumnDef::new("due", "DUE", 10),
    ColumnDef::new("overdue", "OVERDUE", 7),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in title, number and description
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by CAPA status
    #[arg(long)]
    pub status: Option<CapaStatus>,

    /// Filter by priority
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Filter by assignee (substring)
    #[arg(long)]
    pub assigned: Option<String>,

    /// Show only overdue CAPAs
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
    /// CAPA title
    #[arg(long, short = 't')]
    pub title: String,

    /// Problem description
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// CAPA number (default: next CAPA-YYYY-NNN)
    #[arg(long)]
    pub number: Option<String>,

    /// Priority
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: Priority,

    /// Person responsible (default: the author)
    #[arg(long, short = 'a')]
    pub assigned: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// What raised the CAPA (e.g. quality_event, audit, complaint)
    #[arg(long, default_value = "")]
    pub source_type: String,

    /// Reference of the originating record (e.g. QE-2024-001)
    #[arg(long, default_value = "")]
    pub source_id: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// CAPA number, ID, partial ID or short ID (@N)
    pub id: String,
}

/// Run a CAPA subcommand
pub fn run(cmd: CapaCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CapaCommands::List(args) => run_list(args, global),
        CapaCommands::New(args) => run_new(args, global),
        CapaCommands::Show(args) => run_show(args, global),
    }
}

/// Apply list filters in order: search, status, priority, assignee, overdue
fn filter_capas(capas: Vec<Capa>, args: &ListArgs, ctx: &SessionContext) -> Vec<Capa> {
    capas
        .into_iter()
        .filter(|c| {
            args.search.as_deref().map_or(true, |q| {
                contains_ci(&c.title, q)
                    || contains_ci(&c.capa_number, q)
                    || contains_ci(&c.description, q)
            })
        })
        .filter(|c| args.status.map_or(true, |s| c.status == s))
        .filter(|c| args.priority.map_or(true, |p| c.priority == p))
        .filter(|c| {
            args.assigned
                .as_deref()
                .map_or(true, |a| contains_ci(&c.assigned_to, a))
        })
        .filter(|c| !args.overdue || is_overdue(c, ctx.today))
        .collect()
}

fn sort_capas(capas: &mut [Capa], sort: SortField) {
    match sort {
        SortField::Number => capas.sort_by(|a, b| a.capa_number.cmp(&b.capa_number)),
        SortField::Title => capas.sort_by_key(|c| c.title.to_lowercase()),
        SortField::Status => capas.sort_by_key(|c| c.status),
        // Most urgent first
        SortField::Priority => capas.sort_by(|a, b| b.priority.cmp(&a.priority)),
        // Undated CAPAs last
        SortField::Due => capas.sort_by_key(|c| (c.due_date.is_none(), c.due_date)),
        SortField::Created => capas.sort_by_key(|c| c.created_at),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let all: Vec<Capa> = loader::load_all(&project)
        .into_iter()
        .map(|l: Loaded<Capa>| l.record)
        .collect();
    let mut capas = filter_capas(all, &args, &ctx);
    sort_capas(&mut capas, args.sort);
    args.view.apply(&mut capas);

    let listing = Listing {
        name: "CAPA",
        plural: "CAPAs",
        columns: CAPA_COLUMNS,
    };
    print_list(&project, &capas, listing, &args.view, format, |c, ids| {
        capa_to_row(c, ids, &ctx)
    })
}

fn capa_to_row(capa: &Capa, short_ids: &ShortIdIndex, ctx: &SessionContext) -> TableRow {
    TableRow::new(capa.id.to_string(), short_ids)
        .cell("number", CellValue::Text(capa.capa_number.clone()))
        .cell("title", CellValue::Text(capa.title.clone()))
        .cell(
            "status",
            CellValue::badge(capa.status.as_str(), capa.status.badge()),
        )
        .cell(
            "priority",
            CellValue::badge(capa.priority.as_str(), capa.priority.badge()),
        )
        .cell("assigned", CellValue::text(Some(&capa.assigned_to)))
        .cell("due", CellValue::date(capa.due_date))
        .cell("overdue", CellValue::Overdue(is_overdue(capa, ctx.today)))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);

    let existing: Vec<Loaded<Capa>> = loader::load_all(&project);
    let number = match args.number {
        Some(n) => n.trim().to_string(),
        None => next_number(
            "CAPA",
            ctx.now.year(),
            existing.iter().map(|l| l.record.capa_number.as_str()),
        ),
    };

    let author = ctx.author_or(&config.author());
    let assigned = args.assigned.unwrap_or_else(|| author.clone());
    let mut capa = Capa::new(number, args.title, assigned, author, ctx.now);
    capa.description = args.description;
    capa.priority = args.priority;
    capa.due_date = args.due;
    capa.source_type = args.source_type;
    capa.source_id = args.source_id;

    let path = loader::save(&project, &capa)?;
    let short_id = add_short_id(&project, capa.id.to_string());
    tracing::debug!(id = %capa.id, number = %capa.capa_number, "created CAPA");

    match global.format {
        OutputFormat::Id => println!("{}", capa.id),
        OutputFormat::ShortId => println!("{}", short_id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Created CAPA {} {}",
                style("✓").green(),
                style(&capa.capa_number).yellow(),
                style(&short_id).cyan()
            );
            println!("   {}", style(project.relative_path(&path)).dim());
            println!(
                "   {} | {}",
                paint(capa.priority.badge().tone, capa.priority.badge()),
                style(&capa.title).white()
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

    let loaded = loader::find::<Capa>(&project, &args.id, &ShortIdIndex::load(&project))?;

    show_record(&project, &loaded, format, |capa| {
        field("ID", style(capa.id()).cyan());
        field("Number", &capa.capa_number);
        field("Title", style(&capa.title).yellow());
        field("Status", paint(capa.status.badge().tone, capa.status.badge()));
        field(
            "Priority",
            paint(capa.priority.badge().tone, capa.priority.badge()),
        );
        field("Assigned", &capa.assigned_to);
        optional_field("Source", capa.source());
        if let Some(due) = capa.due_date {
            let mark = if is_overdue(capa, ctx.today) {
                style(" (overdue)").red().bold().to_string()
            } else {
                String::new()
            };
            field("Due", format!("{}{}", due, mark));
        }
        optional_field("Completed", capa.completed_date);
        field("Created by", &capa.created_by);
        section("Description", &capa.description);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx() -> SessionContext {
        SessionContext::fixed(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    fn capa(number: &str, title: &str, status: CapaStatus, priority: Priority) -> Capa {
        let mut c = Capa::new(
            number.to_string(),
            title.to_string(),
            "Mike Chen".to_string(),
            "Sarah Johnson".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).unwrap(),
        );
        c.status = status;
        c.priority = priority;
        c
    }

    fn list_args() -> ListArgs {
        ListArgs {
            search: None,
            status: None,
            priority: None,
            assigned: None,
            overdue: false,
            sort: SortField::Created,
            view: ListView::default(),
        }
    }

    fn sample() -> Vec<Capa> {
        let mut late = capa(
            "CAPA-2024-001",
            "Improve Temperature Monitoring",
            CapaStatus::Investigation,
            Priority::High,
        );
        late.due_date = Some(ctx().today - Duration::days(1));
        let mut closed = capa(
            "CAPA-2024-002",
            "Supplier Qualification",
            CapaStatus::Closed,
            Priority::Medium,
        );
        closed.due_date = Some(ctx().today - Duration::days(10));
        let fresh = capa(
            "CAPA-2024-003",
            "Label Review",
            CapaStatus::Draft,
            Priority::Critical,
        );
        vec![late, closed, fresh]
    }

    #[test]
    fn test_no_filters_keep_everything() {
        assert_eq!(filter_capas(sample(), &list_args(), &ctx()).len(), 3);
    }

    #[test]
    fn test_search_matches_number_and_title() {
        let mut args = list_args();
        args.search = Some("temperature".to_string());
        let found = filter_capas(sample(), &args, &ctx());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].capa_number, "CAPA-2024-001");

        args.search = Some("2024-003".to_string());
        assert_eq!(filter_capas(sample(), &args, &ctx()).len(), 1);
    }

    #[test]
    fn test_overdue_filter_skips_closed() {
        let mut args = list_args();
        args.overdue = true;
        let found = filter_capas(sample(), &args, &ctx());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, CapaStatus::Investigation);
    }

    #[test]
    fn test_status_and_priority_filters() {
        let mut args = list_args();
        args.status = Some(CapaStatus::Closed);
        assert_eq!(filter_capas(sample(), &args, &ctx()).len(), 1);

        args.status = None;
        args.priority = Some(Priority::Critical);
        let found = filter_capas(sample(), &args, &ctx());
        assert_eq!(found[0].title, "Label Review");
    }

    #[test]
    fn test_priority_sort_is_most_urgent_first() {
        let mut capas = sample();
        sort_capas(&mut capas, SortField::Priority);
        let order: Vec<Priority> = capas.iter().map(|c| c.priority).collect();
        assert_eq!(
            order,
            vec![Priority::Critical, Priority::High, Priority::Medium]
        );
    }

    #[test]
    fn test_due_sort_puts_undated_last() {
        let mut capas = sample();
        sort_capas(&mut capas, SortField::Due);
        assert_eq!(capas[0].capa_number, "CAPA-2024-002");
        assert!(capas[2].due_date.is_none());
    }
}
