//! `qms doc` command - Controlled document management

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
use crate::core::numbering::{document_prefix, next_number};
use crate::core::shortid::ShortIdIndex;
use crate::core::{Config, SessionContext};
use crate::entities::{Document, DocumentStatus};

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// List documents with filtering
    List(ListArgs),

    /// Create a new draft document
    #[command(disable_version_flag = true)]
    New(NewArgs),

    /// Show a document's details
    Show(ShowArgs),
}

/// Sort field for document lists
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortField {
    #[default]
    Number,
    Title,
    Status,
    Type,
    Created,
    Updated,
}

const DOC_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NUMBER", 16),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("type", "TYPE", 18),
    ColumnDef::new("version", "VER", 6),
    ColumnDef::new("status", "STATUS", 18),
    ColumnDef::new("effective", "EFFECTIVE", 10),
    ColumnDef::new("review", "REVIEW", 10),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in title and document number
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by document status
    #[arg(long)]
    pub status: Option<DocumentStatus>,

    /// Filter by document type (e.g. SOP, Policy, Work Instruction)
    #[arg(long = "type", short = 'T')]
    pub document_type: Option<String>,

    /// Show only documents in force whose review date has passed
    #[arg(long)]
    pub review_due: bool,

    /// Sort by field
    #[arg(long, default_value = "number")]
    pub sort: SortField,

    #[command(flatten)]
    pub view: ListView,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Document title
    #[arg(long, short = 't')]
    pub title: String,

    /// Document type (e.g. SOP, Policy, Work Instruction)
    #[arg(long = "type", short = 'T', default_value = "SOP")]
    pub document_type: String,

    /// Document number, unique in the organization (default: next TYPE-YYYY-NNN)
    #[arg(long)]
    pub number: Option<String>,

    /// Version label
    #[arg(long, default_value = "1.0")]
    pub version: String,

    /// Document body or summary
    #[arg(long, short = 'c')]
    pub content: Option<String>,

    /// Link to the controlled file
    #[arg(long)]
    pub file_url: Option<String>,

    /// Next periodic review (YYYY-MM-DD)
    #[arg(long)]
    pub review_date: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Document number, ID, partial ID or short ID (@N)
    pub id: String,
}

/// Run a document subcommand
pub fn run(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DocCommands::List(args) => run_list(args, global),
        DocCommands::New(args) => run_new(args, global),
        DocCommands::Show(args) => run_show(args, global),
    }
}

fn filter_documents(docs: Vec<Document>, args: &ListArgs, ctx: &SessionContext) -> Vec<Document> {
    docs.into_iter()
        .filter(|d| {
            args.search
                .as_deref()
                .map_or(true, |q| contains_ci(&d.title, q) || contains_ci(&d.document_number, q))
        })
        .filter(|d| args.status.map_or(true, |s| d.status == s))
        .filter(|d| {
            args.document_type
                .as_deref()
                .map_or(true, |t| d.document_type.trim().eq_ignore_ascii_case(t.trim()))
        })
        .filter(|d| !args.review_due || d.is_review_due(ctx.today))
        .collect()
}

fn sort_documents(docs: &mut [Document], sort: SortField) {
    match sort {
        SortField::Number => docs.sort_by(|a, b| a.document_number.cmp(&b.document_number)),
        SortField::Title => docs.sort_by_key(|d| d.title.to_lowercase()),
        SortField::Status => docs.sort_by_key(|d| d.status),
        SortField::Type => docs.sort_by_key(|d| d.document_type.to_lowercase()),
        SortField::Created => docs.sort_by_key(|d| d.created_at),
        SortField::Updated => docs.sort_by_key(|d| d.updated_at),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let all: Vec<Document> = loader::load_all(&project)
        .into_iter()
        .map(|l: Loaded<Document>| l.record)
        .collect();
    let mut docs = filter_documents(all, &args, &ctx);
    sort_documents(&mut docs, args.sort);
    args.view.apply(&mut docs);

    let listing = Listing {
        name: "document",
        plural: "documents",
        columns: DOC_COLUMNS,
    };
    print_list(&project, &docs, listing, &args.view, format, doc_to_row)
}

fn doc_to_row(doc: &Document, short_ids: &ShortIdIndex) -> TableRow {
    TableRow::new(doc.id.to_string(), short_ids)
        .cell("number", CellValue::Text(doc.document_number.clone()))
        .cell("title", CellValue::Text(doc.title.clone()))
        .cell("type", CellValue::text(Some(&doc.document_type)))
        .cell("version", CellValue::Text(doc.version.clone()))
        .cell(
            "status",
            CellValue::badge(doc.status.as_str(), doc.status.badge()),
        )
        .cell("effective", CellValue::date(doc.effective_date))
        .cell("review", CellValue::date(doc.review_date))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);

    let existing: Vec<Loaded<Document>> = loader::load_all(&project);
    let number = match args.number {
        Some(n) => n.trim().to_string(),
        None => next_number(
            &document_prefix(&args.document_type),
            ctx.now.year(),
            existing.iter().map(|l| l.record.document_number.as_str()),
        ),
    };
    loader::ensure_unique_document_number(&existing, &number)?;

    let author = ctx.author_or(&config.author());
    let mut doc = Document::new(args.title, number, args.document_type, author, ctx.now);
    doc.version = args.version;
    doc.content = args.content;
    doc.file_url = args.file_url;
    doc.review_date = args.review_date;

    let path = loader::save(&project, &doc)?;
    let short_id = add_short_id(&project, doc.id.to_string());
    tracing::debug!(id = %doc.id, number = %doc.document_number, "created document");

    match global.format {
        OutputFormat::Id => println!("{}", doc.id),
        OutputFormat::ShortId => println!("{}", short_id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Created document {} {}",
                style("✓").green(),
                style(&doc.document_number).yellow(),
                style(&short_id).cyan()
            );
            println!("   {}", style(project.relative_path(&path)).dim());
            println!(
                "   {} v{} | {}",
                style(&doc.document_type).yellow(),
                doc.version,
                style(&doc.title).white()
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

    let loaded = loader::find::<Document>(&project, &args.id, &ShortIdIndex::load(&project))?;

    show_record(&project, &loaded, format, |doc| {
        field("ID", style(doc.id()).cyan());
        field("Number", &doc.document_number);
        field("Title", style(&doc.title).yellow());
        field("Type", format!("{} v{}", doc.document_type, doc.version));
        field("Status", paint(doc.status.badge().tone, doc.status.badge()));
        optional_field("Effective", doc.effective_date);
        if let Some(review) = doc.review_date {
            if doc.is_review_due(ctx.today) {
                field(
                    "Review",
                    format!("{} {}", review, style("(review due)").red().bold()),
                );
            } else {
                field("Review", review);
            }
        }
        field("Created by", &doc.created_by);
        optional_field("Approved by", doc.approved_by.as_deref());
        optional_field("File", doc.file_url.as_deref());
        section("Content", doc.content.as_deref().unwrap_or_default());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx() -> SessionContext {
        SessionContext::fixed(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
    }

    fn doc(number: &str, title: &str, doc_type: &str, status: DocumentStatus) -> Document {
        let mut d = Document::new(
            title.to_string(),
            number.to_string(),
            doc_type.to_string(),
            "Emily Davis".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
        );
        d.status = status;
        d
    }

    fn list_args() -> ListArgs {
        ListArgs {
            search: None,
            status: None,
            document_type: None,
            review_due: false,
            sort: SortField::Number,
            view: ListView::default(),
        }
    }

    fn sample() -> Vec<Document> {
        let mut sop = doc(
            "SOP-QA-001",
            "Quality Manual",
            "Policy",
            DocumentStatus::Effective,
        );
        sop.review_date = Some(ctx().today - Duration::days(1));
        vec![
            sop,
            doc(
                "WI-2024-001",
                "Cleaning Procedure",
                "Work Instruction",
                DocumentStatus::PendingReview,
            ),
            doc("SOP-002", "Calibration", "SOP", DocumentStatus::Draft),
        ]
    }

    #[test]
    fn test_search_title_or_number() {
        let mut args = list_args();
        args.search = Some("qa-001".to_string());
        assert_eq!(filter_documents(sample(), &args, &ctx()).len(), 1);

        args.search = Some("cleaning".to_string());
        let found = filter_documents(sample(), &args, &ctx());
        assert_eq!(found[0].document_number, "WI-2024-001");
    }

    #[test]
    fn test_type_filter_ignores_case() {
        let mut args = list_args();
        args.document_type = Some("work instruction".to_string());
        assert_eq!(filter_documents(sample(), &args, &ctx()).len(), 1);
    }

    #[test]
    fn test_review_due_filter() {
        let mut args = list_args();
        args.review_due = true;
        let found = filter_documents(sample(), &args, &ctx());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Quality Manual");
    }

    #[test]
    fn test_sort_by_number() {
        let mut docs = sample();
        sort_documents(&mut docs, SortField::Number);
        let numbers: Vec<&str> = docs.iter().map(|d| d.document_number.as_str()).collect();
        assert_eq!(numbers, vec!["SOP-002", "SOP-QA-001", "WI-2024-001"]);
    }
}
