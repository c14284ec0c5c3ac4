//! `qms status` command - Dashboard overview

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_project, session, truncate_str};
use crate::cli::table::paint;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::classify::{classify, BadgeKind};
use crate::core::loader::RecordSet;
use crate::core::metrics::DashboardMetrics;
use crate::core::search::{rank, SearchQuery, SearchResult, SortKey};
use crate::core::{Config, SessionContext};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Number of recently created records to list
    #[arg(long, default_value = "5")]
    pub recent: usize,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Auto);

    let records = RecordSet::load(&project);
    let metrics = DashboardMetrics::collect(&records, &ctx);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&metrics).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&metrics).into_diagnostic()?);
        }
        OutputFormat::Md => {
            println!("{}", metrics_table(&metrics).with(Style::markdown()));
        }
        OutputFormat::Csv => {
            println!("section,metric,value");
            for (section, rows) in metric_rows(&metrics) {
                for (metric, value) in rows {
                    println!("{},{},{}", section, metric, value);
                }
            }
        }
        _ => {
            let recent = recent_activity(&records, args.recent);
            print_dashboard(&metrics, &recent, &ctx);
        }
    }

    Ok(())
}

type Section = (&'static str, Vec<(&'static str, usize)>);

/// Metric values grouped by dashboard card, in display order
fn metric_rows(m: &DashboardMetrics) -> Vec<Section> {
    vec![
        (
            "documents",
            vec![
                ("total", m.documents.total),
                ("pending_review", m.documents.pending_review),
                ("effective", m.documents.effective),
                ("review_due", m.documents.review_due),
            ],
        ),
        (
            "events",
            vec![
                ("total", m.events.total),
                ("open", m.events.open),
                ("overdue", m.events.overdue),
                ("closed", m.events.closed),
            ],
        ),
        (
            "capas",
            vec![
                ("total", m.capas.total),
                ("active", m.capas.active),
                ("overdue", m.capas.overdue),
                ("closed", m.capas.closed),
            ],
        ),
        (
            "changes",
            vec![
                ("total", m.changes.total),
                ("pending_approval", m.changes.pending_approval),
                ("overdue", m.changes.overdue),
                ("implemented", m.changes.implemented),
            ],
        ),
        (
            "users",
            vec![
                ("total", m.users.total),
                ("active", m.users.active),
                ("inactive", m.users.inactive),
                ("recent_logins", m.users.recent_logins),
            ],
        ),
    ]
}

fn metrics_table(m: &DashboardMetrics) -> tabled::Table {
    let mut builder = Builder::default();
    builder.push_record(["Section", "Metric", "Value"]);
    for (section, rows) in metric_rows(m) {
        for (metric, value) in rows {
            builder.push_record([section.to_string(), metric.to_string(), value.to_string()]);
        }
    }
    builder.build()
}

/// Most recently created records of any type
fn recent_activity(records: &RecordSet, limit: usize) -> Vec<SearchResult> {
    let query = SearchQuery {
        sort: SortKey::DateDesc,
        ..SearchQuery::default()
    };
    let mut recent = rank(&records.search_results(), &query);
    recent.truncate(limit);
    recent
}

fn print_dashboard(m: &DashboardMetrics, recent: &[SearchResult], ctx: &SessionContext) {
    let width = 68;

    let heading = match &ctx.organization {
        Some(org) => format!("{} Quality Dashboard", org.name),
        None => "Quality Dashboard".to_string(),
    };
    println!("{}", style(heading).bold().underlined());
    if let Some(user) = &ctx.user {
        println!("Welcome back, {}", style(&user.first_name).cyan());
    }
    println!("{}", "═".repeat(width));
    println!();

    print_two_columns(
        "DOCUMENTS",
        &[
            format!("Total:          {}", m.documents.total),
            format!("Pending review: {}", m.documents.pending_review),
            format!("Effective:      {}", m.documents.effective),
            flagged("Review due:     ", m.documents.review_due),
        ],
        "QUALITY EVENTS",
        &[
            format!("Total:   {}", m.events.total),
            format!("Open:    {}", m.events.open),
            flagged("Overdue: ", m.events.overdue),
            format!("Closed:  {}", m.events.closed),
        ],
    );
    println!();

    print_two_columns(
        "CAPAS",
        &[
            format!("Total:   {}", m.capas.total),
            format!("Active:  {}", m.capas.active),
            flagged("Overdue: ", m.capas.overdue),
            format!("Closed:  {}", m.capas.closed),
        ],
        "CHANGE CONTROLS",
        &[
            format!("Total:            {}", m.changes.total),
            format!("Pending approval: {}", m.changes.pending_approval),
            flagged("Overdue:          ", m.changes.overdue),
            format!("Implemented:      {}", m.changes.implemented),
        ],
    );
    println!();

    print_two_columns(
        "USERS",
        &[
            format!("Total:    {}", m.users.total),
            format!("Active:   {}", m.users.active),
            format!("Inactive: {}", m.users.inactive),
        ],
        "ACTIVITY",
        &[
            format!("Logins (24h): {}", m.users.recent_logins),
            flagged("Overdue:      ", m.total_overdue()),
        ],
    );

    if !recent.is_empty() {
        println!();
        println!("{}", style("RECENTLY CREATED").bold());
        println!("{:-<64}", "");
        for r in recent {
            let status = r.status.as_deref().unwrap_or_default();
            let badge = classify(BadgeKind::status_of(r.kind), status).badge();
            println!(
                "  {:<8} {:<36} {}",
                r.kind.as_str(),
                truncate_str(&r.title, 34),
                paint(badge.tone, badge)
            );
        }
    }
}

/// A count line marked with a warning sign when non-zero
fn flagged(label: &str, count: usize) -> String {
    if count > 0 {
        format!("{}{} {}", label, count, style("⚠").red())
    } else {
        format!("{}{}", label, count)
    }
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String]) {
    let col_width = 32;

    println!(
        "{:<col_width$} {}",
        style(title1).bold(),
        style(title2).bold()
    );
    println!("{:-<col_width$} {:-<col_width$}", "", "");

    let max_lines = lines1.len().max(lines2.len());
    for i in 0..max_lines {
        let l1 = lines1.get(i).map(String::as_str).unwrap_or("");
        let l2 = lines2.get(i).map(String::as_str).unwrap_or("");
        println!("  {:<30} {}", l1, l2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Capa, Document};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_metric_rows_cover_every_card() {
        let rows = metric_rows(&DashboardMetrics::default());
        let sections: Vec<&str> = rows.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            sections,
            vec!["documents", "events", "capas", "changes", "users"]
        );
        assert!(rows.iter().all(|(_, r)| r.len() >= 4));
    }

    #[test]
    fn test_markdown_table_lists_values() {
        let mut metrics = DashboardMetrics::default();
        metrics.capas.overdue = 3;
        let table = metrics_table(&metrics).with(Style::markdown()).to_string();
        assert!(table.contains("| Section"));
        assert!(table.contains("overdue"));
        assert!(table.contains('3'));
    }

    #[test]
    fn test_recent_activity_newest_first() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let records = RecordSet {
            documents: vec![Document::new(
                "Quality Manual".to_string(),
                "POL-001".to_string(),
                "Policy".to_string(),
                "Emily Davis".to_string(),
                base,
            )],
            capas: vec![Capa::new(
                "CAPA-2024-001".to_string(),
                "Improve Monitoring".to_string(),
                "Mike Chen".to_string(),
                "Sarah Johnson".to_string(),
                base + Duration::days(2),
            )],
            ..RecordSet::default()
        };

        let recent = recent_activity(&records, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Improve Monitoring");
    }

    #[test]
    fn test_flagged_marks_nonzero() {
        assert_eq!(flagged("Overdue: ", 0), "Overdue: 0");
        assert!(flagged("Overdue: ", 2).starts_with("Overdue: 2"));
    }
}
