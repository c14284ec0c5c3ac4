//! `qms search` command - Search across every record type
//!
//! The query may carry `type:<kind>` and `status:<status>` tokens; the
//! `--type` and `--status` flags override them.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::remember_short_ids;
use crate::cli::helpers::open_project;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::classify::{classify, BadgeKind, Badged};
use crate::core::loader::load_search_results;
use crate::core::search::{
    parse_query, rank_scored, KindFilter, Scored, SearchQuery, SearchResult, SortKey,
    StatusFilter,
};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Search words, optionally with type:<kind> and status:<status> tokens
    pub query: Vec<String>,

    /// Only this record type (document, event, capa, change, user or all)
    #[arg(long = "type", short = 't')]
    pub kind: Option<KindFilter>,

    /// Only records with this status (any record type's status key, or all)
    #[arg(long, short = 's')]
    pub status: Option<StatusFilter>,

    /// Result order
    #[arg(long, default_value = "relevance")]
    pub sort: SortKey,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Include relevance scores in the output
    #[arg(long)]
    pub scores: bool,
}

const SEARCH_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("kind", "TYPE", 8),
    ColumnDef::new("number", "NUMBER", 16),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("status", "STATUS", 20),
    ColumnDef::new("priority", "PRIORITY", 10),
    ColumnDef::new("created", "CREATED", 10),
];

const SCORED_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("score", "SCORE", 5),
    ColumnDef::new("kind", "TYPE", 8),
    ColumnDef::new("number", "NUMBER", 16),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("status", "STATUS", 20),
    ColumnDef::new("priority", "PRIORITY", 10),
    ColumnDef::new("created", "CREATED", 10),
];

/// Combine the free-form query with the explicit flags
fn build_query(args: &SearchArgs) -> Result<SearchQuery> {
    let raw = args.query.join(" ");
    let mut query = parse_query(&raw).map_err(|e| {
        miette::miette!(
            help = "write filters as type:capa or status:open, or use --type / --status",
            "{}",
            e
        )
    })?;

    if let Some(kind) = args.kind {
        query.kind = kind;
    }
    if let Some(status) = &args.status {
        query.status = status.clone();
    }
    query.sort = args.sort;
    Ok(query)
}

/// Run the search command
pub fn run(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let query = build_query(&args)?;
    let records = load_search_results(&project);
    let mut results = rank_scored(&records, &query);
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    if args.count {
        println!("{}", results.len());
        return Ok(());
    }

    if results.is_empty() && !matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        if !global.quiet {
            println!("No results found for '{}'", style(query.text.trim()).yellow());
        }
        return Ok(());
    }

    let short_ids = remember_short_ids(&project, results.iter().map(|s| s.result.id.clone()));

    match format {
        OutputFormat::Json => {
            let json = if args.scores {
                serde_json::to_string_pretty(&results)
            } else {
                serde_json::to_string_pretty(&plain(&results))
            }
            .into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = if args.scores {
                serde_yml::to_string(&results)
            } else {
                serde_yml::to_string(&plain(&results))
            }
            .into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let columns = if args.scores {
                SCORED_COLUMNS
            } else {
                SEARCH_COLUMNS
            };
            let rows: Vec<TableRow> = results
                .iter()
                .map(|s| result_to_row(s, &short_ids))
                .collect();
            let config = if global.quiet {
                TableConfig::for_pipe()
            } else {
                TableConfig::default()
            };
            TableFormatter::new(columns, "result")
                .with_config(config)
                .output(rows, format);
        }
    }

    Ok(())
}

fn plain(results: &[Scored]) -> Vec<&SearchResult> {
    results.iter().map(|s| &s.result).collect()
}

fn result_to_row(scored: &Scored, short_ids: &ShortIdIndex) -> TableRow {
    let result = &scored.result;
    let status = match result.status.as_deref() {
        Some(raw) => CellValue::badge(
            raw,
            classify(BadgeKind::status_of(result.kind), raw).badge(),
        ),
        None => CellValue::Empty,
    };
    let priority = match result.priority {
        Some(p) => CellValue::badge(p.as_str(), p.badge()),
        None => CellValue::Empty,
    };

    TableRow::new(result.id.clone(), short_ids)
        .cell("score", CellValue::Number(i64::from(scored.score)))
        .cell("kind", CellValue::Text(result.kind.to_string()))
        .cell("number", CellValue::text(result.number.as_deref()))
        .cell("title", CellValue::Text(result.title.clone()))
        .cell("status", status)
        .cell("priority", priority)
        .cell("created", CellValue::DateTime(result.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::RecordKind;

    fn args(query: &[&str]) -> SearchArgs {
        SearchArgs {
            query: query.iter().map(|s| s.to_string()).collect(),
            kind: None,
            status: None,
            sort: SortKey::Relevance,
            limit: None,
            count: false,
            scores: false,
        }
    }

    #[test]
    fn test_tokens_in_query_are_filters() {
        let query = build_query(&args(&["type:capa", "temperature", "status:investigation"])).unwrap();
        assert_eq!(query.text, "temperature");
        assert_eq!(query.kind, KindFilter::Only(RecordKind::Capa));
        assert_eq!(query.status, StatusFilter::Only("investigation".to_string()));
    }

    #[test]
    fn test_flags_override_tokens() {
        let mut a = args(&["type:capa", "pump"]);
        a.kind = Some(KindFilter::Only(RecordKind::Event));
        a.sort = SortKey::TitleAsc;
        let query = build_query(&a).unwrap();
        assert_eq!(query.kind, KindFilter::Only(RecordKind::Event));
        assert_eq!(query.sort, SortKey::TitleAsc);
    }

    #[test]
    fn test_empty_query_lists_everything() {
        let query = build_query(&args(&[])).unwrap();
        assert!(query.text.is_empty());
        assert_eq!(query.kind, KindFilter::All);
    }

    #[test]
    fn test_bad_token_is_an_error() {
        assert!(build_query(&args(&["type:widget"])).is_err());
        assert!(build_query(&args(&["status:"])).is_err());
    }
}
