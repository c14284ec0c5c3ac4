//! Table output for list and search commands
//!
//! Rows are built from typed [`CellValue`]s and rendered as an aligned,
//! colored table (`tsv`), CSV, Markdown or bare IDs. Status, priority and
//! role cells carry a [`Badge`] whose [`Tone`] picks the terminal color.
//!
//! # Text Wrapping
//!
//! `TableConfig::with_wrap(width)` word-wraps text cells onto extra lines in
//! the aligned table. CSV, ID and short-ID output stay one line per record.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::{style, StyledObject};

use crate::cli::helpers::{escape_csv, format_short_id_str, truncate_str};
use crate::cli::OutputFormat;
use crate::core::classify::{Badge, Tone};
use crate::core::shortid::ShortIdIndex;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 CAPA(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Terminal styling for a badge tone
pub fn paint<D>(tone: Tone, value: D) -> StyledObject<D> {
    let styled = style(value);
    match tone {
        Tone::Neutral => styled.white(),
        Tone::Info => styled.cyan(),
        Tone::Warning => styled.yellow(),
        Tone::Caution => styled.color256(208),
        Tone::Success => styled.green(),
        Tone::Accent => styled.magenta(),
        Tone::Danger => styled.red().bold(),
        Tone::Muted => styled.dim(),
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len <= max_width {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }

        // Hard-break words longer than a whole line
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_width).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                current = piece;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record ID (truncated in tables, cyan)
    Id(String),
    /// Short ID reference (e.g. "@1", cyan)
    ShortId(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Status, priority, severity or role with its stored key and badge
    Badge { key: String, badge: Badge },
    /// Several badges, e.g. a user's roles
    Badges(Vec<Badge>),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp displayed as a local date
    DateTime(DateTime<Utc>),
    /// Numeric value
    Number(i64),
    /// Overdue marker (yes=red bold, no=dim)
    Overdue(bool),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Badge cell for any value with a stored key
    pub fn badge(key: impl Into<String>, badge: Badge) -> Self {
        CellValue::Badge {
            key: key.into(),
            badge,
        }
    }

    /// Date cell, or a placeholder when there is no date
    pub fn date(date: Option<NaiveDate>) -> Self {
        date.map_or(CellValue::Empty, CellValue::Date)
    }

    /// Text cell, or a placeholder when blank
    pub fn text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => CellValue::Text(t.to_string()),
            _ => CellValue::Empty,
        }
    }

    /// Format for the aligned table (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                format!("{:<width$}", style(format_short_id_str(id)).cyan(), width = width)
            }
            CellValue::ShortId(sid) => format!("{:<width$}", style(sid).cyan(), width = width),
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Badge { badge, .. } => {
                format!("{:<width$}", paint(badge.tone, badge.label), width = width)
            }
            CellValue::Badges(badges) => {
                let joined = truncate_str(&self.raw(), width.saturating_sub(2));
                let tone = badges.first().map_or(Tone::Neutral, |b| b.tone);
                format!("{:<width$}", paint(tone, joined), width = width)
            }
            CellValue::Date(d) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                format!("{:<width$}", local.format("%Y-%m-%d"), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Overdue(true) => {
                format!("{:<width$}", style("yes").red().bold(), width = width)
            }
            CellValue::Overdue(false) => format!("{:<width$}", style("no").dim(), width = width),
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, stored keys, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Badge { key, .. } => escape_csv(key),
            CellValue::Overdue(b) => yes_no(*b).to_string(),
            CellValue::DateTime(dt) => dt.to_rfc3339(),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Overdue(true) => "**yes**".to_string(),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::ShortId(s) | CellValue::Text(s) => s.clone(),
            CellValue::Badge { badge, .. } => badge.label.to_string(),
            CellValue::Badges(badges) => badges
                .iter()
                .map(|b| b.label)
                .collect::<Vec<_>>()
                .join(", "),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Overdue(b) => yes_no(*b).to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.chars().count().min(16),
            CellValue::Date(_) | CellValue::DateTime(_) => 10,
            CellValue::Overdue(_) => 3,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: String, short_ids: &ShortIdIndex) -> Self {
        Self {
            short_id: short_ids.label(&full_id),
            full_id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => self.output_ids(&rows, false),
            OutputFormat::ShortId => self.output_ids(&rows, true),
            _ => self.output_tsv(&rows),
        }
    }

    /// Column widths sized to content, capped at each column's width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(0)
            .max(5);

        let mut widths = vec![short_width];
        for col in self.columns {
            let content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            // +2 leaves room for truncate_str
            widths.push(col.header.len().max(content + 2).min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header = vec![format!(
            "{:<width$}",
            style("SHORT").bold().dim(),
            width = widths[0]
        )];
        for (col, w) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<width$}", style(col.header).bold(), width = *w));
        }
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            match self.config.wrap_width {
                Some(wrap) => self.output_tsv_row_wrapped(row, &widths, wrap),
                None => self.output_tsv_row(row, &widths),
            }
        }

        if self.config.show_summary {
            println!();
            println!(
                "{} {}(s) found. Use {} to reference by short ID.",
                style(rows.len()).cyan(),
                self.entity_name,
                style("@N").cyan()
            );
        }
    }

    fn output_tsv_row(&self, row: &TableRow, widths: &[usize]) {
        let mut parts = vec![format!(
            "{:<width$}",
            style(&row.short_id).cyan(),
            width = widths[0]
        )];
        for (col, w) in self.columns.iter().zip(&widths[1..]) {
            match row.get(col.key) {
                Some(value) => parts.push(value.format_tsv(*w)),
                None => parts.push(format!("{:<width$}", "-", width = *w)),
            }
        }
        println!("{}", parts.join(" "));
    }

    fn output_tsv_row_wrapped(&self, row: &TableRow, widths: &[usize], wrap: usize) {
        let mut cells: Vec<Vec<String>> = vec![vec![row.short_id.clone()]];
        for col in self.columns {
            let lines = match row.get(col.key) {
                Some(value @ CellValue::Text(_)) => wrap_text(&value.raw(), wrap),
                Some(value) => vec![value.raw()],
                None => vec!["-".to_string()],
            };
            cells.push(lines);
        }

        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..max_lines {
            let parts: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, lines)| {
                    let width = widths.get(i).copied().unwrap_or(10);
                    let content = lines.get(line).map(String::as_str).unwrap_or("");
                    if i == 0 {
                        format!("{:<width$}", style(content).cyan(), width = width)
                    } else {
                        format!("{:<width$}", content, width = width)
                    }
                })
                .collect();
            println!("{}", parts.join(" "));
        }

        if max_lines > 1 {
            println!();
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let mut headers = vec!["short_id", "id"];
        headers.extend(self.columns.iter().map(|c| c.key));
        println!("{}", headers.join(","));

        for row in rows {
            let mut values = vec![escape_csv(&row.short_id), escape_csv(&row.full_id)];
            values.extend(
                self.columns
                    .iter()
                    .map(|c| row.get(c.key).map(CellValue::format_csv).unwrap_or_default()),
            );
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["Short", "ID"];
        headers.extend(self.columns.iter().map(|c| c.header));
        println!("| {} |", headers.join(" | "));
        println!("|{}|", vec!["---"; headers.len()].join("|"));

        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            values.extend(self.columns.iter().map(|c| {
                row.get(c.key)
                    .map(CellValue::format_md)
                    .unwrap_or_else(|| "-".to_string())
            }));
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow], use_short: bool) {
        for row in rows {
            if use_short {
                println!("{}", row.short_id);
            } else {
                println!("{}", row.full_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::Badged;
    use crate::core::entity::Priority;
    use crate::entities::CapaStatus;

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_badge_cell_uses_key_for_csv_and_label_for_md() {
        let status = CapaStatus::ActionPlan;
        let cell = CellValue::badge(status.as_str(), status.badge());
        assert_eq!(cell.format_csv(), "action_plan");
        assert_eq!(cell.format_md(), "Action Plan");
        assert_eq!(cell.display_width(), "Action Plan".len());
    }

    #[test]
    fn test_badges_join_labels() {
        let cell = CellValue::Badges(vec![Priority::High.badge(), Priority::Low.badge()]);
        assert_eq!(cell.raw(), "High, Low");
        assert_eq!(cell.format_csv(), "\"High, Low\"");
    }

    #[test]
    fn test_optional_cells_become_placeholders() {
        assert!(matches!(CellValue::date(None), CellValue::Empty));
        assert!(matches!(CellValue::text(Some("  ")), CellValue::Empty));
        assert_eq!(CellValue::Empty.format_md(), "-");
        assert_eq!(CellValue::Empty.format_csv(), "");

        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(CellValue::date(Some(d)).format_csv(), "2024-02-01");
    }

    #[test]
    fn test_overdue_cell() {
        assert_eq!(CellValue::Overdue(true).format_csv(), "yes");
        assert_eq!(CellValue::Overdue(true).format_md(), "**yes**");
        assert_eq!(CellValue::Overdue(false).raw(), "no");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b|c".to_string());
        assert_eq!(cell.format_md(), "a\\|b\\|c");
    }

    #[test]
    fn test_table_row_builder() {
        let mut short_ids = ShortIdIndex::new();
        short_ids.add("CAPA-123".to_string());
        let row = TableRow::new("CAPA-123".to_string(), &short_ids)
            .cell("title", CellValue::Text("My Title".to_string()))
            .cell("priority", CellValue::badge("high", Priority::High.badge()));

        assert_eq!(row.short_id, "@1");
        assert_eq!(row.full_id, "CAPA-123");
        assert!(row.get("title").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_widths_capped_by_column() {
        const COLUMNS: &[ColumnDef] = &[ColumnDef::new("title", "TITLE", 12)];
        let short_ids = ShortIdIndex::new();
        let rows = vec![TableRow::new("X".to_string(), &short_ids)
            .cell("title", CellValue::Text("A rather long record title".to_string()))];
        let widths = TableFormatter::new(COLUMNS, "record").calculate_widths(&rows);
        assert_eq!(widths, vec![5, 12]);
    }

    #[test]
    fn test_wrap_text_short() {
        assert_eq!(wrap_text("hello", 20), vec!["hello"]);
    }

    #[test]
    fn test_wrap_text_word_boundary() {
        assert_eq!(
            wrap_text("hello world foo bar", 11),
            vec!["hello world", "foo bar"]
        );
    }

    #[test]
    fn test_wrap_text_long_word() {
        let result = wrap_text("supercalifragilisticexpialidocious", 10);
        assert_eq!(
            result,
            vec!["supercalif", "ragilistic", "expialidoc", "ious"]
        );
    }

    #[test]
    fn test_wrap_text_multiple_lines() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(
            wrap_text(text, 15),
            vec!["The quick brown", "fox jumps over", "the lazy dog"]
        );
    }

    #[test]
    fn test_table_config() {
        assert!(TableConfig::default().show_summary);
        assert_eq!(TableConfig::with_wrap(40).wrap_width, Some(40));
        assert!(!TableConfig::for_pipe().show_summary);
    }
}
