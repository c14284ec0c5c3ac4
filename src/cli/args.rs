//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    capa::CapaCommands, change::ChangeCommands, completions::CompletionsArgs, doc::DocCommands,
    event::EventCommands, init::InitArgs, search::SearchArgs, status::StatusArgs,
    user::UserCommands,
};

#[derive(Parser)]
#[command(name = "qms")]
#[command(author, version, about = "QMS Desk")]
#[command(long_about = "Track controlled documents, quality events, CAPAs and change controls as plain-text YAML records.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .qms/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new QMS project
    Init(InitArgs),

    /// Controlled documents
    #[command(subcommand)]
    Doc(DocCommands),

    /// Quality events (deviations, non-conformances, complaints)
    #[command(subcommand)]
    Event(EventCommands),

    /// Corrective and preventive actions
    #[command(subcommand)]
    Capa(CapaCommands),

    /// Change controls
    #[command(subcommand)]
    Change(ChangeCommands),

    /// User profiles
    #[command(subcommand)]
    User(UserCommands),

    /// Search across every record type
    Search(SearchArgs),

    /// Dashboard metrics
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
    /// Just short IDs (@N), one per line
    ShortId,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default, then the command's own default
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_explicit_format_wins() {
        assert_eq!(
            OutputFormat::Json.resolve(Some("csv"), OutputFormat::Tsv),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_auto_uses_config_then_fallback() {
        assert_eq!(
            OutputFormat::Auto.resolve(Some("md"), OutputFormat::Tsv),
            OutputFormat::Md
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("bogus"), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
        assert_eq!(
            OutputFormat::Auto.resolve(None, OutputFormat::Yaml),
            OutputFormat::Yaml
        );
    }

    #[test]
    fn test_short_id_format_parses() {
        let cli = Cli::try_parse_from(["qms", "-f", "short-id", "status"]).unwrap();
        assert_eq!(cli.global.format, OutputFormat::ShortId);
    }
}
