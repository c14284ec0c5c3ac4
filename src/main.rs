use clap::Parser;
use miette::Result;
use qms::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Die quietly on a closed pipe (`qms doc list | head`)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    init_logging(global.verbose);

    match cli.command {
        Commands::Init(args) => qms::cli::commands::init::run(args),
        Commands::Doc(cmd) => qms::cli::commands::doc::run(cmd, &global),
        Commands::Event(cmd) => qms::cli::commands::event::run(cmd, &global),
        Commands::Capa(cmd) => qms::cli::commands::capa::run(cmd, &global),
        Commands::Change(cmd) => qms::cli::commands::change::run(cmd, &global),
        Commands::User(cmd) => qms::cli::commands::user::run(cmd, &global),
        Commands::Search(args) => qms::cli::commands::search::run(args, &global),
        Commands::Status(args) => qms::cli::commands::status::run(args, &global),
        Commands::Completions(args) => qms::cli::commands::completions::run(args),
    }
}

/// Log to stderr so piped stdout stays clean. `QMS_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let default = if verbose { "qms=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("QMS_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
