//! `qms init` command - Initialize a new QMS project

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::identity::EntityPrefix;
use crate::core::project::{Project, ProjectError};
use crate::entities::Organization;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Organization name recorded in .qms/organization.yaml
    #[arg(long)]
    pub org: Option<String>,

    /// Force initialization even if .qms/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    let project = match project {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} QMS project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("qms init --force").yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    if let Some(name) = args.org.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let org = Organization::new(name, Utc::now());
        project
            .save_organization(&org)
            .map_err(|e| miette::miette!("{}", e))?;
        tracing::debug!(slug = %org.slug, "recorded organization");
    }

    println!(
        "{} Initialized QMS project at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!();
    println!("Created project structure:");
    print_structure(&project);
    println!();
    println!("Next steps:");
    println!(
        "  {} Register a controlled document",
        style("qms doc new").yellow()
    );
    println!(
        "  {} Report a quality event",
        style("qms event new").yellow()
    );
    println!(
        "  {} See the dashboard",
        style("qms status").yellow()
    );
    Ok(())
}

fn print_structure(project: &Project) {
    let mut entries = vec![".qms/".to_string(), ".qms/config.yaml".to_string()];
    if project.organization_path().exists() {
        entries.push(".qms/organization.yaml".to_string());
    }
    entries.extend(
        EntityPrefix::all()
            .iter()
            .map(|p| format!("{}/", p.directory())),
    );

    for entry in entries {
        let exists = project.root().join(&entry).exists();
        let marker = if exists { style("+").green() } else { style("?").yellow() };
        println!("  {} {}", marker, entry);
    }
}
