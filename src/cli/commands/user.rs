//! `qms user` command - User profiles

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;
use std::collections::BTreeSet;

use crate::cli::commands::{
    add_short_id, contains_ci, field, optional_field, print_list, show_record, ListView, Listing,
};
use crate::cli::helpers::{open_project, session};
use crate::cli::table::{paint, CellValue, ColumnDef, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::classify::Badged;
use crate::core::entity::Entity;
use crate::core::loader::{self, Loaded};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::{Role, UserProfile};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List user profiles with filtering
    List(ListArgs),

    /// Add a user profile
    New(NewArgs),

    /// Show a user profile
    Show(ShowArgs),
}

/// Sort field for user lists
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortField {
    #[default]
    Name,
    Email,
    Department,
    LastLogin,
    Created,
}

const USER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 24),
    ColumnDef::new("email", "EMAIL", 30),
    ColumnDef::new("position", "POSITION", 32),
    ColumnDef::new("roles", "ROLES", 30),
    ColumnDef::new("state", "STATE", 8),
    ColumnDef::new("last_login", "LAST LOGIN", 10),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in first name, last name, email and job title
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Show only active users
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Show only inactive users
    #[arg(long)]
    pub inactive: bool,

    /// Filter by department (case-insensitive)
    #[arg(long, short = 'D')]
    pub department: Option<String>,

    /// Filter by role
    #[arg(long)]
    pub role: Option<Role>,

    /// Sort by field
    #[arg(long, default_value = "name")]
    pub sort: SortField,

    #[command(flatten)]
    pub view: ListView,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Email address, unique in the project
    #[arg(long, short = 'e')]
    pub email: String,

    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// Job title
    #[arg(long, short = 'j')]
    pub job_title: Option<String>,

    /// Department
    #[arg(long, short = 'D')]
    pub department: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Roles (repeat or comma-separate; default: general_user)
    #[arg(long, value_delimiter = ',')]
    pub role: Vec<Role>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// User ID, partial ID, short ID (@N) or email
    pub id: String,
}

/// Run a user subcommand
pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::List(args) => run_list(args, global),
        UserCommands::New(args) => run_new(args, global),
        UserCommands::Show(args) => run_show(args, global),
    }
}

fn filter_users(users: Vec<UserProfile>, args: &ListArgs) -> Vec<UserProfile> {
    users
        .into_iter()
        .filter(|u| {
            args.search.as_deref().map_or(true, |q| {
                contains_ci(&u.first_name, q)
                    || contains_ci(&u.last_name, q)
                    || contains_ci(&u.email, q)
                    || u.job_title.as_deref().is_some_and(|t| contains_ci(t, q))
            })
        })
        .filter(|u| !args.active || u.is_active)
        .filter(|u| !args.inactive || !u.is_active)
        .filter(|u| {
            args.department.as_deref().map_or(true, |dept| {
                u.department
                    .as_deref()
                    .is_some_and(|d| d.trim().eq_ignore_ascii_case(dept.trim()))
            })
        })
        .filter(|u| args.role.map_or(true, |r| u.has_role(r)))
        .collect()
}

fn sort_users(users: &mut [UserProfile], sort: SortField) {
    match sort {
        SortField::Name => users.sort_by_key(|u| u.display_name().to_lowercase()),
        SortField::Email => users.sort_by_key(|u| u.email.to_lowercase()),
        SortField::Department => {
            users.sort_by_key(|u| u.department.clone().unwrap_or_default().to_lowercase())
        }
        // Most recent first, never-logged-in last
        SortField::LastLogin => users.sort_by(|a, b| b.last_login.cmp(&a.last_login)),
        SortField::Created => users.sort_by_key(|u| u.created_at),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Tsv);

    let all: Vec<UserProfile> = loader::load_all(&project)
        .into_iter()
        .map(|l: Loaded<UserProfile>| l.record)
        .collect();
    let mut users = filter_users(all, &args);
    sort_users(&mut users, args.sort);
    args.view.apply(&mut users);

    let listing = Listing {
        name: "user",
        plural: "users",
        columns: USER_COLUMNS,
    };
    print_list(&project, &users, listing, &args.view, format, user_to_row)
}

fn user_to_row(user: &UserProfile, short_ids: &ShortIdIndex) -> TableRow {
    let state = user.state();
    TableRow::new(user.id.to_string(), short_ids)
        .cell("name", CellValue::Text(user.display_name()))
        .cell("email", CellValue::Text(user.email.clone()))
        .cell("position", CellValue::text(Some(&user.position())))
        .cell(
            "roles",
            CellValue::Badges(user.roles.iter().map(Badged::badge).collect()),
        )
        .cell("state", CellValue::badge(state.as_str(), state.badge()))
        .cell(
            "last_login",
            user.last_login.map_or(CellValue::Empty, CellValue::DateTime),
        )
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = session(&project, &config);

    let email = args.email.trim().to_string();
    let existing: Vec<Loaded<UserProfile>> = loader::load_all(&project);
    if let Some(taken) = existing
        .iter()
        .find(|l| l.record.email.eq_ignore_ascii_case(&email))
    {
        return Err(miette::miette!(
            help = "each profile needs its own email address",
            "email '{}' is already used by {}",
            email,
            taken.record.id
        ));
    }

    let mut user = UserProfile::new(
        email,
        args.first_name,
        args.last_name,
        ctx.organization_id(),
        ctx.now,
    );
    user.job_title = args.job_title;
    user.department = args.department;
    user.phone = args.phone;
    if !args.role.is_empty() {
        user.roles = args.role.into_iter().collect::<BTreeSet<_>>();
    }

    let path = loader::save(&project, &user)?;
    let short_id = add_short_id(&project, user.id.to_string());
    tracing::debug!(id = %user.id, email = %user.email, "added user profile");

    match global.format {
        OutputFormat::Id => println!("{}", user.id),
        OutputFormat::ShortId => println!("{}", short_id),
        _ if global.quiet => {}
        _ => {
            println!(
                "{} Added user {} {}",
                style("✓").green(),
                style(user.display_name()).yellow(),
                style(&short_id).cyan()
            );
            println!("   {}", style(project.relative_path(&path)).dim());
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

    // Users have no record number; let the email stand in for one
    let by_email = loader::load_all::<UserProfile>(&project)
        .into_iter()
        .find(|l| l.record.email.eq_ignore_ascii_case(args.id.trim()));
    let loaded = match by_email {
        Some(loaded) => loaded,
        None => loader::find::<UserProfile>(&project, &args.id, &ShortIdIndex::load(&project))?,
    };

    show_record(&project, &loaded, format, |user| {
        let state = user.state();
        field("ID", style(user.id()).cyan());
        field(
            "Name",
            format!("{} ({})", style(user.display_name()).yellow(), user.initials()),
        );
        field("Email", &user.email);
        optional_field("Job title", user.job_title.as_deref());
        optional_field("Department", user.department.as_deref());
        optional_field("Phone", user.phone.as_deref());
        field("State", paint(state.badge().tone, state.badge()));
        let roles: Vec<String> = user
            .roles
            .iter()
            .map(|r| paint(r.badge().tone, r.badge()).to_string())
            .collect();
        field("Roles", roles.join(", "));
        match user.last_login {
            Some(at) if user.logged_in_since(ctx.now) => field(
                "Last login",
                format!("{} {}", at.format("%Y-%m-%d %H:%M"), style("(recent)").green()),
            ),
            Some(at) => field("Last login", at.format("%Y-%m-%d %H:%M")),
            None => field("Last login", style("never").dim()),
        }
    })
}
