mod config;
mod db;
mod error;
mod export;
mod filter;
mod mapping;
mod model;
mod reconcile;
mod render;
mod summary;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use inquire::{Confirm, Select, Text};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::MappingError;
use crate::filter::{ReportFilter, previous_week};
use crate::mapping::MappingStore;
use crate::model::{Billable, MandaysMetric, ProjectMappingEntry, Status};
use crate::summary::SummaryGrid;

// --- CLI Structure ---
#[derive(Parser)]
#[command(name = "Timesheet Monitor")]
#[command(about = "Reported hours and remaining mandays, straight from the timesheet database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filtered timesheet records with a person by date summary
    Report(ReportArgs),
    /// Remaining mandays per project and employee
    Mandays(MandaysArgs),
    /// Maintain the project code to project name mapping
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Employee code filter, case-insensitive substring
    #[arg(long, default_value = "")]
    employee: String,
    /// First day of the reporting window (defaults to last week's Monday)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the reporting window (defaults to last week's Sunday)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Keep only these statuses; repeat the flag to allow several
    #[arg(long, value_enum)]
    status: Vec<Status>,
    /// Keep only this billability; repeat the flag to allow both
    #[arg(long, value_enum)]
    billable: Vec<Billable>,
    /// Keep only these project names, matched after mapping is applied
    #[arg(long)]
    project: Vec<String>,
    /// Write the filtered records as CSV, optionally to a given path
    #[arg(long, value_name = "PATH")]
    csv: Option<Option<PathBuf>>,
    /// Write the summary grid as CSV, optionally to a given path
    #[arg(long, value_name = "PATH")]
    summary_csv: Option<Option<PathBuf>>,
}

#[derive(Args)]
struct MandaysArgs {
    /// Which remaining mandays column fills the grid
    #[arg(long, value_enum, default_value = "total")]
    metric: MandaysMetric,
    /// Skip the mapping lookup and show raw project keys only
    #[arg(long)]
    raw: bool,
    /// Also print the underlying planning records before the grid
    #[arg(long)]
    detail: bool,
    /// Write the grid as CSV, optionally to a given path
    #[arg(long, value_name = "PATH")]
    csv: Option<Option<PathBuf>>,
    /// Write the billable and non-billable workbook, optionally to a given path
    #[arg(long, value_name = "PATH")]
    xlsx: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum MappingAction {
    /// Print the current mapping table
    Show,
    /// Add, edit or delete mapping entries interactively
    Edit,
    /// Validate a candidate file and swap it in as the new mapping
    Replace {
        /// Candidate CSV, project names in column B and codes in column C
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write the current mapping as an xlsx workbook
    Export {
        /// Target file or directory
        path: Option<PathBuf>,
    },
    /// Write an xlsx mapping template with one example row
    Template {
        /// Target file or directory
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Reads the .env file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Report(args) => {
            let db = Database::open(&config).context("opening the timesheet database")?;
            handle_report(&db, &config, &args)?;
        }
        Commands::Mandays(args) => {
            let db = Database::open(&config).context("opening the timesheet database")?;
            handle_mandays(&db, &config, &args)?;
        }
        Commands::Mapping { action } => handle_mapping(&config, &action)?,
    }

    Ok(())
}

// --- Function 1: Report ---
fn handle_report(db: &Database, config: &AppConfig, args: &ReportArgs) -> anyhow::Result<()> {
    let (default_start, default_end) = previous_week(Local::now().date_naive());
    let filter = ReportFilter {
        employee_code: args.employee.clone(),
        start: args.start.unwrap_or(default_start),
        end: args.end.unwrap_or(default_end),
        statuses: args.status.clone(),
        billable: args.billable.clone(),
        projects: args.project.clone(),
    };
    if filter.range_is_inverted() {
        warn!("Start date must be before end date.");
    }

    let mut records = db
        .load_timesheet(filter.start, filter.end)
        .context("loading timesheet records")?;

    let store = MappingStore::new(config.mapping_path.clone());
    match store.load() {
        Ok((entries, _)) => reconcile::apply(&mut records, &reconcile::name_index(&entries)),
        Err(MappingError::NotFound { path }) => {
            warn!("Mapping file '{}' not found. Please upload the file.", path.display());
        }
        Err(err) => return Err(err).context("loading the project mapping"),
    }

    records.retain(|record| filter.matches(record));

    println!("\n--- Filtered Data ({} to {}) ---", filter.start, filter.end);
    render::records_table(&records).printstd();
    println!("Number of records: {}", records.len());

    if let Some(target) = &args.csv {
        let path = export::resolve_export_path(
            target.as_deref(),
            Path::new(&config.export_dir),
            "filtered_data.csv",
        );
        export::write_records_csv(&path, &records)?;
        println!("File successfully generated: {}", path.display());
    }

    if records.is_empty() {
        warn!("No data available for the selected filters.");
        return Ok(());
    }

    let grid = SummaryGrid::build(records.iter().map(|record| {
        (
            record.employee_name.clone(),
            record.date.to_string(),
            record.man_hours.hours(),
        )
    }));

    println!("\n--- Summary Table (Person vs Date) ---");
    render::grid_table(&grid, "name").printstd();
    println!("Total Man Hours: {:.2}", grid.grand_total());
    println!("Total People: {}", grid.data_row_count());
    println!("Total Days: {}", grid.data_col_count());

    if let Some(target) = &args.summary_csv {
        let path = export::resolve_export_path(
            target.as_deref(),
            Path::new(&config.export_dir),
            "summary_table.csv",
        );
        export::write_grid_csv(&path, &grid, "name")?;
        println!("File successfully generated: {}", path.display());
    }

    Ok(())
}

// --- Function 2: Mandays ---
fn handle_mandays(db: &Database, config: &AppConfig, args: &MandaysArgs) -> anyhow::Result<()> {
    let records = db.load_mandays().context("loading remaining mandays")?;

    let names = if args.raw {
        None
    } else {
        let store = MappingStore::new(config.mapping_path.clone());
        match store.load() {
            Ok((entries, _)) => Some(reconcile::name_index(&entries)),
            Err(MappingError::NotFound { path }) => {
                warn!("Mapping file '{}' not found. Please upload the file.", path.display());
                None
            }
            Err(err) => return Err(err).context("loading the project mapping"),
        }
    };

    if args.detail {
        println!("\n--- Planning Records ---");
        render::mandays_records_table(&records).printstd();
        println!("Number of records: {}", records.len());
    }

    let grid = SummaryGrid::build(records.iter().map(|record| {
        (
            record.project.clone(),
            record.employee_code.clone(),
            args.metric.value_of(record),
        )
    }));

    println!("\n--- Showing: {} ---", args.metric.title());
    render::mandays_table(&grid, names.as_ref()).printstd();

    if let Some(target) = &args.csv {
        let path = export::resolve_export_path(
            target.as_deref(),
            Path::new(&config.export_dir),
            &export::mandays_csv_name(args.metric),
        );
        export::write_mandays_csv(&path, &grid, names.as_ref())?;
        println!("File successfully generated: {}", path.display());
    }

    if let Some(target) = &args.xlsx {
        let path = export::resolve_export_path(
            target.as_deref(),
            Path::new(&config.export_dir),
            &export::mandays_workbook_name(),
        );
        export::write_mandays_workbook(&path, &records, names.as_ref())?;
        println!("File successfully generated: {}", path.display());
    }

    Ok(())
}

// --- Function 3: Mapping ---
fn handle_mapping(config: &AppConfig, action: &MappingAction) -> anyhow::Result<()> {
    let store = MappingStore::new(config.mapping_path.clone());

    match action {
        MappingAction::Show => match store.load() {
            Ok((entries, _)) => {
                render::mapping_table(&entries).printstd();
                println!("Total mappings: {}", entries.len());
            }
            Err(MappingError::NotFound { .. }) => println!("No mapping file found."),
            Err(err) => return Err(err).context("loading the project mapping"),
        },
        MappingAction::Edit => edit_mapping(&store)?,
        MappingAction::Replace { file, yes } => replace_mapping(&store, file, *yes)?,
        MappingAction::Export { path } => match store.load() {
            Ok((entries, _)) => {
                let target = export::resolve_export_path(
                    path.as_deref(),
                    Path::new(&config.export_dir),
                    "current_project_mapping.xlsx",
                );
                export::write_mapping_workbook(&target, &entries)?;
                println!("File successfully generated: {}", target.display());
            }
            Err(MappingError::NotFound { .. }) => println!("No mapping file found."),
            Err(err) => return Err(err).context("loading the project mapping"),
        },
        MappingAction::Template { path } => {
            let example = vec![ProjectMappingEntry {
                project_name: "PROJECT_NAME_EXAMPLE".to_string(),
                project_code: "PROJECT_CODE_EXAMPLE".to_string(),
            }];
            let target = export::resolve_export_path(
                path.as_deref(),
                Path::new(&config.export_dir),
                "project_mapping_template.xlsx",
            );
            export::write_mapping_workbook(&target, &example)?;
            println!("File successfully generated: {}", target.display());
        }
    }

    Ok(())
}

fn edit_mapping(store: &MappingStore) -> anyhow::Result<()> {
    let (mut entries, mut revision) = match store.load() {
        Ok((entries, revision)) => (entries, Some(revision)),
        Err(MappingError::NotFound { path }) => {
            println!("No existing mapping file found at '{}'.", path.display());
            if !Confirm::new("Create a new mapping file?").prompt().unwrap_or(false) {
                return Ok(());
            }
            (Vec::new(), None)
        }
        Err(err) => return Err(err).context("loading the project mapping"),
    };

    loop {
        println!("\n--- Project Mapping ({} entries) ---", entries.len());
        render::mapping_table(&entries).printstd();

        let options = vec!["Add Entry", "Edit Entry", "Delete Entry", "Save", "Discard"];
        let choice = Select::new("Action:", options).prompt();

        match choice {
            Ok("Add Entry") => {
                let name = Text::new("Project Name:").prompt().unwrap_or_default();
                let code = Text::new("Project Code:").prompt().unwrap_or_default();
                let name = name.trim().to_string();
                let code = code.trim().to_string();
                if name.is_empty() || code.is_empty() {
                    println!("Please enter both project name and project code.");
                    continue;
                }
                if entries.iter().any(|entry| entry.project_code == code) {
                    println!("Project code '{}' is already mapped.", code);
                    continue;
                }
                entries.push(ProjectMappingEntry {
                    project_name: name,
                    project_code: code,
                });
            }
            Ok("Edit Entry") => {
                if entries.is_empty() {
                    continue;
                }
                if let Ok(selected) = Select::new("Select Mapping:", entries.clone()).prompt() {
                    let name = Text::new("Project Name:")
                        .with_default(&selected.project_name)
                        .prompt()
                        .unwrap_or_default();
                    let code = Text::new("Project Code:")
                        .with_default(&selected.project_code)
                        .prompt()
                        .unwrap_or_default();
                    let name = name.trim().to_string();
                    let code = code.trim().to_string();
                    if name.is_empty() || code.is_empty() {
                        println!("Please enter both project name and project code.");
                        continue;
                    }
                    if let Some(entry) = entries.iter_mut().find(|entry| **entry == selected) {
                        entry.project_name = name;
                        entry.project_code = code;
                    }
                }
            }
            Ok("Delete Entry") => {
                if entries.is_empty() {
                    continue;
                }
                if let Ok(selected) = Select::new("Select Mapping:", entries.clone()).prompt() {
                    if Confirm::new("Are you sure?").prompt().unwrap_or(false) {
                        entries.retain(|entry| *entry != selected);
                    }
                }
            }
            Ok("Save") => match store.save(&entries, revision.as_ref()) {
                Ok(new_revision) => {
                    println!(
                        "Successfully saved {} project mappings to '{}'!",
                        entries.len(),
                        store.path().display()
                    );
                    revision = Some(new_revision);
                }
                Err(MappingError::RevisionConflict) => {
                    println!(
                        "The mapping file changed while you were editing. Review the current file and try again."
                    );
                }
                Err(err) => return Err(err).context("saving the project mapping"),
            },
            _ => break,
        }
    }
    Ok(())
}

fn replace_mapping(store: &MappingStore, file: &Path, yes: bool) -> anyhow::Result<()> {
    let entries = MappingStore::preview(file).with_context(|| {
        format!(
            "reading '{}' (project names belong in column B, project codes in column C)",
            file.display()
        )
    })?;

    render::mapping_table(&entries).printstd();
    println!("Total mappings found: {}", entries.len());

    if !yes && !Confirm::new("Replace the current mapping?").prompt().unwrap_or(false) {
        return Ok(());
    }

    store.replace(file).context("replacing the project mapping")?;
    println!("Successfully uploaded new mapping file!");
    Ok(())
}
