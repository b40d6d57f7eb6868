use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use drill_grade::catalog::{create_default_parts, ItemRef, Mark};
use drill_grade::grade::{parse_answer, GradeSession, GradeSlot};
use drill_grade::report::{NewReport, ReportFilter, ReportStore};
use drill_grade::scoring::ScoringConfig;

const EXIT_SUCCESS: i32 = 0;
const EXIT_NOT_FOUND: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Json,
    Tsv,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a config file interactively
    Init,
    /// Print the evaluation catalog with item references
    Catalog,
    /// Create a new report
    New {
        /// Report name
        name: String,
        /// Evaluated unit
        #[arg(short, long, default_value = "")]
        unit: String,
        /// Exercise location
        #[arg(short, long, default_value = "")]
        location: String,
        /// Exercise date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// List reports, newest exercise first (default if no subcommand)
    List {
        /// Only reports of this unit
        #[arg(short, long)]
        unit: Option<String>,
        /// Glob over report names, e.g. "Night*"
        #[arg(short, long)]
        name: Option<String>,
        /// Only exercises within this period, e.g. "30d" or "2weeks"
        #[arg(short, long)]
        since: Option<String>,
        /// Minimum final grade
        #[arg(short, long)]
        min_grade: Option<f64>,
        /// Grade slot (1 or 2) used by --min-grade
        #[arg(long, default_value_t = 1)]
        slot: u8,
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Show a report with its grades
    Show {
        id: u64,
        /// List every item with its answer
        #[arg(short, long)]
        items: bool,
    },
    /// Answer an item: full/half/none, or option ids for choice questions
    Answer {
        id: u64,
        /// Item reference such as 2.3
        item: String,
        value: String,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Answer a sub-check of an item (KEY or GROUP/MEMBER)
    Sub {
        id: u64,
        item: String,
        key: String,
        value: String,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Clear an item's answer
    Reset {
        id: u64,
        item: String,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Mark an item relevant or not relevant
    Toggle {
        id: u64,
        item: String,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Set the duatz count of a grade
    Duatz {
        id: u64,
        count: u32,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Set the free-text name of a grade
    Label {
        id: u64,
        label: String,
        #[arg(short, long, default_value_t = 1)]
        slot: u8,
    },
    /// Statistics across all reports
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a report
    Export {
        id: u64,
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },
    /// Delete a report
    Delete { id: u64 },
}

#[derive(Parser, Debug)]
#[command(name = "drill-grade")]
#[command(about = "Training exercise evaluation reports and grading", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/drill-grade/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List {
        unit: None,
        name: None,
        since: None,
        min_grade: None,
        slot: 1,
        tsv: false,
    });

    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = command {
        if let Err(e) = drill_grade::config::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match drill_grade::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = drill_grade::telemetry::init(cli.verbose, config.log_level.as_deref()) {
        eprintln!("Config error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }

    // Validate scoring config at startup
    let scoring = config.effective_scoring();
    if let Err(errors) = drill_grade::scoring::validate_scoring(&scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let store_path = config.reports_path();
    debug!(store = %store_path.display(), "using report store");

    let ctx = App {
        store_path,
        scoring,
        use_colors: drill_grade::output::should_use_colors(),
    };

    match run(&ctx, command) {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(Failure::NotFound(msg)) => {
            eprintln!("{}", msg);
            std::process::exit(EXIT_NOT_FOUND);
        }
        Err(Failure::Invalid(e)) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

struct App {
    store_path: PathBuf,
    scoring: ScoringConfig,
    use_colors: bool,
}

enum Failure {
    NotFound(String),
    Invalid(anyhow::Error),
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Invalid(e)
    }
}

fn slot_arg(slot: u8) -> Result<GradeSlot, Failure> {
    GradeSlot::from_number(slot)
        .ok_or_else(|| Failure::Invalid(anyhow::anyhow!("Grade slot must be 1 or 2, got {}", slot)))
}

fn load(path: &Path) -> Result<ReportStore, Failure> {
    Ok(drill_grade::report::load_store(path)?)
}

fn not_found(id: u64) -> Failure {
    Failure::NotFound(format!("Report #{} not found.", id))
}

/// Print a grade's breakdown, plus the stored total when it no longer matches
/// the answers.
fn print_grade(ctx: &App, session: &GradeSession) {
    println!(
        "{}",
        drill_grade::output::format_breakdown(&session.breakdown(), ctx.use_colors)
    );
    if session.is_stale() {
        println!(
            "{}",
            drill_grade::output::format_stale_note(
                session.final_grade(),
                session.recomputed_grade()
            )
        );
    }
}

/// Apply `edit` to a report's grade, save it and print the updated
/// breakdown. Returns what `edit` returned once the store is saved.
fn edit_grade<F, T>(ctx: &App, id: u64, slot: u8, edit: F) -> Result<T, Failure>
where
    F: FnOnce(&mut GradeSession) -> Result<T>,
{
    let slot = slot_arg(slot)?;
    let (outcome, session) =
        drill_grade::report::update_grade(&ctx.store_path, id, slot, &ctx.scoring, edit)?
            .ok_or_else(|| not_found(id))?;

    println!("Report #{} {}", id, slot.label());
    print_grade(ctx, &session);
    Ok(outcome)
}

fn run(ctx: &App, command: Commands) -> Result<(), Failure> {
    match command {
        Commands::Init => {}
        Commands::Catalog => {
            println!(
                "{}",
                drill_grade::output::format_items(&create_default_parts(), ctx.use_colors)
            );
        }
        Commands::New {
            name,
            unit,
            location,
            date,
            notes,
        } => {
            let mut store = load(&ctx.store_path)?;
            let id = store.insert(NewReport {
                name,
                unit,
                location,
                exercise_date: date.unwrap_or_else(|| Utc::now().date_naive()),
                notes,
            });
            drill_grade::report::save_store(&ctx.store_path, &store)?;
            info!(id, "report created");
            println!("Created report #{}", id);
        }
        Commands::List {
            unit,
            name,
            since,
            min_grade,
            slot,
            tsv,
        } => {
            let mut filter = ReportFilter {
                unit,
                min_grade,
                slot: Some(slot_arg(slot)?),
                ..ReportFilter::default()
            };
            if let Some(pattern) = name {
                filter = filter.with_name_glob(&pattern)?;
            }
            if let Some(since) = since {
                filter = filter.with_since(&since)?;
            }

            let store = load(&ctx.store_path)?;
            let reports = drill_grade::report::filter_reports(&store.reports, &filter);
            debug!(total = store.reports.len(), shown = reports.len(), "reports filtered");

            if tsv {
                let out = drill_grade::output::format_tsv(&reports);
                if !out.is_empty() {
                    println!("{}", out);
                }
            } else {
                println!(
                    "{}",
                    drill_grade::output::format_report_table(&reports, ctx.use_colors)
                );
            }
        }
        Commands::Show { id, items } => {
            let store = load(&ctx.store_path)?;
            let report = store.get(id).ok_or_else(|| not_found(id))?;
            println!(
                "{}",
                drill_grade::output::format_report_header(report, ctx.use_colors)
            );

            for slot in [GradeSlot::First, GradeSlot::Second] {
                println!();
                match report.grade(slot) {
                    Some(grade) => {
                        let session =
                            GradeSession::from_grade(grade.clone(), ctx.scoring.clone());
                        if grade.name.is_empty() {
                            println!("{}", slot.label());
                        } else {
                            println!("{}: {}", slot.label(), grade.name);
                        }
                        print_grade(ctx, &session);
                        if items {
                            println!();
                            println!(
                                "{}",
                                drill_grade::output::format_items(
                                    &session.grade().score_data.parts,
                                    ctx.use_colors
                                )
                            );
                        }
                    }
                    None => println!("{}: not graded", slot.label()),
                }
            }
        }
        Commands::Answer {
            id,
            item,
            value,
            slot,
        } => {
            let at = ItemRef::parse(&item)?;
            edit_grade(ctx, id, slot, |session| {
                let answer = parse_answer(session.item(at)?, &value)?;
                session.set_value(at, answer)
            })?;
        }
        Commands::Sub {
            id,
            item,
            key,
            value,
            slot,
        } => {
            let at = ItemRef::parse(&item)?;
            let mark = Mark::from_token(&value.trim().to_lowercase()).with_context(|| {
                format!("Unknown answer '{}', expected full/half/none", value)
            })?;
            let (key, member) = match key.split_once('/') {
                Some((group, member)) => (group.to_string(), Some(member.to_string())),
                None => (key, None),
            };
            edit_grade(ctx, id, slot, |session| {
                session.set_sub_answer(at, &key, member.as_deref(), mark)
            })?;
        }
        Commands::Reset { id, item, slot } => {
            let at = ItemRef::parse(&item)?;
            edit_grade(ctx, id, slot, |session| session.reset_value(at))?;
        }
        Commands::Toggle { id, item, slot } => {
            let at = ItemRef::parse(&item)?;
            let active = edit_grade(ctx, id, slot, |session| session.toggle_active(at))?;
            println!(
                "Item {} is now {}",
                at,
                if active { "counted" } else { "not relevant" }
            );
        }
        Commands::Duatz { id, count, slot } => {
            edit_grade(ctx, id, slot, |session| session.set_duatz_count(count))?;
        }
        Commands::Label { id, label, slot } => {
            edit_grade(ctx, id, slot, |session| {
                session.set_name(label);
                Ok(())
            })?;
        }
        Commands::Summary { json } => {
            let documents = drill_grade::report::load_documents(&ctx.store_path)?;
            let summary = drill_grade::report::summarize(&documents);
            if json {
                let out = serde_json::to_string_pretty(&summary)
                    .context("Failed to serialize summary")?;
                println!("{}", out);
            } else {
                let store = load(&ctx.store_path)?;
                let reports: Vec<_> = store.reports.iter().collect();
                let means =
                    drill_grade::report::part_means(&reports, GradeSlot::First, &ctx.scoring);
                println!(
                    "{}",
                    drill_grade::output::format_summary(&summary, &means, ctx.use_colors)
                );
            }
        }
        Commands::Export { id, format } => {
            let store = load(&ctx.store_path)?;
            let report = store.get(id).ok_or_else(|| not_found(id))?;
            match format {
                ExportFormat::Json => {
                    let out = serde_json::to_string_pretty(report)
                        .context("Failed to serialize report")?;
                    println!("{}", out);
                }
                ExportFormat::Tsv => {
                    println!("{}", drill_grade::output::format_tsv(&[report]));
                }
            }
        }
        Commands::Delete { id } => {
            let mut store = load(&ctx.store_path)?;
            if !store.remove(id) {
                return Err(not_found(id));
            }
            drill_grade::report::save_store(&ctx.store_path, &store)?;
            info!(id, "report deleted");
            println!("Deleted report #{}", id);
        }
    }
    Ok(())
}
