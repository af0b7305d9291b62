//! modalis - CLI front end for the learning-signal engine
//!
//! Records chat-derived insights, reports class modality profiles, and
//! generates personalized activity plans. Every command prints JSON on
//! stdout; failures are printed as a structured error and exit with status 1.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/modalis/data.db (~/.local/share/modalis/data.db)
//! - Logs: $XDG_STATE_HOME/modalis/modalis.log.YYYY-MM-DD (~/.local/state/modalis/, daily)
//! - Config: $XDG_CONFIG_HOME/modalis/config.toml (~/.config/modalis/config.toml)

mod roster;
mod stdio;

use anyhow::{Context, Result};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use modalis_core::service::ErrorBody;
use modalis_core::{
    Config, Database, LearningService, Level, Metrics, Modality, NewInsight, PlanRequest,
    Request, Response,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "modalis")]
#[command(about = "Aggregate learning signals and personalize class activities")]
#[command(version)]
struct Args {
    /// Database file (overrides config and XDG default)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print single-line JSON instead of pretty output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one chat-derived insight
    Record(RecordArgs),

    /// List a class's insights in insertion order
    Insights {
        /// Class ID
        #[arg(short, long)]
        class: Option<String>,
    },

    /// Show the class learning-modality profile
    Profile {
        /// Class ID
        #[arg(short, long)]
        class: Option<String>,
    },

    /// Generate a personalized activity plan for a class
    Plan(PlanArgs),

    /// Manage class rosters
    #[command(subcommand)]
    Roster(roster::RosterCommand),

    /// Serve JSON-lines requests from stdin until EOF
    ServeStdio,
}

#[derive(ClapArgs)]
struct RecordArgs {
    /// Class ID
    #[arg(short, long)]
    class: Option<String>,

    /// Student ID
    #[arg(short, long)]
    student: Option<String>,

    /// Inferred modality (visual, auditory, reading, kinesthetic, mixed)
    #[arg(short, long)]
    modality: Option<Modality>,

    /// Level (basico, intermedio, avanzado)
    #[arg(short, long)]
    level: Option<Level>,

    /// Strength tag (repeatable)
    #[arg(long = "strength", action = ArgAction::Append)]
    strengths: Vec<String>,

    /// Need tag, e.g. "síntesis" or "contraargumentos" (repeatable)
    #[arg(long = "need", action = ArgAction::Append)]
    needs: Vec<String>,

    /// Topic of the conversation
    #[arg(long)]
    topic: Option<String>,

    /// Analysis estimate (0-100)
    #[arg(long, requires_all = ["reflexion", "sintesis"])]
    analisis: Option<f64>,

    /// Reflection estimate (0-100)
    #[arg(long, requires_all = ["analisis", "sintesis"])]
    reflexion: Option<f64>,

    /// Synthesis estimate (0-100)
    #[arg(long, requires_all = ["analisis", "reflexion"])]
    sintesis: Option<f64>,
}

impl RecordArgs {
    fn into_insight(self) -> NewInsight {
        let metrics = match (self.analisis, self.reflexion, self.sintesis) {
            (Some(analisis), Some(reflexion), Some(sintesis)) => Some(Metrics {
                analisis,
                reflexion,
                sintesis,
            }),
            _ => None,
        };
        NewInsight {
            class_id: self.class.unwrap_or_default(),
            student_id: self.student.unwrap_or_default(),
            modality: self.modality,
            level: self.level,
            strengths: self.strengths,
            needs: self.needs,
            recent_topic: self.topic,
            metrics,
        }
    }
}

#[derive(ClapArgs)]
struct PlanArgs {
    /// Class ID
    #[arg(short, long)]
    class: Option<String>,

    /// Activity topic
    #[arg(short, long)]
    titulo: Option<String>,

    /// Activity objective
    #[arg(short, long)]
    objetivo: Option<String>,

    /// Learning-profile selector (visual, auditory, reading, kinesthetic, mixed)
    #[arg(short, long)]
    perfil: Option<String>,
}

pub(crate) type Service = LearningService<Arc<Database>, Arc<Database>>;

pub(crate) fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", rendered);
    Ok(())
}

fn open_database(args: &Args, config: &Config) -> modalis_core::Result<Arc<Database>> {
    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.store.database_path());
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path)?;
    db.set_busy_timeout(config.store.busy_timeout())?;
    db.migrate()?;
    Ok(Arc::new(db))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file; stdout carries JSON)
    let _log_guard =
        modalis_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db = match open_database(&args, &config) {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "Failed to open store");
            print_json(&ErrorBody::from(&err), args.compact)?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let service: Service = LearningService::new(db.clone(), db).with_plan_config(config.plan);

    let request = match args.command {
        Command::Record(record) => Request::RecordInsight(record.into_insight()),
        Command::Insights { class } => Request::ClassInsights { class_id: class },
        Command::Profile { class } => Request::GroupProfile { class_id: class },
        Command::Plan(plan) => Request::ActivityPlan(PlanRequest {
            class_id: plan.class,
            titulo: plan.titulo,
            objetivo: plan.objetivo,
            perfil_aprendizaje: plan.perfil,
        }),
        Command::Roster(command) => return roster::run(command, &service, args.compact),
        Command::ServeStdio => return stdio::serve(&service),
    };

    let response = service.handle(request);
    print_response(&response, args.compact)?;

    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Print the payload itself, or the error body, without the `result` tag.
fn print_response(response: &Response, compact: bool) -> Result<()> {
    match response {
        Response::Recorded(recorded) => print_json(recorded, compact),
        Response::Insights { insights } => print_json(insights, compact),
        Response::Profile(profile) => print_json(profile, compact),
        Response::Plan(plan) => print_json(plan, compact),
        Response::Error(body) => print_json(body, compact),
    }
}
