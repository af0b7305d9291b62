//! `modalis roster` subcommands

use crate::{print_json, Service};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use modalis_core::{RosterEntry, RosterProvider};
use serde_json::json;
use std::process::ExitCode;

#[derive(Subcommand)]
pub enum RosterCommand {
    /// Add a student to a class (or rename an existing one)
    Add {
        /// Class ID
        #[arg(short, long)]
        class: String,

        /// Student ID
        #[arg(short, long)]
        student: String,

        /// Display name
        #[arg(short, long)]
        nombre: String,
    },

    /// Remove a student from a class
    Remove {
        /// Class ID
        #[arg(short, long)]
        class: String,

        /// Student ID
        #[arg(short, long)]
        student: String,
    },

    /// List a class roster in display order
    List {
        /// Class ID
        #[arg(short, long)]
        class: String,
    },
}

pub fn run(command: RosterCommand, service: &Service, compact: bool) -> Result<ExitCode> {
    let db = service.roster();

    match command {
        RosterCommand::Add {
            class,
            student,
            nombre,
        } => {
            if class.trim().is_empty() || student.trim().is_empty() {
                bail!("class and student must not be empty");
            }
            let entry = RosterEntry::new(class, student, nombre);
            db.upsert_roster_entry(&entry)
                .context("failed to save roster entry")?;
            tracing::info!(class_id = %entry.class_id, student_id = %entry.student_id, "Roster entry saved");
            print_json(&entry, compact)?;
        }
        RosterCommand::Remove { class, student } => {
            let removed = db
                .remove_roster_entry(&class, &student)
                .context("failed to remove roster entry")?;
            print_json(&json!({ "removed": removed }), compact)?;
            if !removed {
                return Ok(ExitCode::FAILURE);
            }
        }
        RosterCommand::List { class } => {
            let roster = db
                .list_roster(&class)
                .context("failed to load roster")?;
            print_json(&roster, compact)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
