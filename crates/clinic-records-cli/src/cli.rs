//! CLI interface and argument parsing

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use clinic_records_core::codec;
use clinic_records_core::{Patient, SortKey};

/// Clinic Records - patient register
#[derive(Parser, Debug)]
#[command(name = "clinic-records")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "clinic-records.toml",
        env = "CLINIC_RECORDS_CONFIG"
    )]
    pub config: PathBuf,

    /// Patient data file (overrides the configuration)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every patient in file order
    List(OutputArgs),

    /// Show one patient
    Show {
        id: i32,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Add a patient (last and first name are required)
    Add(PatientFields),

    /// Change fields of an existing patient
    Edit {
        id: i32,
        #[command(flatten)]
        fields: PatientFields,
    },

    /// Delete a patient
    Delete { id: i32 },

    /// Search by last name, filter by diagnosis, and sort
    Find(FindArgs),

    /// Patient count and age statistics
    Stats(OutputArgs),

    /// Patients per diagnosis, largest group first
    Histogram(OutputArgs),

    /// Distinct diagnoses on file
    Diagnoses,
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Patient fields; only the ones given are applied.
#[derive(Args, Debug, Default)]
pub struct PatientFields {
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub middle_name: Option<String>,
    /// Birth date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_birth_date)]
    pub birth_date: Option<DateTime<Utc>>,
    /// Attending doctor's full name
    #[arg(long)]
    pub doctor: Option<String>,
    #[arg(long)]
    pub doctor_position: Option<String>,
    #[arg(long)]
    pub diagnosis: Option<String>,
    #[arg(long)]
    pub ambulatory: Option<bool>,
    #[arg(long)]
    pub sick_leave_days: Option<u32>,
    #[arg(long)]
    pub on_dispensary: Option<bool>,
    #[arg(long)]
    pub note: Option<String>,
}

impl PatientFields {
    /// Copy every given field onto `patient`.
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(v) = self.last_name {
            patient.last_name = v;
        }
        if let Some(v) = self.first_name {
            patient.first_name = v;
        }
        if let Some(v) = self.middle_name {
            patient.middle_name = v;
        }
        if let Some(v) = self.birth_date {
            patient.birth_date = v;
        }
        if let Some(v) = self.doctor {
            patient.doctor_full_name = v;
        }
        if let Some(v) = self.doctor_position {
            patient.doctor_position = v;
        }
        if let Some(v) = self.diagnosis {
            patient.diagnosis = v;
        }
        if let Some(v) = self.ambulatory {
            patient.ambulatory = v;
        }
        if let Some(v) = self.sick_leave_days {
            patient.sick_leave_days = v;
        }
        if let Some(v) = self.on_dispensary {
            patient.on_dispensary = v;
        }
        if let Some(v) = self.note {
            patient.note = v;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct FindArgs {
    /// Part of the last name, any case
    #[arg(long)]
    pub last_name: Option<String>,

    /// Exact diagnosis, any case; "(none)" finds patients without one
    #[arg(long)]
    pub diagnosis: Option<String>,

    /// Sort key: id, last-name, or age
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

fn parse_birth_date(s: &str) -> Result<DateTime<Utc>, String> {
    codec::parse_date(s.trim()).ok_or_else(|| format!("not a date: {s}"))
}
