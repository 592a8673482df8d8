//! Command implementations.
//!
//! Every command loads the data file, and mutating commands save it back.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use clinic_records_core::{Patient, PatientQuery, PatientStore, Statistics};

use crate::cli::{Commands, FindArgs, OutputArgs, PatientFields};

/// Patient plus derived age, for JSON output.
#[derive(Serialize)]
struct PatientView<'a> {
    #[serde(flatten)]
    patient: &'a Patient,
    age: i32,
}

impl<'a> From<&'a Patient> for PatientView<'a> {
    fn from(patient: &'a Patient) -> Self {
        Self {
            patient,
            age: patient.age(),
        }
    }
}

/// Run one command against the data file at `data_path`.
pub fn execute(command: Commands, data_path: &Path, out: &mut impl Write) -> Result<()> {
    let mut store = PatientStore::new();
    store
        .load(data_path)
        .with_context(|| format!("Failed to load patients from {}", data_path.display()))?;

    match command {
        Commands::List(output) => print_patients(store.patients(), &output, out),
        Commands::Show { id, output } => {
            let Some(patient) = store.get(id) else {
                bail!("No patient with id {id}");
            };
            if output.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&PatientView::from(patient))?)?;
            } else {
                print_details(patient, out)?;
            }
            Ok(())
        }
        Commands::Add(fields) => {
            let mut patient = Patient::default();
            fields.apply_to(&mut patient);
            validate_required(&patient)?;

            let id = store.add(patient);
            save(&store, data_path)?;
            info!(id, "Patient added");
            writeln!(out, "Added patient {id}")?;
            Ok(())
        }
        Commands::Edit { id, fields } => edit(&mut store, id, fields, data_path, out),
        Commands::Delete { id } => {
            if store.delete_by_id(id) {
                save(&store, data_path)?;
                info!(id, "Patient deleted");
                writeln!(out, "Deleted patient {id}")?;
            } else {
                writeln!(out, "No patient with id {id}, nothing deleted")?;
            }
            Ok(())
        }
        Commands::Find(args) => find(&store, args, out),
        Commands::Stats(output) => print_statistics(&store.statistics(), &output, out),
        Commands::Histogram(output) => {
            let bars = store.histogram_ranked();
            if output.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&bars)?)?;
                return Ok(());
            }
            let width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
            for bar in &bars {
                writeln!(
                    out,
                    "{:<width$}  {:>4}  {}",
                    bar.label,
                    bar.count,
                    "#".repeat(bar.count),
                )?;
            }
            Ok(())
        }
        Commands::Diagnoses => {
            for diagnosis in store.distinct_diagnoses() {
                writeln!(out, "{diagnosis}")?;
            }
            Ok(())
        }
    }
}

fn edit(
    store: &mut PatientStore,
    id: i32,
    fields: PatientFields,
    data_path: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let Some(mut patient) = store.get(id).cloned() else {
        bail!("No patient with id {id}");
    };
    fields.apply_to(&mut patient);
    validate_required(&patient)?;

    store.update_by_id(&patient);
    save(store, data_path)?;
    info!(id, "Patient updated");
    writeln!(out, "Updated patient {id}")?;
    Ok(())
}

fn find(store: &PatientStore, args: FindArgs, out: &mut impl Write) -> Result<()> {
    let query = PatientQuery {
        last_name: args.last_name.unwrap_or_default(),
        diagnosis: args.diagnosis.unwrap_or_default(),
        sort: args.sort,
        ascending: !args.desc,
    };
    let patients = store.query(&query);
    print_patients(&patients, &args.output, out)
}

/// Last and first name are required before a record reaches the store.
fn validate_required(patient: &Patient) -> Result<()> {
    if patient.last_name.trim().is_empty() || patient.first_name.trim().is_empty() {
        bail!("Last name and first name are required");
    }
    Ok(())
}

fn save(store: &PatientStore, data_path: &Path) -> Result<()> {
    store
        .save(data_path)
        .with_context(|| format!("Failed to save patients to {}", data_path.display()))
}

fn print_patients(patients: &[Patient], output: &OutputArgs, out: &mut impl Write) -> Result<()> {
    if output.json {
        let views: Vec<PatientView> = patients.iter().map(PatientView::from).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&views)?)?;
        return Ok(());
    }

    writeln!(
        out,
        "{:>5}  {:<32}  {:<10}  {:>3}  {:<20}  {}",
        "ID", "NAME", "BORN", "AGE", "DIAGNOSIS", "DOCTOR"
    )?;
    for p in patients {
        writeln!(
            out,
            "{:>5}  {:<32}  {:<10}  {:>3}  {:<20}  {}",
            p.id,
            p.full_name(),
            p.birth_date.format("%Y-%m-%d").to_string(),
            p.age(),
            p.diagnosis,
            p.doctor_full_name,
        )?;
    }
    Ok(())
}

fn print_details(p: &Patient, out: &mut impl Write) -> Result<()> {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    writeln!(out, "Id:               {}", p.id)?;
    writeln!(out, "Name:             {}", p.full_name())?;
    writeln!(out, "Born:             {} (age {})", p.birth_date.format("%Y-%m-%d"), p.age())?;
    writeln!(out, "Doctor:           {} ({})", p.doctor_full_name, p.doctor_position)?;
    writeln!(out, "Diagnosis:        {}", p.diagnosis_label())?;
    writeln!(out, "Ambulatory:       {}", yes_no(p.ambulatory))?;
    writeln!(out, "Sick leave days:  {}", p.sick_leave_days)?;
    writeln!(out, "On dispensary:    {}", yes_no(p.on_dispensary))?;
    writeln!(out, "Note:             {}", p.note)?;
    Ok(())
}

fn print_statistics(stats: &Statistics, output: &OutputArgs, out: &mut impl Write) -> Result<()> {
    if output.json {
        writeln!(out, "{}", serde_json::to_string_pretty(stats)?)?;
    } else {
        writeln!(
            out,
            "Patients: {} | Average age: {:.1} | Min/max age: {}/{}",
            stats.count, stats.average_age, stats.min_age, stats.max_age
        )?;
    }
    Ok(())
}
