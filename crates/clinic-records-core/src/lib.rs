//! Clinic Records Core Library
//!
//! Single-user patient register kept in a quoted-CSV flat file.
//!
//! # Architecture
//!
//! ```text
//!   patients.csv ──load──▶ Codec::decode ──▶ PatientStore ──▶ query / statistics / histogram
//!        ▲                                        │
//!        └──────────save────── Codec::encode ◀────┘
//!                                                 ▲
//!                                   desktop UI (via FFI) / CLI
//! ```
//!
//! # Core Principle
//!
//! **Bad data never fails an operation.** Malformed lines decode to
//! partially-default records, missing ids are no-ops, and empty collections
//! aggregate to zeros. Only reading or writing the file can fail.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Statistics, HistogramBar)
//! - [`codec`]: One record to and from one CSV line
//! - [`store`]: In-memory collection with load/save, CRUD, and queries

pub mod codec;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use models::{HistogramBar, Patient, Statistics, NO_DIAGNOSIS_LABEL};
pub use store::{PatientQuery, PatientStore, SortKey, StoreError, StoreResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicRecordsError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<StoreError> for ClinicRecordsError {
    fn from(e: StoreError) -> Self {
        ClinicRecordsError::Io(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicRecordsError::Lock(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the register stored at `path`. A missing file gives an empty register.
#[uniffi::export]
pub fn open_store(path: String) -> Result<Arc<ClinicRecordsCore>, ClinicRecordsError> {
    let mut store = PatientStore::new();
    store.load(&path)?;
    Ok(Arc::new(ClinicRecordsCore {
        path: PathBuf::from(path),
        store: Mutex::new(store),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store wrapper for FFI, bound to one data file.
#[derive(uniffi::Object)]
pub struct ClinicRecordsCore {
    path: PathBuf,
    store: Mutex<PatientStore>,
}

#[uniffi::export]
impl ClinicRecordsCore {
    // =========================================================================
    // File Operations
    // =========================================================================

    /// Discard in-memory changes and re-read the data file.
    pub fn reload(&self) -> Result<u32, ClinicRecordsError> {
        let mut store = self.store.lock()?;
        let count = store.load(&self.path)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Write the register to its data file.
    pub fn save(&self) -> Result<(), ClinicRecordsError> {
        let store = self.store.lock()?;
        store.save(&self.path)?;
        Ok(())
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// All patients in insertion order.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(to_ffi(store.patients().to_vec()))
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i32) -> Result<Option<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(store.get(id).cloned().map(Into::into))
    }

    /// Add a patient and return the id it was stored under.
    pub fn add_patient(&self, patient: FfiPatient) -> Result<i32, ClinicRecordsError> {
        let mut store = self.store.lock()?;
        Ok(store.add(patient.into()))
    }

    /// Overwrite the patient with the same id. Returns whether it existed.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, ClinicRecordsError> {
        let mut store = self.store.lock()?;
        Ok(store.update_by_id(&patient.into()))
    }

    /// Delete a patient by id. Returns whether it existed.
    pub fn delete_patient(&self, id: i32) -> Result<bool, ClinicRecordsError> {
        let mut store = self.store.lock()?;
        Ok(store.delete_by_id(id))
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    pub fn search_by_last_name(&self, text: String) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(to_ffi(store.search_by_last_name(&text)))
    }

    pub fn filter_by_diagnosis(&self, value: String) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(to_ffi(store.filter_by_diagnosis(&value)))
    }

    pub fn sort_by(
        &self,
        key: FfiSortKey,
        ascending: bool,
    ) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(to_ffi(store.sort_by(key.into(), ascending)))
    }

    /// Search, filter, and sort in one call, as the patient table does.
    pub fn query(&self, query: FfiPatientQuery) -> Result<Vec<FfiPatient>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(to_ffi(store.query(&query.into())))
    }

    // =========================================================================
    // Summary Operations
    // =========================================================================

    pub fn statistics(&self) -> Result<FfiStatistics, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(store.statistics().into())
    }

    /// Diagnosis histogram, largest group first.
    pub fn histogram(&self) -> Result<Vec<FfiHistogramBar>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(store
            .histogram_ranked()
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Distinct diagnoses for the filter drop-down.
    pub fn distinct_diagnoses(&self) -> Result<Vec<String>, ClinicRecordsError> {
        let store = self.store.lock()?;
        Ok(store.distinct_diagnoses())
    }
}

fn to_ffi(patients: Vec<Patient>) -> Vec<FfiPatient> {
    patients.into_iter().map(Into::into).collect()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient. `birth_date` is an RFC 3339 timestamp.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i32,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: String,
    pub doctor_full_name: String,
    pub doctor_position: String,
    pub diagnosis: String,
    pub ambulatory: bool,
    pub sick_leave_days: u32,
    pub on_dispensary: bool,
    pub note: String,
    /// Derived, ignored on the way in
    pub age: i32,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            age: patient.age(),
            id: patient.id,
            birth_date: codec::format_date(&patient.birth_date),
            last_name: patient.last_name,
            first_name: patient.first_name,
            middle_name: patient.middle_name,
            doctor_full_name: patient.doctor_full_name,
            doctor_position: patient.doctor_position,
            diagnosis: patient.diagnosis,
            ambulatory: patient.ambulatory,
            sick_leave_days: patient.sick_leave_days,
            on_dispensary: patient.on_dispensary,
            note: patient.note,
        }
    }
}

impl From<FfiPatient> for Patient {
    fn from(patient: FfiPatient) -> Self {
        Patient {
            id: patient.id,
            last_name: patient.last_name,
            first_name: patient.first_name,
            middle_name: patient.middle_name,
            birth_date: codec::parse_date(patient.birth_date.trim())
                .unwrap_or_else(models::zero_date),
            doctor_full_name: patient.doctor_full_name,
            doctor_position: patient.doctor_position,
            diagnosis: patient.diagnosis,
            ambulatory: patient.ambulatory,
            sick_leave_days: patient.sick_leave_days,
            on_dispensary: patient.on_dispensary,
            note: patient.note,
        }
    }
}

/// FFI-safe sort key.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiSortKey {
    Id,
    LastName,
    Age,
}

impl From<FfiSortKey> for SortKey {
    fn from(key: FfiSortKey) -> Self {
        match key {
            FfiSortKey::Id => SortKey::Id,
            FfiSortKey::LastName => SortKey::LastName,
            FfiSortKey::Age => SortKey::Age,
        }
    }
}

/// FFI-safe combined query.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientQuery {
    pub last_name: String,
    pub diagnosis: String,
    pub sort: Option<FfiSortKey>,
    pub ascending: bool,
}

impl From<FfiPatientQuery> for PatientQuery {
    fn from(query: FfiPatientQuery) -> Self {
        PatientQuery {
            last_name: query.last_name,
            diagnosis: query.diagnosis,
            sort: query.sort.map(Into::into),
            ascending: query.ascending,
        }
    }
}

/// FFI-safe age statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatistics {
    pub count: u32,
    pub average_age: f64,
    pub min_age: i32,
    pub max_age: i32,
}

impl From<Statistics> for FfiStatistics {
    fn from(stats: Statistics) -> Self {
        Self {
            count: u32::try_from(stats.count).unwrap_or(u32::MAX),
            average_age: stats.average_age,
            min_age: stats.min_age,
            max_age: stats.max_age,
        }
    }
}

/// FFI-safe histogram bar.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistogramBar {
    pub label: String,
    pub count: u32,
}

impl From<HistogramBar> for FfiHistogramBar {
    fn from(bar: HistogramBar) -> Self {
        Self {
            label: bar.label,
            count: u32::try_from(bar.count).unwrap_or(u32::MAX),
        }
    }
}
