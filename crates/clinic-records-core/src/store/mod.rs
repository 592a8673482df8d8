//! In-memory patient store backed by a CSV flat file.
//!
//! The store owns the canonical, insertion-ordered list of records. Callers
//! get read-only views and copies; mutation goes through the CRUD methods.

mod file;
mod query;
mod records;
mod summary;

pub use query::*;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Patient;

/// Store errors. Only the backing file can fail; data problems never do.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The patient collection.
#[derive(Debug, Clone, Default)]
pub struct PatientStore {
    patients: Vec<Patient>,
}

impl PatientStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    fn contains_id(&self, id: i32) -> bool {
        self.patients.iter().any(|p| p.id == id)
    }

    /// Next free id: one past the largest positive id, or 1 for an empty store.
    fn next_id(&self) -> i32 {
        let max = self.patients.iter().map(|p| p.id).max().unwrap_or(0).max(0);
        match max.checked_add(1) {
            Some(id) => id,
            None => (1..=i32::MAX)
                .find(|id| !self.contains_id(*id))
                .unwrap_or(i32::MIN),
        }
    }
}
