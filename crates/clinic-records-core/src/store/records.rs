//! Record-level CRUD.

use tracing::{debug, warn};

use super::PatientStore;
use crate::models::Patient;

impl PatientStore {
    /// Add a patient at the end of the collection and return its id.
    ///
    /// A patient with id `0` is given the next free id. A non-zero id that is
    /// already taken is replaced the same way, so ids stay unique.
    pub fn add(&mut self, patient: Patient) -> i32 {
        let requested = patient.id;
        let id = self.insert_unique(patient);
        if requested != 0 && requested != id {
            warn!(requested, assigned = id, "Id already in use, assigned a new one");
        }
        debug!(id, "Added patient");
        id
    }

    /// Get a patient by id.
    pub fn get(&self, id: i32) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Overwrite every field except the id of the record with `patient.id`.
    ///
    /// Returns `false` (and changes nothing) if no such record exists.
    pub fn update_by_id(&mut self, patient: &Patient) -> bool {
        match self.patients.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => {
                existing.overwrite_from(patient);
                debug!(id = patient.id, "Updated patient");
                true
            }
            None => {
                debug!(id = patient.id, "Update skipped, no such patient");
                false
            }
        }
    }

    /// Remove the record with `id`. Returns `false` if there was none.
    pub fn delete_by_id(&mut self, id: i32) -> bool {
        match self.patients.iter().position(|p| p.id == id) {
            Some(idx) => {
                self.patients.remove(idx);
                debug!(id, "Deleted patient");
                true
            }
            None => false,
        }
    }

    /// Append `patient`, first giving it a fresh id if its own is `0` or taken.
    pub(super) fn insert_unique(&mut self, mut patient: Patient) -> i32 {
        if !patient.is_persisted() || self.contains_id(patient.id) {
            patient.id = self.next_id();
        }
        let id = patient.id;
        self.patients.push(patient);
        id
    }
}
