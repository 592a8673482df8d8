//! Patient models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Average length of a Gregorian year in days, used for age in whole years.
pub const DAYS_PER_YEAR: f64 = 365.2425;

/// Label used in place of a blank diagnosis when grouping and filtering.
pub const NO_DIAGNOSIS_LABEL: &str = "(none)";

/// The date a record falls back to when its birth date is absent or unreadable.
pub fn zero_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// A clinic patient record.
///
/// Every field always holds a value; absent data is represented by the
/// field's default (empty text, `0`, `false`, or [`zero_date`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Store-assigned identifier, `0` until the record is added to a store
    pub id: i32,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: DateTime<Utc>,
    /// Full name of the attending doctor
    pub doctor_full_name: String,
    /// Doctor's position or specialty
    pub doctor_position: String,
    pub diagnosis: String,
    /// Treated as an outpatient
    pub ambulatory: bool,
    pub sick_leave_days: u32,
    /// Registered for dispensary observation
    pub on_dispensary: bool,
    pub note: String,
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            id: 0,
            last_name: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            birth_date: zero_date(),
            doctor_full_name: String::new(),
            doctor_position: String::new(),
            diagnosis: String::new(),
            ambulatory: false,
            sick_leave_days: 0,
            on_dispensary: false,
            note: String::new(),
        }
    }
}

impl Patient {
    /// Create an unsaved patient with the given name and birth date.
    pub fn new(last_name: String, first_name: String, birth_date: DateTime<Utc>) -> Self {
        Self {
            last_name,
            first_name,
            birth_date,
            ..Self::default()
        }
    }

    /// Check if this patient has been assigned an id by a store.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Age in whole years as of today.
    pub fn age(&self) -> i32 {
        self.age_at(Utc::now())
    }

    /// Age in whole years as of `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> i32 {
        let days = (now - self.birth_date).num_seconds() as f64 / 86_400.0;
        (days / DAYS_PER_YEAR).floor() as i32
    }

    /// "Last First Middle", skipping empty parts.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.middle_name]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Diagnosis as used for grouping: blank diagnoses map to [`NO_DIAGNOSIS_LABEL`].
    pub fn diagnosis_label(&self) -> &str {
        if self.diagnosis.trim().is_empty() {
            NO_DIAGNOSIS_LABEL
        } else {
            &self.diagnosis
        }
    }

    /// Copy every field except `id` from `other`.
    pub fn overwrite_from(&mut self, other: &Patient) {
        let id = self.id;
        *self = other.clone();
        self.id = id;
    }
}
