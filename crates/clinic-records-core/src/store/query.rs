//! Query views: search, filter, and sort.
//!
//! Every query returns a new `Vec` and leaves the store's order untouched.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::PatientStore;
use crate::models::{Patient, NO_DIAGNOSIS_LABEL};

/// Supported sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    Id,
    LastName,
    /// Age as of the time of sorting
    Age,
}

impl SortKey {
    /// Resolve a key name (`id`, `lastName`/`last_name`/`last-name`, `age`).
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "id" => Some(Self::Id),
            "lastname" => Some(Self::LastName),
            "age" => Some(Self::Age),
            _ => None,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::LastName => "last-name",
            Self::Age => "age",
        };
        f.write_str(name)
    }
}

/// Combined search, filter, and sort as driven by the patient table view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    /// Case-insensitive last-name substring; blank matches all
    pub last_name: String,
    /// Case-insensitive exact diagnosis; blank matches all
    pub diagnosis: String,
    /// `None` keeps store order
    pub sort: Option<SortKey>,
    pub ascending: bool,
}

impl PatientStore {
    /// Records whose last name contains `needle`, ignoring case.
    pub fn search_by_last_name(&self, needle: &str) -> Vec<Patient> {
        let matcher = LastNameMatcher::new(needle);
        self.patients
            .iter()
            .filter(|p| matcher.matches(p))
            .cloned()
            .collect()
    }

    /// Records whose diagnosis equals `value`, ignoring case.
    ///
    /// [`NO_DIAGNOSIS_LABEL`] also matches records with a blank diagnosis.
    pub fn filter_by_diagnosis(&self, value: &str) -> Vec<Patient> {
        let matcher = DiagnosisMatcher::new(value);
        self.patients
            .iter()
            .filter(|p| matcher.matches(p))
            .cloned()
            .collect()
    }

    /// All records sorted by `key`, ties kept in store order.
    pub fn sort_by(&self, key: SortKey, ascending: bool) -> Vec<Patient> {
        self.sort_by_at(key, ascending, Utc::now())
    }

    /// [`sort_by`](Self::sort_by) with ages computed as of `now`.
    pub fn sort_by_at(&self, key: SortKey, ascending: bool, now: DateTime<Utc>) -> Vec<Patient> {
        let mut patients = self.patients.clone();
        sort_patients(&mut patients, key, ascending, now);
        patients
    }

    /// Sort by a key name; unknown names sort ascending by id.
    pub fn sort_by_name(&self, name: &str, ascending: bool) -> Vec<Patient> {
        match SortKey::parse(name) {
            Some(key) => self.sort_by(key, ascending),
            None => self.sort_by(SortKey::Id, true),
        }
    }

    /// Run a combined query.
    pub fn query(&self, query: &PatientQuery) -> Vec<Patient> {
        self.query_at(query, Utc::now())
    }

    /// [`query`](Self::query) with ages computed as of `now`.
    pub fn query_at(&self, query: &PatientQuery, now: DateTime<Utc>) -> Vec<Patient> {
        let by_name = LastNameMatcher::new(&query.last_name);
        let by_diagnosis = DiagnosisMatcher::new(&query.diagnosis);

        let mut patients: Vec<Patient> = self
            .patients
            .iter()
            .filter(|p| by_name.matches(p) && by_diagnosis.matches(p))
            .cloned()
            .collect();

        if let Some(key) = query.sort {
            sort_patients(&mut patients, key, query.ascending, now);
        }
        patients
    }
}

struct LastNameMatcher {
    needle: Option<String>,
}

impl LastNameMatcher {
    fn new(needle: &str) -> Self {
        Self {
            needle: (!needle.trim().is_empty()).then(|| needle.to_lowercase()),
        }
    }

    fn matches(&self, patient: &Patient) -> bool {
        match &self.needle {
            Some(needle) => patient.last_name.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

struct DiagnosisMatcher {
    wanted: Option<String>,
    includes_blank: bool,
}

impl DiagnosisMatcher {
    fn new(value: &str) -> Self {
        if value.trim().is_empty() {
            return Self {
                wanted: None,
                includes_blank: false,
            };
        }
        let wanted = value.to_lowercase();
        Self {
            includes_blank: wanted == NO_DIAGNOSIS_LABEL,
            wanted: Some(wanted),
        }
    }

    fn matches(&self, patient: &Patient) -> bool {
        match &self.wanted {
            Some(wanted) => {
                patient.diagnosis.to_lowercase() == *wanted
                    || (self.includes_blank && patient.diagnosis.trim().is_empty())
            }
            None => true,
        }
    }
}

fn sort_patients(patients: &mut [Patient], key: SortKey, ascending: bool, now: DateTime<Utc>) {
    patients.sort_by(|a, b| {
        let ord = compare(a, b, key, now);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

fn compare(a: &Patient, b: &Patient, key: SortKey, now: DateTime<Utc>) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::LastName => a
            .last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase()),
        SortKey::Age => a.age_at(now).cmp(&b.age_at(now)),
    }
}
