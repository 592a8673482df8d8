//! Aggregate views: age statistics and the diagnosis histogram.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::PatientStore;
use crate::models::{HistogramBar, Statistics};

impl PatientStore {
    /// Count and age statistics over every record.
    pub fn statistics(&self) -> Statistics {
        self.statistics_at(Utc::now())
    }

    /// [`statistics`](Self::statistics) with ages computed as of `now`.
    pub fn statistics_at(&self, now: DateTime<Utc>) -> Statistics {
        let ages: Vec<i32> = self.patients.iter().map(|p| p.age_at(now)).collect();
        Statistics::from_ages(&ages)
    }

    /// Number of records per diagnosis label.
    ///
    /// Labels are grouped exactly as stored; blank diagnoses are counted
    /// under [`NO_DIAGNOSIS_LABEL`](crate::models::NO_DIAGNOSIS_LABEL).
    pub fn histogram_by_diagnosis(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for patient in &self.patients {
            *counts
                .entry(patient.diagnosis_label().to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// The histogram ordered by descending count, ties by label.
    pub fn histogram_ranked(&self) -> Vec<HistogramBar> {
        let mut bars: Vec<HistogramBar> = self
            .histogram_by_diagnosis()
            .into_iter()
            .map(|(label, count)| HistogramBar { label, count })
            .collect();
        bars.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        bars
    }

    /// Distinct non-blank diagnoses in store order, compared ignoring case.
    pub fn distinct_diagnoses(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.patients
            .iter()
            .filter(|p| !p.diagnosis.trim().is_empty())
            .filter(|p| seen.insert(p.diagnosis.to_lowercase()))
            .map(|p| p.diagnosis.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, NO_DIAGNOSIS_LABEL};
    use chrono::TimeZone;

    fn patient(diagnosis: &str, birth_year: i32) -> Patient {
        Patient {
            diagnosis: diagnosis.into(),
            birth_date: Utc.with_ymd_and_hms(birth_year, 1, 1, 0, 0, 0).unwrap(),
            ..Patient::default()
        }
    }

    #[test]
    fn test_statistics_empty_store() {
        let stats = PatientStore::new().statistics();
        assert_eq!(stats, Statistics::default());
        assert_eq!((stats.count, stats.min_age, stats.max_age), (0, 0, 0));
        assert_eq!(stats.average_age, 0.0);
    }

    #[test]
    fn test_statistics() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut store = PatientStore::new();
        store.add(patient("Flu", 1994));
        store.add(patient("Flu", 1984));
        store.add(patient("", 1989));

        let stats = store.statistics_at(now);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_age, 30);
        assert_eq!(stats.max_age, 40);
        assert_eq!(stats.average_age, 35.0);
    }

    #[test]
    fn test_histogram_groups_blank_as_none() {
        let mut store = PatientStore::new();
        store.add(patient("Flu", 1990));
        store.add(patient("Flu", 1990));
        store.add(patient("", 1990));

        let histogram = store.histogram_by_diagnosis();
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram["Flu"], 2);
        assert_eq!(histogram[NO_DIAGNOSIS_LABEL], 1);
    }

    #[test]
    fn test_histogram_is_case_sensitive() {
        let mut store = PatientStore::new();
        store.add(patient("Flu", 1990));
        store.add(patient("flu", 1990));
        assert_eq!(store.histogram_by_diagnosis().len(), 2);
    }

    #[test]
    fn test_histogram_ranked() {
        let mut store = PatientStore::new();
        store.add(patient("Angina", 1990));
        store.add(patient("Flu", 1990));
        store.add(patient("Flu", 1990));
        store.add(patient("Bronchitis", 1990));

        let labels: Vec<(String, usize)> = store
            .histogram_ranked()
            .into_iter()
            .map(|bar| (bar.label, bar.count))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("Flu".to_string(), 2),
                ("Angina".to_string(), 1),
                ("Bronchitis".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_distinct_diagnoses() {
        let mut store = PatientStore::new();
        store.add(patient("Flu", 1990));
        store.add(patient(" ", 1990));
        store.add(patient("FLU", 1990));
        store.add(patient("Angina", 1990));
        assert_eq!(store.distinct_diagnoses(), vec!["Flu", "Angina"]);
    }
}
