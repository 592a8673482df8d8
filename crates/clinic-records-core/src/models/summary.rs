//! Aggregate views over the patient collection.

use serde::{Deserialize, Serialize};

/// Age statistics over every record in a store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    /// Number of records
    pub count: usize,
    /// Mean age in years
    pub average_age: f64,
    pub min_age: i32,
    pub max_age: i32,
}

impl Statistics {
    /// Compute statistics from a list of ages. An empty list yields all zeros.
    pub fn from_ages(ages: &[i32]) -> Self {
        if ages.is_empty() {
            return Self::default();
        }

        let sum: i64 = ages.iter().map(|&a| a as i64).sum();
        Self {
            count: ages.len(),
            average_age: sum as f64 / ages.len() as f64,
            min_age: ages.iter().copied().min().unwrap_or_default(),
            max_age: ages.iter().copied().max().unwrap_or_default(),
        }
    }
}

/// One bar of the diagnosis histogram.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistogramBar {
    pub label: String,
    pub count: usize,
}
