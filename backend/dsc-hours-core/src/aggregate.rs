// src/aggregate.rs
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::classify::{SampleForm, PUNCHED_PATTERN, SAMPLE_CUTTER_PATTERN};
use crate::config::Durations;
use crate::record::{NormalizedRow, ProjectKey, Record};
use crate::technician::PerTechnician;

// --- Project Totals ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTotal {
    pub key: ProjectKey,
    /// First spelling seen for this key.
    pub display_name: String,
    pub minutes: u64,
}

// Insertion-ordered map from ProjectKey to its running total
#[derive(Debug, Clone, Default)]
pub struct ProjectTotals {
    index: HashMap<ProjectKey, usize>,
    entries: Vec<ProjectTotal>,
}

impl ProjectTotals {
    pub fn add(&mut self, key: ProjectKey, display_name: &str, minutes: u64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].minutes += minutes,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(ProjectTotal {
                    key,
                    display_name: display_name.to_string(),
                    minutes,
                });
            }
        }
    }

    pub fn get(&self, key: &ProjectKey) -> Option<&ProjectTotal> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Totals in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectTotal> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Aggregation ---

/// Everything one pass over the filtered rows produces.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub punched_count: usize,
    pub sample_cutter_count: usize,
    pub measurement_minutes: PerTechnician,
    pub evaluation_minutes: PerTechnician,
    pub measurement_rows: PerTechnician,
    pub evaluation_rows: PerTechnician,
    pub projects: ProjectTotals,
}

/// Counts rows whose lowercased sample-form text matches `pattern`.
fn count_matching(records: &[Record], pattern: &Regex) -> usize {
    records
        .iter()
        .filter(|r| {
            r.sample_form
                .as_deref()
                .is_some_and(|text| pattern.is_match(&text.to_lowercase()))
        })
        .count()
}

// Raw (untrimmed) code counts, as a value count over the column would give
fn count_codes<'a>(codes: impl Iterator<Item = Option<&'a str>>) -> PerTechnician {
    let mut counts = PerTechnician::default();
    for code in codes.flatten() {
        counts.add_code(code, 1);
    }
    counts
}

pub fn aggregate(records: &[Record], durations: &Durations) -> Aggregation {
    let mut agg = Aggregation {
        punched_count: count_matching(records, &PUNCHED_PATTERN),
        sample_cutter_count: count_matching(records, &SAMPLE_CUTTER_PATTERN),
        measurement_rows: count_codes(records.iter().map(|r| r.measured_by.as_deref())),
        evaluation_rows: count_codes(records.iter().map(|r| r.evaluated_by.as_deref())),
        ..Default::default()
    };

    for record in records {
        let row = NormalizedRow::from_record(record);
        let measurement =
            u64::from(SampleForm::classify(&row.sample_form).measurement_minutes(durations));
        let evaluation = u64::from(durations.evaluation);

        if !agg.measurement_minutes.add_code(&row.measured_by, measurement) {
            debug!(
                "Unrecognized measurement technician {:?} on {}",
                row.measured_by, row.date
            );
        }
        if !agg.evaluation_minutes.add_code(&row.evaluated_by, evaluation) {
            debug!(
                "Unrecognized evaluation technician {:?} on {}",
                row.evaluated_by, row.date
            );
        }

        // Evaluation time counts towards the project whoever evaluated
        match row.project_key {
            Some(key) => agg
                .projects
                .add(key, &row.project_name, measurement + evaluation),
            None => debug!("Row on {} has no project, skipped for project totals", row.date),
        }
    }

    info!(
        "Aggregated {} rows: {} gestanzt, {} sample cutter, {} projects",
        records.len(),
        agg.punched_count,
        agg.sample_cutter_count,
        agg.projects.len()
    );
    agg
}
