// src/classify.rs
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::Durations;

// Spellings of "gestanzt" seen in the lab sheets. Extending this list changes
// classification results.
pub const PUNCHED_SPELLINGS: [&str; 5] = ["gestanzt", "gestanzz", "gestanztz", "gestantzt", "gestanzr"];
pub const SAMPLE_CUTTER_MARKER: &str = "sample cutter";

// Used for the summary counts, independent of the per-row classification.
// Both are matched against lowercased text.
pub static PUNCHED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = PUNCHED_SPELLINGS.iter().map(|s| regex::escape(s)).collect();
    Regex::new(&alternatives.join("|")).expect("punched pattern is a valid regex")
});
pub static SAMPLE_CUTTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sample cutter").expect("sample cutter pattern is a valid regex"));

/// Sample preparation method, which decides the measurement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SampleForm {
    Punched,
    SampleCutter,
    None,
}

impl SampleForm {
    /// Classifies lowercased sample-form text. Punched wins over sample cutter.
    pub fn classify(sample_form: &str) -> Self {
        if PUNCHED_SPELLINGS.iter().any(|s| sample_form.contains(s)) {
            SampleForm::Punched
        } else if sample_form.contains(SAMPLE_CUTTER_MARKER) {
            SampleForm::SampleCutter
        } else {
            SampleForm::None
        }
    }

    pub fn measurement_minutes(self, durations: &Durations) -> u32 {
        match self {
            SampleForm::Punched => durations.punched,
            SampleForm::SampleCutter => durations.sample_cutter,
            SampleForm::None => 0,
        }
    }
}
