// src/record.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

use crate::table::Cell;

// --- Column Names ---

pub const COL_SERIAL: &str = "Fortlaufende Nummer";
pub const COL_PROJECT: &str = "Projekt";
pub const COL_DATE: &str = "Datum";
pub const COL_SAMPLE_FORM: &str = "Probenform";
pub const COL_MEASURED_BY: &str = "Messung Durchgeführt";
pub const COL_EVALUATED_BY: &str = "Auswertung Durchgeführt";

/// Columns kept in the filtered-row view, in display order.
pub const VIEW_COLUMNS: [&str; 6] = [
    COL_SERIAL,
    COL_PROJECT,
    COL_DATE,
    COL_SAMPLE_FORM,
    COL_MEASURED_BY,
    COL_EVALUATED_BY,
];

// --- Date Parsing ---

const DATE_FORMATS: [&str; 7] = [
    "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%y", "%d/%m/%y", "%Y-%m-%d", "%Y/%m/%d",
];

/// Parses a date cell day-first. Anything after the date (a time of day) is ignored.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Text(s) => parse_date_text(s),
        Cell::Number(_) | Cell::Empty => None,
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    let date_part = trimmed.split_whitespace().next()?;
    // %Y happily reads "24" as year 24, so short years fall through to %y
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(date_part, fmt)
            .ok()
            .filter(|date| date.year() >= 100)
    })
}

// --- Records ---

/// One dated input row, fields still as the user typed them.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub date: NaiveDate,
    pub serial: Option<String>,
    pub project: Option<String>,
    pub sample_form: Option<String>,
    pub measured_by: Option<String>,
    pub evaluated_by: Option<String>,
}

/// Case/whitespace-insensitive identity of a project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Uppercases, turns non-breaking spaces into spaces, collapses whitespace runs
    /// and trims. `None` when nothing is left.
    pub fn new(name: &str) -> Option<Self> {
        let key = name
            .to_uppercase()
            .replace('\u{00A0}', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if key.is_empty() {
            None
        } else {
            Some(ProjectKey(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields aggregation works on, cleaned.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub project_key: Option<ProjectKey>,
    pub project_name: String,
    pub sample_form: String,
    pub measured_by: String,
    pub evaluated_by: String,
}

impl NormalizedRow {
    pub fn from_record(record: &Record) -> Self {
        let project_name = record.project.as_deref().unwrap_or_default().trim().to_string();
        Self {
            date: record.date,
            project_key: ProjectKey::new(&project_name),
            project_name,
            sample_form: record
                .sample_form
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
            measured_by: trimmed(&record.measured_by),
            evaluated_by: trimmed(&record.evaluated_by),
        }
    }
}

fn trimmed(field: &Option<String>) -> String {
    field.as_deref().map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn dates_parse_day_first() {
        assert_eq!(parse_date(&Cell::Text("03.04.2024".into())), Some(d(2024, 4, 3)));
        assert_eq!(parse_date(&Cell::Text("03/04/2024".into())), Some(d(2024, 4, 3)));
        assert_eq!(parse_date(&Cell::Text("3.4.2024".into())), Some(d(2024, 4, 3)));
        assert_eq!(parse_date(&Cell::Text("03.04.24".into())), Some(d(2024, 4, 3)));
        assert_eq!(
            parse_date(&Cell::Text(" 2024-04-03 10:15:00 ".into())),
            Some(d(2024, 4, 3))
        );
        assert_eq!(
            parse_date(&Cell::Text("2024-04-03T10:15:00".into())),
            Some(d(2024, 4, 3))
        );
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(parse_date(&Cell::Text("31.02.2024".into())), None);
        assert_eq!(parse_date(&Cell::Text("next week".into())), None);
        assert_eq!(parse_date(&Cell::Number(45000.0)), None);
        assert_eq!(parse_date(&Cell::Empty), None);
    }

    #[test]
    fn native_date_cells_keep_their_date() {
        let dt = d(2024, 12, 1).and_hms_opt(13, 0, 0).unwrap();
        assert_eq!(parse_date(&Cell::DateTime(dt)), Some(d(2024, 12, 1)));
    }

    #[test]
    fn project_key_collapses_case_and_whitespace() {
        let a = ProjectKey::new("Alpha  project ").unwrap();
        let b = ProjectKey::new("ALPHA\u{00A0}Project").unwrap();
        let c = ProjectKey::new("\talpha \n project").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "ALPHA PROJECT");
        assert_eq!(ProjectKey::new(" \u{00A0} "), None);
        assert_eq!(ProjectKey::new(""), None);
    }

    #[test]
    fn normalizer_cleans_fields() {
        let record = Record {
            date: d(2024, 1, 5),
            project: Some("  Proj X ".into()),
            sample_form: Some("Gestanzt, Al-Tiegel".into()),
            measured_by: Some(" MH ".into()),
            evaluated_by: None,
            ..Default::default()
        };
        let row = NormalizedRow::from_record(&record);
        assert_eq!(row.project_name, "Proj X");
        assert_eq!(row.project_key, ProjectKey::new("PROJ X"));
        assert_eq!(row.sample_form, "gestanzt, al-tiegel");
        assert_eq!(row.measured_by, "MH");
        assert_eq!(row.evaluated_by, "");
    }

    #[test]
    fn missing_text_fields_become_empty_strings() {
        let row = NormalizedRow::from_record(&Record {
            date: d(2024, 1, 5),
            ..Default::default()
        });
        assert_eq!(row.project_key, None);
        assert_eq!(row.sample_form, "");
    }
}
