// src/report.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

use crate::aggregate::Aggregation;
use crate::config::Durations;
use crate::technician::{Activity, Technician};

/// Renders whole minutes as `H:MM`.
pub fn format_time(minutes: u64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

// --- Report Structures ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicianTimeRow {
    pub technician: Technician,
    pub activity: Activity,
    pub label: String,
    pub minutes: u64,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTimeRow {
    pub project: String,
    pub minutes: u64,
    pub total_time: String,
}

/// The dated rows inside the range, restricted to the view columns present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub durations: Durations,
    pub filtered: FilteredView,
    pub summary: Vec<SummaryRow>,
    pub technician_times: Vec<TechnicianTimeRow>,
    pub project_times: Vec<ProjectTimeRow>,
}

impl Report {
    pub fn technician_time(&self, technician: Technician, activity: Activity) -> Option<&str> {
        self.technician_times
            .iter()
            .find(|row| row.technician == technician && row.activity == activity)
            .map(|row| row.time.as_str())
    }

    pub fn project_time(&self, project: &str) -> Option<&str> {
        self.project_times
            .iter()
            .find(|row| row.project == project)
            .map(|row| row.total_time.as_str())
    }
}

// --- Builders ---

pub fn summary_table(agg: &Aggregation) -> Vec<SummaryRow> {
    let mut rows = vec![
        SummaryRow {
            category: "Total 'gestanzt' samples".to_string(),
            count: agg.punched_count,
        },
        SummaryRow {
            category: "Total 'sample cutter' samples".to_string(),
            count: agg.sample_cutter_count,
        },
    ];
    for (activity, counts) in [
        (Activity::Measurement, &agg.measurement_rows),
        (Activity::Evaluation, &agg.evaluation_rows),
    ] {
        for technician in Technician::ALL {
            rows.push(SummaryRow {
                category: format!("{} ({} Durchgeführt)", technician, activity.label()),
                count: counts[technician] as usize,
            });
        }
    }
    rows
}

pub fn technician_time_table(agg: &Aggregation) -> Vec<TechnicianTimeRow> {
    Activity::ALL
        .into_iter()
        .flat_map(|activity| {
            let totals = match activity {
                Activity::Measurement => agg.measurement_minutes,
                Activity::Evaluation => agg.evaluation_minutes,
            };
            Technician::ALL.into_iter().map(move |technician| {
                let minutes = totals[technician];
                TechnicianTimeRow {
                    technician,
                    activity,
                    label: format!("{} Total ({})", technician, activity.label()),
                    minutes,
                    time: format_time(minutes),
                }
            })
        })
        .collect()
}

/// Projects by total time, largest first. Equal totals keep first-seen order.
pub fn project_time_table(agg: &Aggregation) -> Vec<ProjectTimeRow> {
    let mut totals: Vec<_> = agg.projects.iter().filter(|p| p.minutes > 0).collect();
    totals.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    totals
        .into_iter()
        .map(|p| ProjectTimeRow {
            project: p.display_name.clone(),
            minutes: p.minutes,
            total_time: format_time(p.minutes),
        })
        .collect()
}

pub fn build_report(
    start: NaiveDate,
    end: NaiveDate,
    durations: Durations,
    filtered: FilteredView,
    agg: &Aggregation,
) -> Report {
    Report {
        start,
        end,
        durations,
        filtered,
        summary: summary_table(agg),
        technician_times: technician_time_table(agg),
        project_times: project_time_table(agg),
    }
}

// --- Text Rendering ---

fn render_line<S: AsRef<str>>(out: &mut String, cells: impl Iterator<Item = S>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell.as_ref(), width = *w))
        .collect();
    let _ = writeln!(out, "| {} |", padded.join(" | "));
}

fn render_table(out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    render_line(out, headers.iter(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "|-{}-|", rule.join("-|-"));
    for row in rows {
        render_line(out, row.iter(), &widths);
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "DSC Hour Report {} to {} (T1={} T2={} T3={} min)\n",
        report.start.format("%d.%m.%Y"),
        report.end.format("%d.%m.%Y"),
        report.durations.punched,
        report.durations.sample_cutter,
        report.durations.evaluation
    );

    let _ = writeln!(out, "Filtered Data ({} rows)", report.filtered.rows.len());
    let columns: Vec<&str> = report.filtered.columns.iter().map(String::as_str).collect();
    render_table(&mut out, &columns, &report.filtered.rows);

    let _ = writeln!(out, "\nSummary Table");
    let summary: Vec<Vec<String>> = report
        .summary
        .iter()
        .map(|r| vec![r.category.clone(), r.count.to_string()])
        .collect();
    render_table(&mut out, &["Category", "Count"], &summary);

    let _ = writeln!(out, "\nTotal Time each person spent at the DSC machine (Hour:Min)");
    for row in &report.technician_times {
        let _ = writeln!(out, "{}: {}", row.label, row.time);
    }

    let _ = writeln!(out, "\nTotal Time per Projekt (Hour:Min)");
    let projects: Vec<Vec<String>> = report
        .project_times
        .iter()
        .map(|r| vec![r.project.clone(), r.total_time.clone()])
        .collect();
    render_table(&mut out, &["Projekt", "Total Time"], &projects);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProjectKey;

    #[test]
    fn format_time_renders_hours_and_padded_minutes() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(60), "1:00");
        assert_eq!(format_time(125), "2:05");
        assert_eq!(format_time(6000), "100:00");
        assert_eq!(format_time(u64::from(u32::MAX) + 1), "71582788:16");
    }

    fn sample_aggregation() -> Aggregation {
        let mut agg = Aggregation {
            punched_count: 3,
            sample_cutter_count: 1,
            ..Default::default()
        };
        agg.measurement_rows.add(Technician::HD, 2);
        agg.evaluation_rows.add(Technician::MH, 4);
        agg.measurement_minutes.add(Technician::AK, 75);
        agg.evaluation_minutes.add(Technician::HD, 15);
        for (name, minutes) in [("Beta", 20), ("Alpha", 45), ("Gamma", 20), ("Delta", 90)] {
            agg.projects.add(ProjectKey::new(name).unwrap(), name, minutes);
        }
        agg
    }

    #[test]
    fn summary_table_has_fixed_order() {
        let rows = summary_table(&sample_aggregation());
        let categories: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(
            categories,
            vec![
                "Total 'gestanzt' samples",
                "Total 'sample cutter' samples",
                "MH (Messung Durchgeführt)",
                "AK (Messung Durchgeführt)",
                "HD (Messung Durchgeführt)",
                "MH (Auswertung Durchgeführt)",
                "AK (Auswertung Durchgeführt)",
                "HD (Auswertung Durchgeführt)",
            ]
        );
        let counts: Vec<usize> = rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![3, 1, 0, 0, 2, 4, 0, 0]);
    }

    #[test]
    fn technician_times_are_formatted() {
        let rows = technician_time_table(&sample_aggregation());
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[1].label, "AK Total (Messung)");
        assert_eq!(rows[1].time, "1:15");
        assert_eq!(rows[5].label, "HD Total (Auswertung)");
        assert_eq!(rows[5].time, "0:15");
        assert_eq!(rows[0].time, "0:00");
    }

    #[test]
    fn projects_sorted_descending_with_stable_ties() {
        let rows = project_time_table(&sample_aggregation());
        let names: Vec<&str> = rows.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(names, vec!["Delta", "Alpha", "Beta", "Gamma"]);
        assert_eq!(rows[0].total_time, "1:30");
    }

    #[test]
    fn text_rendering_contains_every_section() {
        let agg = sample_aggregation();
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = build_report(d, d, Durations::default(), FilteredView::default(), &agg);
        let text = render_text(&report);
        assert!(text.contains("01.03.2024 to 01.03.2024"));
        assert!(text.contains("| Total 'gestanzt' samples"));
        assert!(text.contains("AK Total (Messung): 1:15"));
        assert!(text.contains("| Delta"));
        assert_eq!(report.project_time("Alpha"), Some("0:45"));
        assert_eq!(
            report.technician_time(Technician::HD, Activity::Evaluation),
            Some("0:15")
        );
    }
}
