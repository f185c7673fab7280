// src/pipeline.rs
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::config::Durations;
use crate::error::AppError;
use crate::record::{
    parse_date, Record, COL_DATE, COL_EVALUATED_BY, COL_MEASURED_BY, COL_PROJECT,
    COL_SAMPLE_FORM, COL_SERIAL, VIEW_COLUMNS,
};
use crate::report::{build_report, FilteredView, Report};
use crate::table::{Cell, RawTable};

/// Per-run parameters. Missing bounds default to the earliest/latest dated row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub durations: Durations,
}

// A dated row together with its source cells, for the filtered view
struct DatedRow<'a> {
    record: Record,
    cells: &'a [Cell],
}

fn dated_rows(table: &RawTable, date_col: usize) -> Vec<DatedRow<'_>> {
    let col = |name: &str| table.column_index(name);
    let (serial, project, sample_form, measured_by, evaluated_by) = (
        col(COL_SERIAL),
        col(COL_PROJECT),
        col(COL_SAMPLE_FORM),
        col(COL_MEASURED_BY),
        col(COL_EVALUATED_BY),
    );
    for (name, idx) in [
        (COL_PROJECT, project),
        (COL_SAMPLE_FORM, sample_form),
        (COL_MEASURED_BY, measured_by),
        (COL_EVALUATED_BY, evaluated_by),
    ] {
        if idx.is_none() {
            warn!("Column '{}' not found; treating it as empty", name);
        }
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (line, cells) in table.rows.iter().enumerate() {
        let Some(date) = parse_date(table.cell(cells, Some(date_col))) else {
            debug!("Dropping row {}: unparseable date", line + 2);
            continue;
        };
        let text = |idx: Option<usize>| table.cell(cells, idx).as_text();
        rows.push(DatedRow {
            record: Record {
                date,
                serial: text(serial),
                project: text(project),
                sample_form: text(sample_form),
                measured_by: text(measured_by),
                evaluated_by: text(evaluated_by),
            },
            cells,
        });
    }
    rows
}

fn resolve_range(
    params: &ReportParams,
    rows: &[DatedRow<'_>],
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let min = rows.iter().map(|r| r.record.date).min();
    let max = rows.iter().map(|r| r.record.date).max();
    let start = params.start.or(min).ok_or(AppError::NoDatedRows)?;
    let end = params.end.or(max).ok_or(AppError::NoDatedRows)?;
    if start > end {
        return Err(AppError::InvalidDateRange { start, end });
    }
    Ok((start, end))
}

fn filtered_view(table: &RawTable, rows: &[&DatedRow<'_>]) -> FilteredView {
    let present: Vec<(&str, usize)> = VIEW_COLUMNS
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (*name, idx)))
        .collect();
    FilteredView {
        columns: present.iter().map(|(name, _)| name.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| {
                present
                    .iter()
                    .map(|(name, idx)| {
                        if *name == COL_DATE {
                            row.record.date.format("%d.%m.%Y").to_string()
                        } else {
                            table.cell(row.cells, Some(*idx)).as_text().unwrap_or_default()
                        }
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Runs one report over an already parsed table.
///
/// Fails before any aggregation when the date column is missing, no bound can
/// be resolved, or the range is inverted. Rows with unparseable dates are dropped.
pub fn generate_report(table: &RawTable, params: &ReportParams) -> Result<Report, AppError> {
    let date_col = table
        .column_index(COL_DATE)
        .ok_or_else(|| AppError::MissingColumn(COL_DATE.to_string()))?;

    let dated = dated_rows(table, date_col);
    let (start, end) = resolve_range(params, &dated)?;

    let in_range: Vec<&DatedRow<'_>> = dated
        .iter()
        .filter(|r| r.record.date >= start && r.record.date <= end)
        .collect();
    info!(
        "{} of {} rows dated, {} within {} to {}",
        dated.len(),
        table.rows.len(),
        in_range.len(),
        start,
        end
    );

    let records: Vec<Record> = in_range.iter().map(|r| r.record.clone()).collect();
    let agg = aggregate(&records, &params.durations);
    Ok(build_report(
        start,
        end,
        params.durations,
        filtered_view(table, &in_range),
        &agg,
    ))
}
