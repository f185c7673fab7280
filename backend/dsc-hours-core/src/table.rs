// src/table.rs
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use encoding_rs::WINDOWS_1252;
use std::{borrow::Cow, fs, io::Cursor, path::Path};
use tracing::{debug, info};

use crate::error::AppError;

// --- Raw Table Structures ---

/// A single spreadsheet cell, typed as loosely as the source allows.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text as the user typed it, `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::DateTime(dt) => Some(dt.format("%d.%m.%Y").to_string()),
        }
    }
}

// Whole numbers print without the float tail ("12" not "12.0")
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, column), `Empty` for short rows.
    pub fn cell<'a>(&'a self, row: &'a [Cell], column: Option<usize>) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        column.and_then(|c| row.get(c)).unwrap_or(&EMPTY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
    Xls,
    Ods,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_name(&ext)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" => Some(TableFormat::Xlsx),
            "xls" => Some(TableFormat::Xls),
            "ods" => Some(TableFormat::Ods),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes of an upload.
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
        const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        if bytes.starts_with(ZIP_MAGIC) {
            TableFormat::Xlsx
        } else if bytes.starts_with(OLE_MAGIC) {
            TableFormat::Xls
        } else {
            TableFormat::Csv
        }
    }
}

// --- Readers ---

pub fn read_table(path: &Path) -> Result<RawTable, AppError> {
    info!("Reading table from {}", path.display());
    let bytes = fs::read(path)?;
    let format = TableFormat::from_path(path).unwrap_or_else(|| TableFormat::sniff(&bytes));
    parse_table(bytes, format)
}

pub fn parse_table(bytes: Vec<u8>, format: TableFormat) -> Result<RawTable, AppError> {
    let table = match format {
        TableFormat::Csv => parse_csv(&bytes)?,
        TableFormat::Xlsx | TableFormat::Xls | TableFormat::Ods => parse_workbook(bytes)?,
    };
    info!(
        "Parsed {:?} table: {} columns, {} rows",
        format,
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

// Lab exports from German Excel use ';', everything else ','
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = header_line.iter().filter(|b| **b == b';').count();
    let commas = header_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

// Excel on Windows saves CSV as Windows-1252 unless told to use UTF-8
fn decode_csv(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            info!(
                "CSV is not UTF-8 (invalid byte at {}), decoding as Windows-1252",
                e.valid_up_to()
            );
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

fn parse_csv(bytes: &[u8]) -> Result<RawTable, AppError> {
    let text = decode_csv(bytes);
    let bytes = text.as_bytes();
    let delimiter = detect_delimiter(bytes);
    debug!("CSV delimiter: {:?}", delimiter as char);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.iter().map(clean_header).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable { headers, rows })
}

fn parse_workbook(bytes: Vec<u8>) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(AppError::EmptyWorkbook)??;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(first) => first
            .iter()
            .map(|c| convert_cell(c).as_text().map(|s| clean_header(&s)).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    };
    let rows = rows_iter
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(RawTable { headers, rows })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Number(dt.as_f64()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_date;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;

    #[test]
    fn csv_with_semicolons_and_bom_is_parsed() {
        let data = "\u{feff}Datum;Projekt ;Probenform\n01.02.2024;Proj X;gestanzt\n02.02.2024;;\n";
        let table = parse_table(data.as_bytes().to_vec(), TableFormat::Csv).unwrap();
        assert_eq!(table.headers, vec!["Datum", "Projekt", "Probenform"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], Cell::Text("Proj X".into()));
        assert_eq!(table.rows[1][1], Cell::Empty);
    }

    #[test]
    fn ragged_rows_read_as_empty_cells() {
        let data = "Datum,Projekt,Probenform\n01.02.2024\n";
        let table = parse_table(data.as_bytes().to_vec(), TableFormat::Csv).unwrap();
        let row = &table.rows[0];
        let idx = table.column_index("Probenform");
        assert_eq!(idx, Some(2));
        assert!(table.cell(row, idx).is_empty());
        assert!(table.cell(row, None).is_empty());
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            TableFormat::from_path(Path::new("runs/DSC.XLSX")),
            Some(TableFormat::Xlsx)
        );
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
        assert_eq!(TableFormat::sniff(b"PK\x03\x04rest"), TableFormat::Xlsx);
        assert_eq!(TableFormat::sniff(b"Datum,Projekt"), TableFormat::Csv);
        assert_eq!(TableFormat::from_name(" ods "), Some(TableFormat::Ods));
    }

    #[test]
    fn garbage_workbook_is_a_spreadsheet_error() {
        let result = parse_table(b"PK\x03\x04not a zip".to_vec(), TableFormat::Xlsx);
        assert!(matches!(result, Err(AppError::Spreadsheet(_))));
    }

    #[test]
    fn numbers_render_without_float_tail() {
        assert_eq!(Cell::Number(12.0).as_text().unwrap(), "12");
        assert_eq!(Cell::Number(1.5).as_text().unwrap(), "1.5");
    }

    #[test]
    fn windows_1252_csv_is_decoded() {
        let data = b"Datum;Messung Durchgef\xFChrt;Projekt\n01.02.2024;MH;M\xFCller \x96 Alu\n".to_vec();
        let table = parse_table(data, TableFormat::Csv).unwrap();
        assert_eq!(table.column_index("Messung Durchgeführt"), Some(1));
        assert_eq!(table.rows[0][1], Cell::Text("MH".into()));
        assert_eq!(table.rows[0][2], Cell::Text("Müller \u{2013} Alu".into()));
    }

    #[test]
    fn utf8_csv_is_not_re_decoded() {
        let data = "Datum,Messung Durchgeführt\n01.02.2024,AK\n";
        let table = parse_table(data.as_bytes().to_vec(), TableFormat::Csv).unwrap();
        assert_eq!(table.headers[1], "Messung Durchgeführt");
    }

    #[test]
    fn excel_serial_dates_become_datetimes() {
        // Serial 45356 is 2024-03-05, the fraction is the time of day
        let data = Data::DateTime(ExcelDateTime::new(
            45356.5,
            ExcelDateTimeType::DateTime,
            false,
        ));
        let cell = convert_cell(&data);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(cell, Cell::DateTime(expected));
        assert_eq!(parse_date(&cell), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(cell.as_text().unwrap(), "05.03.2024");
    }

    #[test]
    fn workbook_numbers_and_text_convert() {
        let int = convert_cell(&Data::Int(7));
        assert_eq!(int, Cell::Number(7.0));
        assert_eq!(int.as_text().unwrap(), "7");
        assert_eq!(parse_date(&int), None);

        assert_eq!(convert_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Text("true".into()));
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(
            convert_cell(&Data::String("gestanzt".into())),
            Cell::Text("gestanzt".into())
        );
    }

    #[test]
    fn iso_datetime_strings_stay_text_and_parse() {
        let cell = convert_cell(&Data::DateTimeIso("2024-03-05T10:00:00".into()));
        assert_eq!(cell, Cell::Text("2024-03-05T10:00:00".into()));
        assert_eq!(parse_date(&cell), NaiveDate::from_ymd_opt(2024, 3, 5));
    }
}
