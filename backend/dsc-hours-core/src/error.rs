// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::error;

// --- Error Handling ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error("The uploaded file must contain a '{0}' column")]
    MissingColumn(String),
    #[error("Start date {start} cannot be after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("Duration {name} must be between 1 and 1440 minutes, got {value}")]
    InvalidDuration { name: &'static str, value: u32 },
    #[error("No row has a parseable date; supply both start and end dates")]
    NoDatedRows,
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet parsing failed: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook contains no worksheets")]
    EmptyWorkbook,
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingColumn(_)
            | AppError::NoDatedRows
            | AppError::Csv(_)
            | AppError::Spreadsheet(_)
            | AppError::EmptyWorkbook => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidDateRange { .. }
            | AppError::InvalidDuration { .. }
            | AppError::InvalidQuery(_)
            | AppError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            AppError::Io(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Map AppError to Axum's IntoResponse
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Error occurred: {}", self);

        let status = self.status_code();
        let message = if status.is_server_error() {
            "Internal server error. Check logs.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
