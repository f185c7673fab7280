// src/lib.rs
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod server;
pub mod table;
pub mod technician;


pub use config::{Config, Durations};
pub use error::AppError;
pub use pipeline::{generate_report, ReportParams};
pub use report::{format_time, Report};
pub use table::{parse_table, read_table, RawTable, TableFormat};
