// src/server.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, Durations};
use crate::error::AppError;
use crate::pipeline::{generate_report, ReportParams};
use crate::report::Report;
use crate::table::{parse_table, TableFormat};

// Application state with config
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

// Query parameters for POST /api/report
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub t1: Option<u32>,
    pub t2: Option<u32>,
    pub t3: Option<u32>,
    pub format: Option<String>,
}

impl ReportQuery {
    fn params(&self, config: &Config) -> Result<ReportParams, AppError> {
        let durations = Durations::new(
            self.t1.unwrap_or(config.default_t1),
            self.t2.unwrap_or(config.default_t2),
            self.t3.unwrap_or(config.default_t3),
        )?;
        Ok(ReportParams {
            start: self.start,
            end: self.end,
            durations,
        })
    }

    fn table_format(&self, body: &[u8]) -> Result<TableFormat, AppError> {
        match &self.format {
            Some(name) => {
                TableFormat::from_name(name).ok_or_else(|| AppError::UnsupportedFormat(name.clone()))
            }
            None => Ok(TableFormat::sniff(body)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/api/report", post(create_report))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<(), AppError> {
    let addr = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
    };
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Report>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::InvalidQuery(rejection.body_text()))?;
    info!("Handling /api/report upload of {} bytes", body.len());
    let params = query.params(&state.config)?;
    let format = query.table_format(&body)?;

    // Parsing and aggregation are CPU-bound; keep them off the async workers
    let report = tokio::task::spawn_blocking(move || {
        let table = parse_table(body.to_vec(), format)?;
        generate_report(&table, &params)
    })
    .await
    .map_err(|e| AppError::Internal(format!("report task failed: {}", e)))??;

    info!(
        "Report built: {} filtered rows, {} projects",
        report.filtered.rows.len(),
        report.project_times.len()
    );
    Ok(Json(report))
}
