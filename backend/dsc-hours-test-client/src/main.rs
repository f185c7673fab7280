// src/main.rs

use reqwest::{header, Client};
use serde::Deserialize;
use std::error::Error;

// Response types
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TechnicianTime {
    label: String,
    time: String,
}

#[derive(Debug, Deserialize)]
struct ProjectTime {
    project: String,
    total_time: String,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    start: String,
    end: String,
    technician_times: Vec<TechnicianTime>,
    project_times: Vec<ProjectTime>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let base_url =
        std::env::var("DSC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = Client::new();

    // Test 1: Health check
    println!("\n🔍 Testing health check endpoint...");
    let health_response = client
        .get(format!("{}/health", base_url))
        .send()
        .await?
        .json::<HealthResponse>()
        .await?;

    println!("Health check response: {:?}", health_response);

    // Test 2: Upload a sheet
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            println!("\n⚠️ No sheet given. Usage: dsc-hours-test-client <sheet.csv|sheet.xlsx> [query]");
            return Ok(());
        }
    };
    let query = std::env::args().nth(2).unwrap_or_default();
    let bytes = std::fs::read(&path)?;

    println!("\n🔍 Uploading {} ({} bytes)...", path, bytes.len());
    let response = client
        .post(format!("{}/api/report?{}", base_url, query))
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(bytes)
        .send()
        .await?;

    println!("Report response status: {}", response.status());

    if response.status().is_success() {
        let report = response.json::<ReportResponse>().await?;
        println!("Report for {} to {}", report.start, report.end);
        for row in &report.technician_times {
            println!("  {}: {}", row.label, row.time);
        }
        println!("Projects:");
        for row in &report.project_times {
            println!("  {}: {}", row.project, row.total_time);
        }
    } else {
        let error = response.json::<ErrorResponse>().await?;
        println!("Report failed: {}", error.error);
    }

    // Test 3: Missing date column must be rejected
    println!("\n🔍 Testing rejection of a sheet without 'Datum'...");
    let rejected = client
        .post(format!("{}/api/report?format=csv", base_url))
        .body("Projekt,Probenform\nA,gestanzt\n")
        .send()
        .await?;
    println!("Rejection status: {}", rejected.status());

    println!("\n✅ Testing complete!");

    Ok(())
}
