// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dsc_hours_core::{
    generate_report, read_table, report::render_text, server, Config, Durations, ReportParams,
};

#[derive(Parser, Debug)]
#[command(name = "dsc-hours", version, about = "DSC Hour Calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the hour report for a measurement sheet (csv, xlsx, xls, ods)
    Report {
        file: PathBuf,
        /// First day included, YYYY-MM-DD (default: earliest date in the sheet)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day included, YYYY-MM-DD (default: latest date in the sheet)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Minutes per 'gestanzt' measurement
        #[arg(long)]
        t1: Option<u32>,
        /// Minutes per 'sample cutter' measurement
        #[arg(long)]
        t2: Option<u32>,
        /// Minutes per evaluation
        #[arg(long)]
        t3: Option<u32>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the report API over HTTP
    Serve,
}

fn main() -> Result<()> {
    let config = Config::from_env().context("Loading DSC_* configuration failed")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report {
            file,
            start,
            end,
            t1,
            t2,
            t3,
            json,
        } => {
            let durations = Durations::new(
                t1.unwrap_or(config.default_t1),
                t2.unwrap_or(config.default_t2),
                t3.unwrap_or(config.default_t3),
            )?;
            let table = read_table(&file)
                .with_context(|| format!("Reading {} failed", file.display()))?;
            let report = generate_report(
                &table,
                &ReportParams {
                    start,
                    end,
                    durations,
                },
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Command::Serve => {
            info!("Starting report server");
            let runtime = tokio::runtime::Runtime::new().context("Starting tokio runtime failed")?;
            runtime
                .block_on(server::serve(config))
                .context("HTTP server failed")?;
        }
    }
    Ok(())
}
