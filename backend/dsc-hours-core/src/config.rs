// src/config.rs
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// --- Configuration & Constants ---

pub const DEFAULT_PUNCHED_MINUTES: u32 = 5;
pub const DEFAULT_SAMPLE_CUTTER_MINUTES: u32 = 10;
pub const DEFAULT_EVALUATION_MINUTES: u32 = 15;
/// Upper bound for any single duration: one full day.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const ENV_PREFIX: &str = "DSC_";

/// Per-row minutes charged for each activity.
///
/// `punched` (T1) and `sample_cutter` (T2) are measurement times chosen by the
/// sample form; `evaluation` (T3) is charged flat for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub punched: u32,
    pub sample_cutter: u32,
    pub evaluation: u32,
}

impl Durations {
    pub fn new(punched: u32, sample_cutter: u32, evaluation: u32) -> Result<Self, AppError> {
        for (name, value) in [
            ("T1 (gestanzt)", punched),
            ("T2 (sample cutter)", sample_cutter),
            ("T3 (evaluation)", evaluation),
        ] {
            if value == 0 || value > MAX_DURATION_MINUTES {
                return Err(AppError::InvalidDuration { name, value });
            }
        }
        Ok(Self {
            punched,
            sample_cutter,
            evaluation,
        })
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            punched: DEFAULT_PUNCHED_MINUTES,
            sample_cutter: DEFAULT_SAMPLE_CUTTER_MINUTES,
            evaluation: DEFAULT_EVALUATION_MINUTES,
        }
    }
}

// Service configuration, read from DSC_* environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_t1")]
    pub default_t1: u32,
    #[serde(default = "default_t2")]
    pub default_t2: u32,
    #[serde(default = "default_t3")]
    pub default_t3: u32,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Ok(envy::prefixed(ENV_PREFIX).from_env::<Config>()?)
    }

    /// Default durations for runs that don't override them.
    pub fn durations(&self) -> Result<Durations, AppError> {
        Durations::new(self.default_t1, self.default_t2, self.default_t3)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            default_t1: default_t1(),
            default_t2: default_t2(),
            default_t3: default_t3(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_t1() -> u32 {
    DEFAULT_PUNCHED_MINUTES
}

fn default_t2() -> u32 {
    DEFAULT_SAMPLE_CUTTER_MINUTES
}

fn default_t3() -> u32 {
    DEFAULT_EVALUATION_MINUTES
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}
