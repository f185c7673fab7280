// src/technician.rs
use serde::Serialize;
use std::{fmt, ops::Index};

/// The technicians who run the DSC instrument.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Technician {
    MH,
    AK,
    HD,
}

impl Technician {
    pub const ALL: [Technician; 3] = [Technician::MH, Technician::AK, Technician::HD];

    /// Exact code lookup; anything else is not one of ours.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MH" => Some(Technician::MH),
            "AK" => Some(Technician::AK),
            "HD" => Some(Technician::HD),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Technician::MH => "MH",
            Technician::AK => "AK",
            Technician::HD => "HD",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Technician {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Activity {
    Measurement,
    Evaluation,
}

impl Activity {
    pub const ALL: [Activity; 2] = [Activity::Measurement, Activity::Evaluation];

    /// Column label used in the lab sheet.
    pub fn label(self) -> &'static str {
        match self {
            Activity::Measurement => "Messung",
            Activity::Evaluation => "Auswertung",
        }
    }
}

/// One counter per recognized technician.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerTechnician([u64; 3]);

impl PerTechnician {
    pub fn add(&mut self, technician: Technician, amount: u64) {
        self.0[technician.slot()] += amount;
    }

    /// Adds to the slot for `code` and reports whether the code was recognized.
    pub fn add_code(&mut self, code: &str, amount: u64) -> bool {
        match Technician::from_code(code) {
            Some(technician) => {
                self.add(technician, amount);
                true
            }
            None => false,
        }
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl Index<Technician> for PerTechnician {
    type Output = u64;

    fn index(&self, technician: Technician) -> &u64 {
        &self.0[technician.slot()]
    }
}
