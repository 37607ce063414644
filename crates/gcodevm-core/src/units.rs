//! Unit handling
//!
//! G-code programs switch between millimetres (G21) and inches (G20).
//! Machine limits are always configured in millimetres and converted into the
//! program's active units when needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Program length units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimetres (G21)
    Mm,
    /// Inches (G20)
    In,
}

impl Default for Units {
    fn default() -> Self {
        Self::Mm
    }
}

impl Units {
    /// Convert a value from one unit to another
    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        match (from, to) {
            (Units::Mm, Units::In) => value / MM_PER_INCH,
            (Units::In, Units::Mm) => value * MM_PER_INCH,
            _ => value,
        }
    }

    /// Express a millimetre value in these units
    pub fn from_mm(self, value_mm: f64) -> f64 {
        Self::convert(value_mm, Units::Mm, self)
    }

    /// Express a value in these units as millimetres
    pub fn to_mm(self, value: f64) -> f64 {
        Self::convert(value, self, Units::Mm)
    }

    /// The G-code that selects these units
    pub fn gcode(self) -> u8 {
        match self {
            Units::Mm => 21,
            Units::In => 20,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Mm => write!(f, "mm"),
            Units::In => write!(f, "in"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "g21" => Ok(Self::Mm),
            "in" | "inch" | "imperial" | "g20" => Ok(Self::In),
            _ => Err(format!("Unknown units: {}", s)),
        }
    }
}
