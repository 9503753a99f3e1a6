//! # Linear Units
//!
//! Authored models carry their own length unit; the scene displays everything
//! in one global unit. `unit_scale(from, to)` is the multiplicative factor
//! between the two, read from a fixed conversion table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linear length unit of a model or scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitType {
    /// Millimeters
    #[serde(rename = "mm")]
    Millimeters,
    /// Centimeters
    #[serde(rename = "cm")]
    Centimeters,
    /// Meters
    #[default]
    #[serde(rename = "m")]
    Meters,
    /// Inches
    #[serde(rename = "in")]
    Inches,
    /// Feet
    #[serde(rename = "ft")]
    Feet,
    /// Yards
    #[serde(rename = "yd")]
    Yards,
}

impl UnitType {
    /// All units in table order
    pub const ALL: [UnitType; 6] = [
        UnitType::Millimeters,
        UnitType::Centimeters,
        UnitType::Meters,
        UnitType::Inches,
        UnitType::Feet,
        UnitType::Yards,
    ];

    /// Row/column of this unit in the conversion table
    fn table_index(self) -> usize {
        match self {
            UnitType::Millimeters => 0,
            UnitType::Centimeters => 1,
            UnitType::Meters => 2,
            UnitType::Inches => 3,
            UnitType::Feet => 4,
            UnitType::Yards => 5,
        }
    }

    /// Short symbol as used in documents
    pub fn symbol(self) -> &'static str {
        match self {
            UnitType::Millimeters => "mm",
            UnitType::Centimeters => "cm",
            UnitType::Meters => "m",
            UnitType::Inches => "in",
            UnitType::Feet => "ft",
            UnitType::Yards => "yd",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for UnitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitType::ALL
            .iter()
            .copied()
            .find(|u| u.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown unit '{}'", s))
    }
}

/// `UNIT_CONVERSION[from][to]`: multiply a length in `from` units to get `to` units.
const UNIT_CONVERSION: [[f64; 6]; 6] = [
    // mm
    [1.0, 0.1, 0.001, 0.039_370_078_7, 0.003_280_839_9, 0.001_093_613_3],
    // cm
    [10.0, 1.0, 0.01, 0.393_700_787, 0.032_808_399, 0.010_936_133],
    // m
    [1000.0, 100.0, 1.0, 39.370_078_7, 3.280_839_9, 1.093_613_3],
    // in
    [25.4, 2.54, 0.0254, 1.0, 0.083_333_333, 0.027_777_778],
    // ft
    [304.8, 30.48, 0.3048, 12.0, 1.0, 0.333_333_333],
    // yd
    [914.4, 91.44, 0.9144, 36.0, 3.0, 1.0],
];

/// Factor converting lengths authored in `from` units to `to` units
pub fn unit_scale(from: UnitType, to: UnitType) -> f64 {
    UNIT_CONVERSION[from.table_index()][to.table_index()]
}
