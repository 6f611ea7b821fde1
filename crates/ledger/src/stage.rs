//! Unit lifecycle stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a unit in the fixed lifecycle.
///
/// Stages are totally ordered and integer-encoded `0..=5`. `Ordered` is the
/// only initial stage and `Sold` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Stage {
    Ordered = 0,
    RawMaterialSupplied = 1,
    Manufactured = 2,
    Distributed = 3,
    Retailed = 4,
    Sold = 5,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Ordered,
        Stage::RawMaterialSupplied,
        Stage::Manufactured,
        Stage::Distributed,
        Stage::Retailed,
        Stage::Sold,
    ];

    /// Integer encoding of the stage.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// The stage that follows this one, or `None` for `Sold`.
    pub fn next(self) -> Option<Self> {
        Self::from_code(self.code() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Sold
    }

    /// Display label used by provenance views.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Ordered => "Unit Ordered",
            Stage::RawMaterialSupplied => "Raw Material Supply Stage",
            Stage::Manufactured => "Manufacturing Stage",
            Stage::Distributed => "Distribution Stage",
            Stage::Retailed => "Retail Stage",
            Stage::Sold => "Unit Sold",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ordered => "Ordered",
            Stage::RawMaterialSupplied => "RawMaterialSupplied",
            Stage::Manufactured => "Manufactured",
            Stage::Distributed => "Distributed",
            Stage::Retailed => "Retailed",
            Stage::Sold => "Sold",
        };
        f.write_str(name)
    }
}
