use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use difficulty::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use hazard::*;
pub use session::*;
pub use types::*;

mod board;
mod cell;
mod difficulty;
mod engine;
mod error;
mod generator;
mod hazard;
mod session;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub size: Coord,
    pub hazards: CellCount,
}

impl BoardConfig {
    pub const fn new_unchecked(size: Coord, hazards: CellCount) -> Self {
        Self { size, hazards }
    }

    pub fn new(size: Coord, hazards: CellCount) -> Result<Self> {
        if size == 0 {
            return Err(GameError::InvalidSize);
        }
        if hazards >= square(size) {
            return Err(GameError::TooManyHazards);
        }
        Ok(Self::new_unchecked(size, hazards))
    }

    pub const fn total_cells(&self) -> CellCount {
        square(self.size)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.hazards)
    }
}

/// A safe cell that became revealed during one engine call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDelta {
    pub coords: Coord2,
    pub adjacent_hazards: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Flagged,
    Unflagged,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    /// New flag state of the cell, if it changed.
    pub const fn flagged(self) -> Option<bool> {
        match self {
            Self::NoChange => None,
            Self::Flagged => Some(true),
            Self::Unflagged => Some(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    /// Safe cells were revealed, the run continues.
    Safe(Vec<CellDelta>),
    HitHazard {
        coords: Coord2,
        hazard: HazardType,
    },
    /// Safe cells were revealed and none are left hidden.
    Won(Vec<CellDelta>),
}

impl RevealOutcome {
    pub const fn has_update(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::HitHazard { .. } | Self::Won(_))
    }

    /// Safe cells revealed by the call, empty for no-ops and hazard hits.
    pub fn revealed(&self) -> &[CellDelta] {
        match self {
            Self::Safe(cells) | Self::Won(cells) => cells,
            Self::NoChange | Self::HitHazard { .. } => &[],
        }
    }
}
