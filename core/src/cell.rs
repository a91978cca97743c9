use serde::{Deserialize, Serialize};

use crate::*;

/// One grid position. Only the engine mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) coords: Coord2,
    pub(crate) hazard: Option<HazardType>,
    pub(crate) adjacent_hazards: u8,
    pub(crate) revealed: bool,
    pub(crate) flagged: bool,
}

impl Cell {
    pub(crate) const fn new(coords: Coord2) -> Self {
        Self {
            coords,
            hazard: None,
            adjacent_hazards: 0,
            revealed: false,
            flagged: false,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        self.coords
    }

    pub const fn row(&self) -> Coord {
        self.coords.0
    }

    pub const fn col(&self) -> Coord {
        self.coords.1
    }

    pub fn hazard(&self) -> Option<&HazardType> {
        self.hazard.as_ref()
    }

    pub const fn has_hazard(&self) -> bool {
        self.hazard.is_some()
    }

    pub const fn adjacent_hazards(&self) -> u8 {
        self.adjacent_hazards
    }

    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Safe, still hidden and not flagged: a valid hint target.
    pub const fn is_hint_candidate(&self) -> bool {
        !self.has_hazard() && !self.revealed && !self.flagged
    }

    /// What the player is allowed to see of this cell.
    pub fn view(&self) -> CellView<'_> {
        match (self.revealed, self.flagged, &self.hazard) {
            (true, _, Some(hazard)) => CellView::Hazard(hazard),
            (true, _, None) => CellView::Safe(self.adjacent_hazards),
            (false, true, _) => CellView::Flagged,
            (false, false, _) => CellView::Hidden,
        }
    }
}

/// Player-visible projection of a [`Cell`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CellView<'a> {
    Hidden,
    Flagged,
    Safe(u8),
    Hazard(&'a HazardType),
}
