use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Active
    }
}

/// Owns one board and applies player moves to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayEngine {
    board: Board,
    safe_remaining: CellCount,
    flagged_count: CellCount,
    state: EngineState,
    triggered_hazard: Option<Coord2>,
}

impl PlayEngine {
    pub fn new(board: Board) -> Self {
        Self {
            safe_remaining: board.safe_cell_count(),
            board,
            flagged_count: 0,
            state: Default::default(),
            triggered_hazard: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn size(&self) -> Coord {
        self.board.size()
    }

    pub fn total_hazards(&self) -> CellCount {
        self.board.hazard_count()
    }

    pub fn safe_remaining(&self) -> CellCount {
        self.safe_remaining
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    /// Display hint only, flags are not checked against the layout.
    pub fn hazards_left_estimate(&self) -> CellCount {
        self.board.hazard_count().saturating_sub(self.flagged_count)
    }

    pub fn triggered_hazard(&self) -> Option<Coord2> {
        self.triggered_hazard
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<&Cell> {
        self.board.cell(coords)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.board.validate_coords(coords)?;

        if self.state.is_finished() || self.board[coords].is_revealed() {
            return Ok(MarkOutcome::NoChange);
        }

        let cell = self.board.cell_mut(coords);
        cell.flagged = !cell.flagged;
        Ok(if cell.flagged {
            self.flagged_count += 1;
            MarkOutcome::Flagged
        } else {
            self.flagged_count -= 1;
            MarkOutcome::Unflagged
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;

        let cell = &self.board[coords];
        if self.state.is_finished() || cell.is_revealed() || cell.is_flagged() {
            return Ok(RevealOutcome::NoChange);
        }

        if let Some(hazard) = cell.hazard().cloned() {
            self.board.cell_mut(coords).revealed = true;
            self.triggered_hazard = Some(coords);
            self.state = EngineState::Lost;
            log::debug!("Hit {} at {:?}", hazard.id, coords);
            return Ok(RevealOutcome::HitHazard { coords, hazard });
        }

        let mut revealed = Vec::new();
        self.reveal_safe_cell(coords, &mut revealed);
        if self.board[coords].adjacent_hazards() == 0 {
            self.flood_reveal(coords, &mut revealed);
        }
        log::debug!(
            "Revealed {} cells from {:?}, {} safe left",
            revealed.len(),
            coords,
            self.safe_remaining
        );

        if self.safe_remaining == 0 {
            self.state = EngineState::Won;
            Ok(RevealOutcome::Won(revealed))
        } else {
            Ok(RevealOutcome::Safe(revealed))
        }
    }

    /// Depth-first expansion over zero-count cells using an explicit stack.
    ///
    /// Flagged and hazard cells are never opened; the `revealed` guard keeps
    /// every cell to a single visit.
    fn flood_reveal(&mut self, origin: Coord2, revealed: &mut Vec<CellDelta>) {
        let mut to_visit = vec![origin];

        while let Some(visit_coords) = to_visit.pop() {
            for pos in self.board.iter_neighbors(visit_coords) {
                let neighbor = &self.board[pos];
                if neighbor.is_revealed() || neighbor.is_flagged() || neighbor.has_hazard() {
                    continue;
                }

                self.reveal_safe_cell(pos, revealed);
                log::trace!("Flood revealed {:?}", pos);

                if self.board[pos].adjacent_hazards() == 0 {
                    to_visit.push(pos);
                }
            }
        }
    }

    fn reveal_safe_cell(&mut self, coords: Coord2, revealed: &mut Vec<CellDelta>) {
        let cell = self.board.cell_mut(coords);
        cell.revealed = true;
        revealed.push(CellDelta {
            coords,
            adjacent_hazards: cell.adjacent_hazards,
        });
        self.safe_remaining = self.safe_remaining.saturating_sub(1);
    }

    /// Uniform pick among safe hidden unflagged cells. Does not reveal anything.
    pub fn pick_hint<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Cell> {
        let candidates: Vec<&Cell> = self
            .board
            .cells()
            .filter(|cell| cell.is_hint_candidate())
            .collect();

        candidates.choose(rng).copied()
    }

    /// Hazard cells, for showing the whole layout once the run is over.
    pub fn hazard_cells(&self) -> impl Iterator<Item = &Cell> {
        self.board.hazard_cells()
    }
}
