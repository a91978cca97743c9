use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Square grid of cells with hazards placed and adjacency counts computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    hazard_count: CellCount,
}

impl Board {
    /// Builds a board from explicit hazard placements.
    ///
    /// Repeated coordinates keep the last hazard given for them.
    pub fn from_hazards<I>(size: Coord, hazards: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Coord2, HazardType)>,
    {
        if size == 0 {
            return Err(GameError::InvalidSize);
        }

        let side = usize::from(size);
        let mut cells = Array2::from_shape_fn((side, side), |(row, col)| {
            Cell::new((row as Coord, col as Coord))
        });

        for (coords, hazard) in hazards {
            if coords.0 >= size || coords.1 >= size {
                return Err(GameError::InvalidCoords);
            }
            cells[coords.to_nd_index()].hazard = Some(hazard);
        }

        let hazard_count = cells.iter().filter(|cell| cell.has_hazard()).count();
        let hazard_count = CellCount::try_from(hazard_count).map_err(|_| GameError::TooManyHazards)?;
        if hazard_count >= square(size) {
            return Err(GameError::TooManyHazards);
        }

        let mut board = Self {
            cells,
            hazard_count,
        };
        board.count_adjacent_hazards();
        Ok(board)
    }

    fn count_adjacent_hazards(&mut self) {
        let size = self.size();
        for row in 0..size {
            for col in 0..size {
                let coords = (row, col);
                // at most 8 neighbors
                let count = self
                    .iter_neighbors(coords)
                    .filter(|&pos| self[pos].has_hazard())
                    .count() as u8;
                self.cell_mut(coords).adjacent_hazards = count;
            }
        }
    }

    pub fn config(&self) -> BoardConfig {
        BoardConfig::new_unchecked(self.size(), self.hazard_count)
    }

    /// Side length.
    pub fn size(&self) -> Coord {
        Coord::try_from(self.cells.nrows()).unwrap_or(Coord::MAX)
    }

    pub fn hazard_count(&self) -> CellCount {
        self.hazard_count
    }

    pub fn total_cells(&self) -> CellCount {
        square(self.size())
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.hazard_count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size && coords.1 < size {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell(&self, coords: Coord2) -> Result<&Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(&self[coords])
    }

    pub(crate) fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn hazard_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells().filter(|cell| cell.has_hazard())
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
