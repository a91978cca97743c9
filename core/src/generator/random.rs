use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Uniform hazard placement with independently weighted hazard types.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: BoardConfig, catalog: &HazardCatalog) -> Result<Board> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        build_board(config, catalog, &mut rng)
    }
}

/// Fisher-Yates: walk from the last index down to 1, swapping with a uniform index in `[0, i]`.
pub fn shuffle_in_place<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Places `config.hazards` hazards on the first slots of a shuffled index list.
pub fn build_board<R: Rng + ?Sized>(
    config: BoardConfig,
    catalog: &HazardCatalog,
    rng: &mut R,
) -> Result<Board> {
    let config = BoardConfig::new(config.size, config.hazards)?;

    let mut positions: Vec<CellCount> = (0..config.total_cells()).collect();
    shuffle_in_place(&mut positions, rng);

    let hazards: Vec<_> = positions[..usize::from(config.hazards)]
        .iter()
        .map(|&index| {
            let coords = from_linear(index, config.size);
            let hazard = catalog.pick(&mut *rng).clone();
            log::trace!("Placing {} at {:?}", hazard.id, coords);
            (coords, hazard)
        })
        .collect();

    let board = Board::from_hazards(config.size, hazards)?;

    // double check hazard count
    if board.hazard_count() != config.hazards {
        log::warn!(
            "Generated board hazard count mismatch, actual: {}, requested: {}",
            board.hazard_count(),
            config.hazards
        );
    }
    log::debug!(
        "Built {}x{} board with {} hazards",
        config.size,
        config.size,
        board.hazard_count()
    );
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_get_exact_hazard_counts() {
        let catalog = HazardCatalog::builtin();
        for difficulty in Difficulty::ALL {
            let config = difficulty.config();
            for seed in 0..50 {
                let board = RandomBoardGenerator::new(seed)
                    .generate(config, &catalog)
                    .unwrap();

                assert_eq!(board.size(), config.size);
                assert_eq!(board.hazard_cells().count(), usize::from(config.hazards));
                assert_eq!(
                    board.cells().filter(|cell| !cell.has_hazard()).count(),
                    usize::from(config.safe_cells())
                );
            }
        }
    }

    #[test]
    fn adjacency_matches_neighbor_scan() {
        let catalog = HazardCatalog::builtin();
        for seed in 0..20 {
            let board = RandomBoardGenerator::new(seed)
                .generate(Difficulty::Hard.config(), &catalog)
                .unwrap();

            for cell in board.cells() {
                let (row, col) = cell.coords();
                let expected = board
                    .cells()
                    .filter(|other| {
                        let (r, c) = other.coords();
                        other.coords() != cell.coords()
                            && r.abs_diff(row) <= 1
                            && c.abs_diff(col) <= 1
                            && other.has_hazard()
                    })
                    .count();
                assert_eq!(usize::from(cell.adjacent_hazards()), expected);
            }
        }
    }

    #[test]
    fn same_seed_builds_same_board() {
        let catalog = HazardCatalog::builtin();
        let config = Difficulty::Medium.config();

        let a = RandomBoardGenerator::new(7).generate(config, &catalog).unwrap();
        let b = RandomBoardGenerator::new(7).generate(config, &catalog).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut items: Vec<u16> = (0..144).collect();

        shuffle_in_place(&mut items, &mut rng);

        assert_ne!(items, (0..144).collect::<Vec<_>>());
        items.sort_unstable();
        assert_eq!(items, (0..144).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_boards_without_a_safe_cell() {
        let catalog = HazardCatalog::builtin();
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(
            build_board(BoardConfig::new_unchecked(2, 4), &catalog, &mut rng),
            Err(GameError::TooManyHazards)
        );
        let empty = build_board(BoardConfig::new_unchecked(1, 0), &catalog, &mut rng).unwrap();
        assert_eq!(empty.hazard_count(), 0);
    }
}
