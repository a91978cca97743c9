use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Closing lines shown after a cleared map.
pub const WIN_MESSAGES: [&str; 3] = [
    "Site is clear, paperwork approved, pour the slab!",
    "No surprises! Call procurement and start lining up trades.",
    "Survey team cheered—this parcel is restaurant-ready.",
];

pub const WIN_OUTCOME: &str = "Completed map";

#[derive(Clone, Debug, PartialEq)]
pub enum TerminalKind {
    Win,
    Loss(HazardType),
}

impl TerminalKind {
    pub const fn is_win(&self) -> bool {
        matches!(self, Self::Win)
    }
}

/// Summary of a finished session, handed to score submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub difficulty_id: String,
    pub difficulty_label: String,
    pub won: bool,
    pub outcome: String,
    /// Win flavor text or the hazard's loss message.
    pub message: String,
    pub hazard_label: Option<String>,
    pub hazard_icon: Option<String>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// One run on one board, from creation until its result is taken.
///
/// Starting a new game means dropping the old session and building a new one.
#[derive(Clone, Debug)]
pub struct GameSession {
    difficulty: Difficulty,
    engine: PlayEngine,
    started_at: DateTime<Utc>,
    rng: SmallRng,
    finished: bool,
}

impl GameSession {
    pub fn new(difficulty_id: &str) -> Result<Self> {
        let difficulty = difficulty_id.parse()?;
        Self::with_seed(difficulty, rand::random(), Utc::now())
    }

    /// Reproducible session: the same seed builds the same board and hint sequence.
    pub fn with_seed(difficulty: Difficulty, seed: u64, started_at: DateTime<Utc>) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = build_board(difficulty.config(), &HazardCatalog::builtin(), &mut rng)?;
        log::debug!("New {} session, seed {:#x}", difficulty.id(), seed);
        Ok(Self::from_parts(difficulty, board, rng, started_at))
    }

    /// Session over a prepared board, mostly for fixed layouts.
    pub fn from_board(difficulty: Difficulty, board: Board, seed: u64, started_at: DateTime<Utc>) -> Self {
        Self::from_parts(difficulty, board, SmallRng::seed_from_u64(seed), started_at)
    }

    fn from_parts(difficulty: Difficulty, board: Board, rng: SmallRng, started_at: DateTime<Utc>) -> Self {
        Self {
            difficulty,
            engine: PlayEngine::new(board),
            started_at,
            rng,
            finished: false,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn engine(&self) -> &PlayEngine {
        &self.engine
    }

    pub fn board(&self) -> &Board {
        self.engine.board()
    }

    pub fn safe_tiles_remaining(&self) -> CellCount {
        self.engine.safe_remaining()
    }

    pub fn flagged_count(&self) -> CellCount {
        self.engine.flagged_count()
    }

    pub fn hazards_left_estimate(&self) -> CellCount {
        self.engine.hazards_left_estimate()
    }

    pub fn is_over(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_milliseconds()).unwrap_or(0)
    }

    /// Terminal condition derived from the engine state.
    pub fn terminal(&self) -> Option<TerminalKind> {
        match self.engine.state() {
            EngineState::Active => None,
            EngineState::Won => Some(TerminalKind::Win),
            EngineState::Lost => self
                .engine
                .triggered_hazard()
                .and_then(|coords| self.board()[coords].hazard().cloned())
                .map(TerminalKind::Loss),
        }
    }

    pub fn apply_reveal(&mut self, coords: Coord2) -> Result<(RevealOutcome, Option<TerminalKind>)> {
        let outcome = self.engine.reveal(coords)?;
        let terminal = match &outcome {
            RevealOutcome::HitHazard { hazard, .. } => Some(TerminalKind::Loss(hazard.clone())),
            RevealOutcome::Won(_) => Some(TerminalKind::Win),
            RevealOutcome::NoChange | RevealOutcome::Safe(_) => None,
        };
        if let Some(terminal) = &terminal {
            log::debug!(
                "Session over ({}), {} safe tiles left",
                if terminal.is_win() { "win" } else { "loss" },
                self.safe_tiles_remaining()
            );
        }
        Ok((outcome, terminal))
    }

    pub fn apply_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.engine.toggle_flag(coords)
    }

    /// Random safe hidden cell, none once the session is over.
    pub fn pick_hint(&mut self) -> Option<Coord2> {
        if self.is_over() {
            return None;
        }
        self.engine.pick_hint(&mut self.rng).map(Cell::coords)
    }

    pub fn finish(&mut self, terminal: &TerminalKind) -> Result<ResultRecord> {
        self.finish_at(terminal, Utc::now())
    }

    /// Produces the single result record of this session.
    pub fn finish_at(&mut self, terminal: &TerminalKind, now: DateTime<Utc>) -> Result<ResultRecord> {
        if self.finished {
            return Err(GameError::AlreadyFinished);
        }
        let Some(actual) = self.terminal() else {
            return Err(GameError::NotFinished);
        };
        if *terminal != actual {
            return Err(GameError::TerminalMismatch);
        }
        self.finished = true;

        let (outcome, message, hazard_label, hazard_icon) = match terminal {
            TerminalKind::Win => {
                let message = WIN_MESSAGES
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(WIN_MESSAGES[0]);
                (WIN_OUTCOME.to_owned(), message.to_owned(), None, None)
            }
            TerminalKind::Loss(hazard) => (
                format!("Hit {}", hazard.label),
                hazard.loss_message.clone(),
                Some(hazard.label.clone()),
                Some(hazard.icon.clone()),
            ),
        };

        Ok(ResultRecord {
            difficulty_id: self.difficulty.id().to_owned(),
            difficulty_label: self.difficulty.label().to_owned(),
            won: terminal.is_win(),
            outcome,
            message,
            hazard_label,
            hazard_icon,
            duration_ms: self.elapsed_ms(now),
            finished_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(0).unwrap()
    }

    fn fixed_session(hazards: &[(Coord2, &str)]) -> GameSession {
        let catalog = HazardCatalog::builtin();
        let board = Board::from_hazards(
            8,
            hazards
                .iter()
                .map(|&(pos, id)| (pos, catalog.get(id).unwrap().clone())),
        )
        .unwrap();
        GameSession::from_board(Difficulty::Easy, board, 0, t0())
    }

    fn zero_cell(session: &GameSession) -> Option<Coord2> {
        session
            .board()
            .cells()
            .find(|cell| !cell.has_hazard() && cell.adjacent_hazards() == 0)
            .map(Cell::coords)
    }

    #[test]
    fn new_session_starts_clean() {
        let session = GameSession::new("easy").unwrap();

        assert!(!session.is_over());
        assert_eq!(session.difficulty(), Difficulty::Easy);
        assert_eq!(session.safe_tiles_remaining(), 64 - 10);
        assert_eq!(session.flagged_count(), 0);
        assert_eq!(session.hazards_left_estimate(), 10);
        assert!(session.terminal().is_none());
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        assert_eq!(
            GameSession::new("extreme").unwrap_err(),
            GameError::UnknownDifficulty("extreme".into())
        );
    }

    #[test]
    fn revealing_zero_cell_floods_easy_board() {
        for seed in 0..20 {
            let mut session = GameSession::with_seed(Difficulty::Easy, seed, t0()).unwrap();
            let Some(start) = zero_cell(&session) else {
                continue;
            };
            let before = session.safe_tiles_remaining();

            let (outcome, _) = session.apply_reveal(start).unwrap();

            let opened = outcome.revealed().len();
            assert!(opened > 1);
            assert_eq!(usize::from(before - session.safe_tiles_remaining()), opened);
        }
    }

    #[test]
    fn safe_counter_drops_by_newly_revealed_cells() {
        let mut session = GameSession::with_seed(Difficulty::Medium, 42, t0()).unwrap();
        let coords: Vec<Coord2> = session.board().cells().map(Cell::coords).collect();

        for pos in coords {
            let before = session.safe_tiles_remaining();
            let (outcome, terminal) = session.apply_reveal(pos).unwrap();
            let newly = before - session.safe_tiles_remaining();

            assert_eq!(usize::from(newly), outcome.revealed().len());
            if terminal.is_some() {
                break;
            }
        }
    }

    #[test]
    fn revealing_every_safe_cell_wins() {
        let mut session = GameSession::with_seed(Difficulty::Easy, 9, t0()).unwrap();
        let safe: Vec<Coord2> = session
            .board()
            .cells()
            .filter(|cell| !cell.has_hazard())
            .map(Cell::coords)
            .collect();

        let mut last = None;
        for pos in safe {
            let (_, terminal) = session.apply_reveal(pos).unwrap();
            if terminal.is_some() {
                last = terminal;
            }
        }

        assert_eq!(last, Some(TerminalKind::Win));
        assert_eq!(session.safe_tiles_remaining(), 0);
        assert!(session.is_over());

        let record = session
            .finish_at(&TerminalKind::Win, t0() + TimeDelta::milliseconds(83_500))
            .unwrap();
        assert!(record.won);
        assert_eq!(record.hazard_label, None);
        assert_eq!(record.hazard_icon, None);
        assert_eq!(record.outcome, WIN_OUTCOME);
        assert!(WIN_MESSAGES.contains(&record.message.as_str()));
        assert_eq!(record.duration_ms, 83_500);
        assert_eq!(record.difficulty_id, "easy");
    }

    #[test]
    fn revealing_hazard_loses_with_its_details() {
        let mut session = fixed_session(&[((3, 3), "beer"), ((0, 7), "kfc")]);

        let (_, terminal) = session.apply_reveal((3, 3)).unwrap();

        let beer = HazardCatalog::builtin().get("beer").unwrap().clone();
        assert_eq!(terminal, Some(TerminalKind::Loss(beer.clone())));
        assert_eq!(session.terminal(), Some(TerminalKind::Loss(beer.clone())));
        assert_eq!(session.pick_hint(), None);

        let record = session.finish_at(&TerminalKind::Loss(beer), t0()).unwrap();
        assert!(!record.won);
        assert_eq!(record.hazard_label.as_deref(), Some("Beer truck block party"));
        assert_eq!(record.hazard_icon.as_deref(), Some("🍺"));
        assert_eq!(record.outcome, "Hit Beer truck block party");
        assert_eq!(record.duration_ms, 0);
    }

    #[test]
    fn win_and_loss_are_exclusive() {
        let mut session = fixed_session(&[((0, 0), "rain")]);

        let (_, terminal) = session.apply_reveal((7, 7)).unwrap();
        assert_eq!(terminal, Some(TerminalKind::Win));

        let (outcome, terminal) = session.apply_reveal((0, 0)).unwrap();
        assert_eq!(outcome, RevealOutcome::NoChange);
        assert_eq!(terminal, None);
        assert_eq!(session.terminal(), Some(TerminalKind::Win));
    }

    #[test]
    fn result_is_produced_at_most_once() {
        let mut session = fixed_session(&[((0, 0), "rain")]);
        assert_eq!(
            session.finish_at(&TerminalKind::Win, t0()),
            Err(GameError::NotFinished)
        );

        session.apply_reveal((7, 7)).unwrap();

        assert!(session.finish_at(&TerminalKind::Win, t0()).is_ok());
        assert_eq!(
            session.finish_at(&TerminalKind::Win, t0()),
            Err(GameError::AlreadyFinished)
        );
    }

    #[test]
    fn result_must_match_actual_outcome() {
        let mut session = fixed_session(&[((0, 0), "rain")]);
        session.apply_reveal((0, 0)).unwrap();

        assert_eq!(
            session.finish_at(&TerminalKind::Win, t0()),
            Err(GameError::TerminalMismatch)
        );

        let rain = HazardCatalog::builtin().get("rain").unwrap().clone();
        let record = session.finish_at(&TerminalKind::Loss(rain), t0()).unwrap();
        assert!(!record.won);
        assert_eq!(record.hazard_label.as_deref(), Some("Rain storm"));
        assert_eq!(record.outcome, "Hit Rain storm");
    }

    #[test]
    fn flag_has_no_terminal_effect() {
        let mut session = fixed_session(&[((0, 0), "rain")]);

        assert_eq!(session.apply_flag((0, 0)).unwrap(), MarkOutcome::Flagged);
        assert_eq!(session.hazards_left_estimate(), 0);
        assert!(!session.is_over());
        assert_eq!(session.apply_reveal((0, 0)).unwrap().1, None);
    }

    #[test]
    fn hint_points_at_safe_hidden_cell() {
        let mut session = GameSession::with_seed(Difficulty::Hard, 5, t0()).unwrap();

        let hint = session.pick_hint().unwrap();

        assert!(session.board()[hint].is_hint_candidate());
    }

    #[test]
    fn record_serializes_camel_case() {
        let mut session = fixed_session(&[((0, 0), "rain")]);
        session.apply_reveal((7, 7)).unwrap();
        let record = session.finish_at(&TerminalKind::Win, t0()).unwrap();

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["difficultyId"], "easy");
        assert_eq!(json["durationMs"], 0);
        assert!(json["hazardLabel"].is_null());
    }
}
