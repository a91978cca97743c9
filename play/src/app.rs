use sitesweeper_core::{
    Coord2, Difficulty, GameSession, MarkOutcome, ResultRecord, RevealOutcome, TerminalKind,
};
use sitesweeper_server::{ScoreClient, SubmissionState, SubmissionTask, claim_submission};
use std::time::{Duration, Instant};

use crate::command::{Command, HELP};
use crate::view;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Hint {
    coords: Coord2,
    shown_at: Instant,
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue(Vec<String>),
    ShowLeaderboard(Vec<String>),
    Quit,
}

/// Terminal front end: owns the current session and one pending claim.
pub struct App {
    session: GameSession,
    seed: Option<u64>,
    games_started: u64,
    hint: Option<Hint>,
    hint_duration: Duration,
    result: Option<ResultRecord>,
    claim: Option<SubmissionTask>,
    client: ScoreClient,
}

impl App {
    pub fn new(
        difficulty: Difficulty,
        seed: Option<u64>,
        client: ScoreClient,
        hint_duration: Duration,
    ) -> anyhow::Result<Self> {
        let session = Self::start_session(difficulty, seed)?;
        Ok(Self {
            session,
            seed,
            games_started: 1,
            hint: None,
            hint_duration,
            result: None,
            claim: None,
            client,
        })
    }

    fn start_session(difficulty: Difficulty, seed: Option<u64>) -> anyhow::Result<GameSession> {
        Ok(match seed {
            Some(seed) => GameSession::with_seed(difficulty, seed, chrono::Utc::now())?,
            None => GameSession::new(difficulty.id())?,
        })
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn client(&self) -> &ScoreClient {
        &self.client
    }

    fn new_game(&mut self, difficulty: Difficulty) -> anyhow::Result<()> {
        let seed = self.seed.map(|seed| seed.wrapping_add(self.games_started));
        self.session = Self::start_session(difficulty, seed)?;
        self.games_started += 1;
        self.hint = None;
        self.result = None;
        Ok(())
    }

    /// Highlighted cell while its display window lasts.
    fn active_hint(&self, now: Instant) -> Option<Coord2> {
        self.hint
            .filter(|hint| now.duration_since(hint.shown_at) < self.hint_duration)
            .map(|hint| hint.coords)
    }

    fn hint_available(&self, now: Instant) -> bool {
        !self.session.is_over() && self.active_hint(now).is_none()
    }

    pub fn render(&self, now: Instant) -> String {
        let over = self.session.is_over();
        let hint = if over { None } else { self.active_hint(now) };
        format!(
            "{}{}",
            view::render_board(self.session.board(), hint, over),
            view::status_line(&self.session)
        )
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> anyhow::Result<Flow> {
        let messages = match command {
            Command::Reveal(coords) => self.reveal(coords, now)?,
            Command::Flag(coords) => self.flag(coords, now)?,
            Command::Hint => self.show_hint(now),
            Command::New(difficulty) => {
                self.new_game(difficulty.unwrap_or(self.session.difficulty()))?;
                vec!["Tap a tile to scout it!".to_owned(), self.render(now)]
            }
            Command::Show => vec![self.render(now)],
            Command::Claim { name, email } => self.claim(&name, &email),
            Command::Leaderboard => return Ok(Flow::ShowLeaderboard(Vec::new())),
            Command::Help => vec![HELP.to_owned()],
            Command::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(messages))
    }

    fn reveal(&mut self, coords: Coord2, now: Instant) -> anyhow::Result<Vec<String>> {
        let (outcome, terminal) = self.session.apply_reveal(coords)?;
        if let RevealOutcome::NoChange = outcome {
            return Ok(vec!["Nothing to scout there.".to_owned()]);
        }
        let mut messages = vec![self.render(now)];
        if let Some(terminal) = terminal {
            messages.extend(self.end_game(&terminal)?);
        }
        Ok(messages)
    }

    fn end_game(&mut self, terminal: &TerminalKind) -> anyhow::Result<Vec<String>> {
        self.hint = None;
        let record = self.session.finish(terminal)?;
        let headline = match terminal {
            TerminalKind::Win => "🛠️ All clear! Time to break ground on restaurants.".to_owned(),
            TerminalKind::Loss(hazard) => format!("{} {}", hazard.icon, hazard.label),
        };
        let messages = vec![
            headline,
            record.message.clone(),
            "Claim your score and compare it with other builders: c <name> <email>".to_owned(),
        ];
        self.result = Some(record);
        Ok(messages)
    }

    fn flag(&mut self, coords: Coord2, now: Instant) -> anyhow::Result<Vec<String>> {
        Ok(match self.session.apply_flag(coords)? {
            MarkOutcome::NoChange => vec!["Can't flag that tile.".to_owned()],
            MarkOutcome::Flagged | MarkOutcome::Unflagged => vec![self.render(now)],
        })
    }

    fn show_hint(&mut self, now: Instant) -> Vec<String> {
        if !self.hint_available(now) {
            return vec!["No hint right now.".to_owned()];
        }
        match self.session.pick_hint() {
            Some(coords) => {
                self.hint = Some(Hint {
                    coords,
                    shown_at: now,
                });
                vec![
                    format!("Try row {}, col {}.", coords.0, coords.1),
                    self.render(now),
                ]
            }
            None => vec!["No safe tiles left to hint.".to_owned()],
        }
    }

    fn claim(&mut self, name: &str, email: &str) -> Vec<String> {
        let Some(record) = &self.result else {
            return vec!["Finish a map before claiming a score.".to_owned()];
        };
        if self
            .claim
            .as_ref()
            .is_some_and(|task| task.state().is_pending())
        {
            return vec!["Saving...".to_owned()];
        }

        let submission = claim_submission(record, name, email);
        if let Err(err) = submission.validate() {
            return vec![err.to_string()];
        }
        self.claim = Some(SubmissionTask::spawn(self.client.clone(), submission));
        vec!["Saving...".to_owned()]
    }

    /// Reports a claim that finished since the last poll.
    pub fn poll_claim(&mut self) -> Option<Flow> {
        let state = self.claim.as_ref()?.state();
        match state {
            SubmissionState::Pending => None,
            SubmissionState::Succeeded(entry) => {
                self.claim = None;
                self.result = None;
                Some(Flow::ShowLeaderboard(vec![format!(
                    "Saved {} in {}.",
                    entry.name, entry.pretty_duration
                )]))
            }
            SubmissionState::Failed(reason) => {
                self.claim = None;
                log::debug!("Claim failed: {}", reason);
                Some(Flow::Continue(vec![
                    "Could not save score. Make sure the server is running, then claim again."
                        .to_owned(),
                ]))
            }
        }
    }
}
