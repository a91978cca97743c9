use core::fmt::Write;
use sitesweeper_core::{Board, CellView, Coord2, GameSession};
use sitesweeper_protocol::{LEADERBOARD_LIMIT, ScoreEntry, sort_by_duration};

/// Per-cell glyph. Hazards stay hidden until they are revealed or `show_hazards` is set.
fn glyph(board: &Board, coords: Coord2, hint: Option<Coord2>, show_hazards: bool) -> char {
    let cell = &board[coords];
    if show_hazards && cell.has_hazard() && !cell.is_revealed() {
        return '*';
    }
    match cell.view() {
        CellView::Hidden if hint == Some(coords) => '?',
        CellView::Hidden => '#',
        CellView::Flagged => 'F',
        CellView::Safe(0) => '.',
        CellView::Safe(count) => char::from(b'0' + count),
        CellView::Hazard(_) => 'X',
    }
}

pub fn render_board(board: &Board, hint: Option<Coord2>, show_hazards: bool) -> String {
    let size = board.size();
    let mut out = String::from("    ");
    for col in 0..size {
        let _ = write!(out, "{:>3}", col);
    }
    out.push('\n');
    for row in 0..size {
        let _ = write!(out, "{:>3} ", row);
        for col in 0..size {
            let _ = write!(out, "{:>3}", glyph(board, (row, col), hint, show_hazards));
        }
        out.push('\n');
    }
    out
}

pub fn status_line(session: &GameSession) -> String {
    format!(
        "{} | safe tiles left: {} | hazards left: {}",
        session.difficulty(),
        session.safe_tiles_remaining(),
        session.hazards_left_estimate()
    )
}

pub fn render_leaderboard(entries: &[ScoreEntry]) -> String {
    if entries.is_empty() {
        return "No claimed scores yet. Be the first builder on the board.".to_owned();
    }

    let mut sorted = entries.to_vec();
    sort_by_duration(&mut sorted);

    let mut out = String::from("Recent best scouting times across all builders.\n");
    for (rank, entry) in sorted.iter().take(LEADERBOARD_LIMIT).enumerate() {
        let name = if entry.name.is_empty() {
            "Unknown Builder"
        } else {
            entry.name.as_str()
        };
        let difficulty = if entry.difficulty_label.is_empty() {
            entry.difficulty.as_str()
        } else {
            entry.difficulty_label.as_str()
        };
        let _ = write!(
            out,
            "{:>2}. {} — {} — {}",
            rank + 1,
            name,
            entry.display_duration(),
            difficulty
        );
        if !entry.outcome.is_empty() {
            let _ = write!(out, " ({})", entry.outcome);
        }
        out.push('\n');
    }
    out
}
