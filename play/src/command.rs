use sitesweeper_core::{Coord, Coord2, Difficulty, GameError};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    Hint,
    New(Option<Difficulty>),
    Show,
    Claim { name: String, email: String },
    Leaderboard,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command `{0}`, type `help`")]
    Unknown(String),
    #[error("Expected `<row> <col>`")]
    BadCoords,
    #[error("Name and email are required.")]
    MissingClaimFields,
    #[error(transparent)]
    Difficulty(#[from] GameError),
}

pub const HELP: &str = "\
commands:
  r <row> <col>       scout a tile
  f <row> <col>       toggle a flag
  h                   highlight a safe tile
  n [easy|medium|hard] start a new map
  s                   show the map
  c <name> <email>    claim the last result
  l                   show the leaderboard
  q                   quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Self::Show);
        };

        match verb.to_ascii_lowercase().as_str() {
            "r" | "reveal" => parse_coords(words).map(Self::Reveal),
            "f" | "flag" => parse_coords(words).map(Self::Flag),
            "h" | "hint" => Ok(Self::Hint),
            "n" | "new" => Ok(Self::New(words.next().map(str::parse::<Difficulty>).transpose()?)),
            "s" | "show" => Ok(Self::Show),
            "c" | "claim" => {
                let name = words.next().ok_or(CommandError::MissingClaimFields)?;
                let email = words.next().ok_or(CommandError::MissingClaimFields)?;
                Ok(Self::Claim {
                    name: name.to_owned(),
                    email: email.to_owned(),
                })
            }
            "l" | "leaderboard" => Ok(Self::Leaderboard),
            "?" | "help" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}

fn parse_coords<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<Coord2, CommandError> {
    let mut next = || {
        words
            .next()
            .and_then(|word| word.parse::<Coord>().ok())
            .ok_or(CommandError::BadCoords)
    };
    Ok((next()?, next()?))
}
