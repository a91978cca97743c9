use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board size must be at least 1")]
    InvalidSize,
    #[error("Too many hazards, at least one cell must stay safe")]
    TooManyHazards,
    #[error("Hazard catalog is empty")]
    EmptyHazardCatalog,
    #[error("Hazard weight must be positive and finite")]
    InvalidHazardWeight,
    #[error("Unknown difficulty `{0}`")]
    UnknownDifficulty(String),
    #[error("Session is still in progress")]
    NotFinished,
    #[error("Terminal outcome does not match the session")]
    TerminalMismatch,
    #[error("Session already produced its result")]
    AlreadyFinished,
}

pub type Result<T> = core::result::Result<T, GameError>;
