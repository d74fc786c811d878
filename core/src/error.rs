use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Board was already generated")]
    AlreadyGenerated,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failures while saving or loading a session; the live session is never left half-updated.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed session data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Unsupported session format version {0}")]
    UnsupportedVersion(u32),
    #[error("Inconsistent session data: {0}")]
    Corrupt(String),
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        Self::Corrupt(err.to_string())
    }
}
