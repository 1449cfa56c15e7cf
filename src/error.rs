use thiserror::Error;
use crate::board::Color;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 4 to 6 FEN fields, found {0}")]
    FieldCount(usize),
    #[error("bad piece placement: {0}")]
    Placement(String),
    #[error("bad side to move: {0}")]
    Side(String),
    #[error("bad castling field: {0}")]
    Castling(String),
    #[error("bad en passant field: {0}")]
    EnPassant(String),
    #[error("bad move clock: {0}")]
    Clock(String),
    #[error("{0:?} must have exactly one king")]
    King(Color),
    #[error("side not to move is in check")]
    OpponentInCheck,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("malformed move text: {0}")]
    Malformed(String),
    #[error("illegal move {0} in current position")]
    Illegal(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("{name}={value} outside [{min}, {max}]")]
    OutOfRange { name: String, value: i32, min: i32, max: i32 },
    #[error("{0} must be at least 1")]
    NotPositive(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to build search thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("opening line {line:?}: {source}")]
    Line { line: String, source: MoveError },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
