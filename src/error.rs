use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelErrorKind {
    Parse,
    Validation,
}

/// Rejection of a level text. Line numbers are 1-based and count the header.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level text is empty")]
    Empty,
    #[error("line 1: expected `<rows> <cols>` as two positive integers, got {found:?}")]
    BadHeader { found: String },
    #[error("line 1: board must be at least {min}x{min}, got {rows}x{cols}")]
    TooSmall { rows: usize, cols: usize, min: usize },
    #[error("expected {expected} rows after the header, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("line {line}: expected {expected} columns, got {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {column}: symbol {symbol:?} is not one of W G P C K o .")]
    BadSymbol {
        line: usize,
        column: usize,
        symbol: char,
    },
    #[error("expected exactly one {what} ({symbol:?}), found {found}")]
    SymbolCount {
        symbol: char,
        what: &'static str,
        found: usize,
    },
}

impl LevelError {
    pub fn kind(&self) -> LevelErrorKind {
        match self {
            LevelError::Empty
            | LevelError::BadHeader { .. }
            | LevelError::TooSmall { .. }
            | LevelError::RowCount { .. }
            | LevelError::RowLength { .. } => LevelErrorKind::Parse,
            LevelError::BadSymbol { .. } | LevelError::SymbolCount { .. } => {
                LevelErrorKind::Validation
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no level is loaded")]
    NoLevel,
    #[error("level is halted after {0}; progression must act first")]
    Halted(&'static str),
    #[error("restart from the first level is only offered after a campaign loss")]
    RestartUnavailable,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    State(#[from] StateError),
}

impl GameError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GameError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid level format ({0}); expected `<rows> <cols>` then rows of W, P, G, C, K, o, .")]
    Invalid(#[from] LevelError),
    #[error("level name {0:?} has no usable characters")]
    InvalidName(String),
    #[error("level name {0:?} is reserved for campaign levels")]
    ReservedName(String),
    #[error("a level named {name:?} already exists; confirm to overwrite")]
    AlreadyExists { name: String, path: PathBuf },
}
