//! Error types shared by the tree model, the loader and the solvers.

use thiserror::Error;

use crate::cfr::config::ConfigError;

/// Errors raised while building, loading or analysing a game.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A node does not satisfy the tree invariants.
    #[error("invalid tree structure at {path}: {reason}")]
    InvalidStructure {
        /// History path of the offending node.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An information set label that was never registered.
    #[error("unregistered information set `{0}`")]
    UnknownInfoSet(String),

    /// An information set whose members disagree, or a strategy row that
    /// does not fit it.
    #[error("malformed information set `{label}`: {reason}")]
    InvalidInfoSet {
        /// Label of the information set.
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The analysis needs exactly two players.
    #[error("expected two players, found {0}")]
    PlayerCount(usize),

    /// A player id that does not occur in the game.
    #[error("unknown player `{0}`")]
    UnknownPlayer(String),

    /// Neither a readable game file nor a bundled game name.
    #[error("unknown game `{0}`")]
    UnknownGame(String),

    /// A line of a game description could not be understood.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// A saved solver state that does not fit the solver loading it.
    #[error("checkpoint does not match this solver: {0}")]
    Checkpoint(String),

    /// An argument outside the range an operation accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid solver configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Encoding or decoding JSON failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;
