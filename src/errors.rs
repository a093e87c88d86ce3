//! Typed errors for the board store, the ordering allocator and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why a fractional sort key could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SortIndexError {
    #[error("sort key {0} is not a finite number")]
    NotFinite(f64),

    #[error("left sort key {left} is not below right sort key {right}")]
    Unordered { left: f64, right: f64 },

    #[error("no room left between sort keys {left} and {right}")]
    Exhausted { left: f64, right: f64 },
}

/// Errors from board mutations and persistence.
///
/// A mutation that returns one of these has left the board untouched.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("list {0} not found")]
    ListNotFound(u32),

    #[error("card {0} not found")]
    CardNotFound(u32),

    #[error("checklist {checklist_id} not found on card {card_id}")]
    ChecklistNotFound { card_id: u32, checklist_id: u32 },

    #[error("checklist item {item_id} not found in checklist {checklist_id}")]
    ChecklistItemNotFound { checklist_id: u32, item_id: u32 },

    #[error("label {0} not found")]
    LabelNotFound(u32),

    #[error("a label named {0:?} already exists")]
    DuplicateLabel(String),

    #[error("title must not be empty")]
    EmptyTitle,

    #[error(transparent)]
    SortIndex(#[from] SortIndexError),

    #[error("failed to access board file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse board file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode board: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors from loading `cardwall.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Rejected date prompt input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateInputError {
    #[error("unrecognised date {0:?}, expected YYYY-MM-DD or YYYY-MM-DD HH:MM")]
    Unrecognised(String),

    #[error("date {0:?} does not exist in the configured timezone")]
    Nonexistent(String),
}
